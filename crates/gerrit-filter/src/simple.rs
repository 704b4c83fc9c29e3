//! Flat term list shared by account, group and project queries.
//!
//! Those search grammars have no boolean composition, so a [`SimpleQuery`] is
//! just an ordered list of [`Term`]s joined by single spaces.

use std::fmt;

use crate::term::Term;

/// Ordered list of terms, implicitly ANDed by the server.
///
/// # Example
///
/// ```
/// use gerrit_filter::{SimpleQuery, Term};
///
/// let query = SimpleQuery::new()
///     .add(Term::quoted("name", "john"))
///     .add(Term::keyword("is", "active"));
/// assert_eq!(query.to_string(), "name:\"john\" is:active");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SimpleQuery {
    terms: Vec<Term>,
}

impl SimpleQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        SimpleQuery::default()
    }

    /// Appends a term.
    pub fn add(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    /// Removes every occurrence of `term`. Absent terms are ignored.
    pub fn remove(mut self, term: &Term) -> Self {
        self.terms.retain(|t| t != term);
        self
    }

    /// Removes every term with the given key.
    pub fn remove_key(mut self, key: &str) -> Self {
        self.terms.retain(|t| t.key() != Some(key));
        self
    }

    /// Adds `on` after removing both `on` and `off`.
    ///
    /// Used for predicates with two polarities (`is:active` / `is:inactive`)
    /// so that only one of them, once, is ever present.
    pub fn toggle(self, on: Term, off: &Term) -> Self {
        self.remove(off).remove(&on).add(on)
    }

    pub fn contains(&self, term: &Term) -> bool {
        self.terms.contains(term)
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl<'a> IntoIterator for &'a SimpleQuery {
    type Item = &'a Term;
    type IntoIter = std::slice::Iter<'a, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

impl fmt::Display for SimpleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> Term {
        Term::keyword("is", "active")
    }

    fn inactive() -> Term {
        Term::keyword("is", "inactive")
    }

    #[test]
    fn empty_query_serializes_to_empty_string() {
        assert_eq!(SimpleQuery::new().to_string(), "");
        assert!(SimpleQuery::new().is_empty());
    }

    #[test]
    fn terms_are_space_joined_in_order() {
        let query = SimpleQuery::new()
            .add(Term::text("aaa"))
            .add(Term::quoted("email", "a@b.c"));
        assert_eq!(query.to_string(), "aaa email:\"a@b.c\"");
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn remove_absent_term_is_noop() {
        let query = SimpleQuery::new().add(active());
        let same = query.clone().remove(&inactive());
        assert_eq!(query, same);
    }

    #[test]
    fn remove_key_drops_all_matching() {
        let query = SimpleQuery::new()
            .add(Term::keyword("state", "active"))
            .add(Term::text("x"))
            .add(Term::keyword("state", "hidden"))
            .remove_key("state");
        assert_eq!(query.to_string(), "x");
    }

    #[test]
    fn toggle_keeps_single_polarity() {
        let query = SimpleQuery::new()
            .toggle(inactive(), &active())
            .toggle(active(), &inactive())
            .toggle(active(), &inactive());
        assert_eq!(query.terms(), &[active()]);
    }

    #[test]
    fn iterates_in_order() {
        let query = SimpleQuery::new().add(Term::text("a")).add(Term::text("b"));
        let values: Vec<&str> = (&query).into_iter().map(Term::value).collect();
        assert_eq!(values, ["a", "b"]);
    }
}
