//! Term model and literal sanitization.
//!
//! A [`Term`] is one atomic predicate of a serialized query: free text such
//! as `aaa`, or a `key:value` pair whose value is either a quoted literal or a
//! bare keyword.

use std::fmt;

use serde::{Serialize, Serializer};

/// Quotes a raw literal for inclusion in a query string.
///
/// Surrounding whitespace is trimmed, every embedded `"` is doubled and the
/// result is wrapped in a single pair of quotes.
///
/// ```
/// use gerrit_filter::sanitize_value;
///
/// assert_eq!(sanitize_value(" my \"topic\" "), "\"my \"\"topic\"\"\"");
/// ```
pub fn sanitize_value(value: &str) -> String {
    let trimmed = value.trim();
    let mut out = String::with_capacity(trimmed.len() + 2);
    out.push('"');
    for ch in trimmed.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Returns `true` when `text` can be written without quotes and read back as
/// the same free-text term.
pub(crate) fn is_bare_word(text: &str) -> bool {
    if text.is_empty() || text.starts_with('-') {
        return false;
    }
    if matches!(text, "AND" | "OR" | "NOT") {
        return false;
    }
    !text
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '(' | ')' | ':'))
}

/// Returns `true` when `value` reads back whole after `key:`.
fn is_bare_value(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '(' | ')'))
}

/// How the value of a `key:value` term is written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermValue {
    /// User-supplied literal, written through [`sanitize_value`].
    Quoted(String),
    /// Grammar keyword written verbatim (`self`, `open`, `1d`, `25`).
    Keyword(String),
}

impl TermValue {
    pub fn as_str(&self) -> &str {
        match self {
            TermValue::Quoted(value) | TermValue::Keyword(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// Free text matched by the server's default field.
    Text(String),
    /// `key:value` predicate.
    Field { key: String, value: TermValue },
}

/// One atomic predicate of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    negated: bool,
    kind: TermKind,
}

impl Term {
    /// Free-text term. Whitespace around `text` is dropped.
    pub fn text(text: &str) -> Self {
        Term {
            negated: false,
            kind: TermKind::Text(text.trim().to_string()),
        }
    }

    /// `key:"value"` term with a sanitized literal.
    pub fn quoted(key: &str, value: &str) -> Self {
        Term {
            negated: false,
            kind: TermKind::Field {
                key: key.to_string(),
                value: TermValue::Quoted(value.trim().to_string()),
            },
        }
    }

    /// `key:value` term whose value is a grammar keyword.
    ///
    /// A value that cannot be written bare (empty, or containing whitespace,
    /// quotes or parentheses) is quoted instead.
    pub fn keyword(key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !is_bare_value(&value) {
            return Term::quoted(key, &value);
        }
        Term {
            negated: false,
            kind: TermKind::Field {
                key: key.to_string(),
                value: TermValue::Keyword(value),
            },
        }
    }

    /// Returns this term with a leading `-`.
    pub fn negated(mut self) -> Self {
        self.negated = true;
        self
    }

    /// Returns this term without its leading `-`, if any.
    pub fn positive(&self) -> Self {
        Term {
            negated: false,
            kind: self.kind.clone(),
        }
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn kind(&self) -> &TermKind {
        &self.kind
    }

    /// The predicate key, or `None` for free text.
    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            TermKind::Text(_) => None,
            TermKind::Field { key, .. } => Some(key),
        }
    }

    /// The unescaped value (or text) of this term.
    pub fn value(&self) -> &str {
        match &self.kind {
            TermKind::Text(text) => text,
            TermKind::Field { value, .. } => value.as_str(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("-")?;
        }
        match &self.kind {
            TermKind::Text(text) if is_bare_word(text) => f.write_str(text),
            TermKind::Text(text) => f.write_str(&sanitize_value(text)),
            TermKind::Field {
                key,
                value: TermValue::Quoted(value),
            } => write!(f, "{}:{}", key, sanitize_value(value)),
            TermKind::Field {
                key,
                value: TermValue::Keyword(value),
            } => write!(f, "{}:{}", key, value),
        }
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_wraps_and_trims() {
        assert_eq!(sanitize_value("  john  "), "\"john\"");
        assert_eq!(sanitize_value(""), "\"\"");
    }

    #[test]
    fn sanitize_doubles_quotes() {
        assert_eq!(sanitize_value("a\"b"), "\"a\"\"b\"");
        assert_eq!(sanitize_value("\""), "\"\"\"\"");
    }

    #[test]
    fn bare_word_rules() {
        assert!(is_bare_word("aaa"));
        assert!(is_bare_word("I1234abcd"));
        assert!(!is_bare_word(""));
        assert!(!is_bare_word("two words"));
        assert!(!is_bare_word("-leading"));
        assert!(!is_bare_word("key:value"));
        assert!(!is_bare_word("AND"));
        assert!(is_bare_word("and"));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Term::text("aaa").to_string(), "aaa");
        assert_eq!(Term::text("two words").to_string(), "\"two words\"");
        assert_eq!(Term::quoted("owner", "john").to_string(), "owner:\"john\"");
        assert_eq!(Term::keyword("owner", "self").to_string(), "owner:self");
        assert_eq!(
            Term::keyword("is", "visibletoall").negated().to_string(),
            "-is:visibletoall"
        );
    }

    #[test]
    fn keyword_values_that_break_apart_are_quoted() {
        assert_eq!(Term::keyword("owner", "a b").to_string(), "owner:\"a b\"");
        assert_eq!(Term::keyword("owner", "a b"), Term::quoted("owner", "a b"));
        assert_eq!(Term::keyword("topic", "x)").to_string(), "topic:\"x)\"");
        assert_eq!(Term::keyword("topic", "say\"hi").to_string(), "topic:\"say\"\"hi\"");
        assert_eq!(Term::keyword("hashtag", "").to_string(), "hashtag:\"\"");
        assert_eq!(Term::keyword("age", "3d").to_string(), "age:3d");
        assert_eq!(Term::keyword("state", "read-only").to_string(), "state:read-only");
    }

    #[test]
    fn accessors() {
        let term = Term::quoted("topic", " release ");
        assert_eq!(term.key(), Some("topic"));
        assert_eq!(term.value(), "release");
        assert!(!term.is_negated());
        assert_eq!(Term::text("x").key(), None);

        let negated = term.clone().negated();
        assert!(negated.is_negated());
        assert_eq!(negated.positive(), term);
    }
}
