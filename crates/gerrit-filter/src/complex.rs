//! Recursive query with boolean composition.
//!
//! A [`ComplexQuery`] is an ordered sequence of [`Node`]s. Plain terms are
//! juxtaposed (implicit AND); `and`, `or` and `negate` each append one node
//! holding a whole sub-query, written in parentheses after its operator.

use std::fmt;

use tracing::trace;

use crate::error::{FilterError, Operator, Result};
use crate::expr::Expr;
use crate::term::Term;

/// One element of a [`ComplexQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Atomic predicate, juxtaposed with its neighbours.
    Term(Term),
    /// `AND (<query>)`
    And(ComplexQuery),
    /// `OR (<query>)`
    Or(ComplexQuery),
    /// `-(<query>)`
    Not(ComplexQuery),
    /// `(<query>)` juxtaposed with its neighbours. Only produced by parsing.
    Group(ComplexQuery),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Term(term) => write!(f, "{term}"),
            Node::And(query) => write!(f, "AND ({query})"),
            Node::Or(query) => write!(f, "OR ({query})"),
            Node::Not(query) => write!(f, "-({query})"),
            Node::Group(query) => write!(f, "({query})"),
        }
    }
}

/// Query tree supporting `AND`, `OR` and negation over nested sub-queries.
///
/// Composition requires two non-empty operands:
///
/// ```
/// use gerrit_filter::{ComplexQuery, FilterError, Term};
///
/// let open = ComplexQuery::new().add(Term::keyword("is", "open"));
/// let mine = ComplexQuery::new().add(Term::keyword("owner", "self"));
///
/// let query = open.clone().and(mine).unwrap();
/// assert_eq!(query.to_string(), "is:open AND (owner:self)");
///
/// let err = open.or(ComplexQuery::new()).unwrap_err();
/// assert!(matches!(err, FilterError::EmptyOperand { .. }));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ComplexQuery {
    nodes: Vec<Node>,
}

impl ComplexQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        ComplexQuery::default()
    }

    /// Appends a juxtaposed term. A negated term is stored as `-(term)`, the
    /// same node the parser builds for `-term`.
    pub fn add(self, term: Term) -> Self {
        self.push(term_node(term))
    }

    /// Removes every top-level occurrence of `term`. Absent terms are ignored.
    pub fn remove(mut self, term: &Term) -> Self {
        let target = term_node(term.clone());
        self.nodes.retain(|node| *node != target);
        self
    }

    /// Returns `true` if `term` appears at the top level.
    pub fn contains(&self, term: &Term) -> bool {
        let target = term_node(term.clone());
        self.nodes.iter().any(|node| *node == target)
    }

    /// Appends `AND (<other>)`.
    pub fn and(self, other: ComplexQuery) -> Result<Self> {
        self.compose(Operator::And, other)
    }

    /// Appends `OR (<other>)`.
    pub fn or(self, other: ComplexQuery) -> Result<Self> {
        self.compose(Operator::Or, other)
    }

    /// Appends `-(<other>)`.
    pub fn negate(self, other: ComplexQuery) -> Result<Self> {
        self.compose(Operator::Negate, other)
    }

    /// Builds a query consisting only of `-(<other>)`.
    pub fn negation(other: ComplexQuery) -> Result<Self> {
        if other.is_empty() {
            return Err(FilterError::EmptyOperand {
                operator: Operator::Negate,
            });
        }
        Ok(ComplexQuery::new().push(Node::Not(other)))
    }

    fn compose(self, operator: Operator, other: ComplexQuery) -> Result<Self> {
        if self.is_empty() || other.is_empty() {
            return Err(FilterError::EmptyOperand { operator });
        }
        trace!(%operator, left = %self, right = %other, "composing queries");
        let node = match operator {
            Operator::And => Node::And(other),
            Operator::Or => Node::Or(other),
            Operator::Negate => Node::Not(other),
        };
        Ok(self.push(node))
    }

    pub(crate) fn push(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the normalized boolean meaning of this query.
    ///
    /// Juxtaposed nodes and `AND` groups form conjunctions; every `OR` group
    /// starts a new disjunct, so `a OR (b) c` means `a OR (b AND c)`.
    pub fn to_expr(&self) -> Expr {
        let mut disjuncts: Vec<Vec<Expr>> = vec![Vec::new()];
        for node in &self.nodes {
            let expr = match node {
                Node::Term(term) => Expr::Term(term.clone()),
                Node::And(query) | Node::Group(query) => query.to_expr(),
                Node::Not(query) => Expr::Not(Box::new(query.to_expr())),
                Node::Or(query) => {
                    disjuncts.push(vec![query.to_expr()]);
                    continue;
                }
            };
            if let Some(current) = disjuncts.last_mut() {
                current.push(expr);
            }
        }

        let mut parts: Vec<Expr> = disjuncts.into_iter().map(Expr::And).collect();
        let expr = if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::Or(parts)
        };
        expr.normalize()
    }

    /// Returns `true` when both queries mean the same thing to the server,
    /// however they were spelled.
    pub fn is_equivalent(&self, other: &ComplexQuery) -> bool {
        self.to_expr() == other.to_expr()
    }
}

fn term_node(term: Term) -> Node {
    if term.is_negated() {
        Node::Not(ComplexQuery::new().push(Node::Term(term.positive())))
    } else {
        Node::Term(term)
    }
}

impl fmt::Display for ComplexQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str) -> ComplexQuery {
        ComplexQuery::new().add(Term::text(text))
    }

    fn t(text: &str) -> Expr {
        Expr::Term(Term::text(text))
    }

    #[test]
    fn composition_appends_in_call_order() {
        let query = q("a")
            .and(q("b"))
            .unwrap()
            .or(q("c"))
            .unwrap()
            .negate(q("d"))
            .unwrap();
        assert_eq!(query.to_string(), "a AND (b) OR (c) -(d)");
    }

    #[test]
    fn nested_operand_is_parenthesized_recursively() {
        let inner = q("b").or(q("c")).unwrap();
        let query = q("a").and(inner).unwrap();
        assert_eq!(query.to_string(), "a AND (b OR (c))");
    }

    #[test]
    fn every_empty_combination_fails() {
        let full = q("a");
        let empty = ComplexQuery::new();
        type Compose = fn(ComplexQuery, ComplexQuery) -> Result<ComplexQuery>;
        let ops: [(Operator, Compose); 3] = [
            (Operator::And, ComplexQuery::and),
            (Operator::Or, ComplexQuery::or),
            (Operator::Negate, ComplexQuery::negate),
        ];
        for (operator, op) in ops {
            for (left, right) in [
                (empty.clone(), full.clone()),
                (full.clone(), empty.clone()),
                (empty.clone(), empty.clone()),
            ] {
                assert_eq!(
                    op(left, right).unwrap_err(),
                    FilterError::EmptyOperand { operator }
                );
            }
        }
    }

    #[test]
    fn negation_constructor() {
        assert_eq!(ComplexQuery::negation(q("a")).unwrap().to_string(), "-(a)");
        assert!(ComplexQuery::negation(ComplexQuery::new()).is_err());
    }

    #[test]
    fn remove_only_touches_top_level_terms() {
        let query = q("a").and(q("a")).unwrap().remove(&Term::text("a"));
        assert_eq!(query.to_string(), "AND (a)");
        assert!(!query.contains(&Term::text("a")));
    }

    #[test]
    fn negated_terms_become_negation_nodes() {
        let term = Term::keyword("is", "open").negated();
        let query = ComplexQuery::new().add(term.clone()).add(Term::text("b"));
        assert_eq!(query.to_string(), "-(is:open) b");
        assert!(query.contains(&term));
        assert!(!query.contains(&term.positive()));

        let query = query.remove(&term);
        assert_eq!(query.to_string(), "b");
    }

    #[test]
    fn juxtaposition_equals_explicit_and() {
        let implicit = q("a").add(Term::text("b"));
        let explicit = q("a").and(q("b")).unwrap();
        assert!(implicit.is_equivalent(&explicit));
        assert_eq!(implicit.to_expr(), Expr::And(vec![t("a"), t("b")]));
    }

    #[test]
    fn or_binds_loosest() {
        let query = q("a").or(q("b")).unwrap().add(Term::text("c"));
        assert_eq!(
            query.to_expr(),
            Expr::Or(vec![t("a"), Expr::And(vec![t("b"), t("c")])])
        );
    }

    #[test]
    fn negation_expr() {
        let query = q("a").negate(q("b").add(Term::text("c"))).unwrap();
        assert_eq!(
            query.to_expr(),
            Expr::And(vec![t("a"), Expr::Not(Box::new(Expr::And(vec![t("b"), t("c")])))])
        );
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(ComplexQuery::new().to_expr().matches_everything());
        assert_eq!(ComplexQuery::new().to_string(), "");
    }
}
