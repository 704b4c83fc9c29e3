//! Canonical boolean form of a query.
//!
//! A [`ChangeQuery`](crate::ChangeQuery) remembers how it was written (which
//! terms were juxtaposed, which were joined with an explicit `AND`). [`Expr`]
//! forgets the spelling and keeps only the meaning the server gives the
//! serialized string: `OR` binds loosest, juxtaposition and `AND` bind
//! tighter, negation binds tightest. Two queries are equivalent when their
//! normalized expressions are equal.

use std::fmt;

use serde::Serialize;

use crate::term::Term;

/// Boolean expression tree over [`Term`]s.
///
/// `And`/`Or` hold flat vectors so consumers can iterate operands without
/// rebalancing. An empty `And` matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    Term(Term),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    /// Returns `true` for the empty conjunction.
    pub fn matches_everything(&self) -> bool {
        matches!(self, Expr::And(parts) if parts.is_empty())
    }

    /// Rewrites the tree into its canonical shape:
    /// - nested `And`-in-`And` and `Or`-in-`Or` are flattened,
    /// - single-operand `And`/`Or` collapse to the operand,
    /// - double negation cancels,
    /// - a `-term` becomes `Not(term)`.
    ///
    /// Operand order is preserved.
    pub fn normalize(self) -> Expr {
        match self {
            Expr::Term(term) if term.is_negated() => {
                Expr::Not(Box::new(Expr::Term(term.positive())))
            }
            Expr::Term(_) => self,
            Expr::Not(inner) => match inner.normalize() {
                Expr::Not(positive) => *positive,
                other => Expr::Not(Box::new(other)),
            },
            Expr::And(parts) => normalize_chain(parts, true),
            Expr::Or(parts) => normalize_chain(parts, false),
        }
    }
}

fn normalize_chain(parts: Vec<Expr>, conjunction: bool) -> Expr {
    let mut flattened = Vec::with_capacity(parts.len());
    for expr in parts.into_iter().map(Expr::normalize) {
        match expr {
            Expr::And(nested) if conjunction => flattened.extend(nested),
            Expr::Or(nested) if !conjunction => flattened.extend(nested),
            other => flattened.push(other),
        }
    }

    if flattened.len() == 1 {
        return flattened.remove(0);
    }
    if conjunction {
        Expr::And(flattened)
    } else {
        Expr::Or(flattened)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term(term) => write!(f, "{term}"),
            Expr::Not(inner) => write!(f, "(not {inner})"),
            Expr::And(parts) => write_list(f, "and", parts),
            Expr::Or(parts) => write_list(f, "or", parts),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, parts: &[Expr]) -> fmt::Result {
    write!(f, "({name}")?;
    for part in parts {
        write!(f, " {part}")?;
    }
    f.write_str(")")
}
