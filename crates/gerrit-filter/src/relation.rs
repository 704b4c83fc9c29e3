//! Comparison operators for relational predicates.
//!
//! The [`Relation`] enum prefixes the count of `added:`, `deleted:`, `delta:`
//! and `size:` predicates and the score of `label:` predicates.

use std::fmt;
use std::str::FromStr;

/// Comparison operator of a relational predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Equal (`=`).
    Eq,
    /// Greater than or equal (`>=`).
    Gte,
    /// Greater than (`>`).
    Gt,
    /// Less than or equal (`<=`).
    Lte,
    /// Less than (`<`).
    Lt,
}

impl Relation {
    /// Returns the symbol written in front of the compared value.
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Eq => "=",
            Relation::Gte => ">=",
            Relation::Gt => ">",
            Relation::Lte => "<=",
            Relation::Lt => "<",
        }
    }

    /// Splits a leading relation symbol off `value`.
    ///
    /// Two-character symbols win over their one-character prefixes. Returns
    /// `None` when `value` does not start with a symbol.
    pub fn split_prefix(value: &str) -> Option<(Relation, &str)> {
        LONGEST_FIRST.into_iter().find_map(|relation| {
            value
                .strip_prefix(relation.symbol())
                .map(|rest| (relation, rest))
        })
    }

    /// Splits a trailing relation symbol off `value`, longest symbol first.
    pub fn split_suffix(value: &str) -> Option<(&str, Relation)> {
        LONGEST_FIRST.into_iter().find_map(|relation| {
            value
                .strip_suffix(relation.symbol())
                .map(|rest| (rest, relation))
        })
    }
}

const LONGEST_FIRST: [Relation; 5] = [
    Relation::Gte,
    Relation::Lte,
    Relation::Eq,
    Relation::Gt,
    Relation::Lt,
];

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Relation::split_prefix(s) {
            Some((relation, "")) => Ok(relation),
            _ => Err(format!("unknown relation '{s}'")),
        }
    }
}
