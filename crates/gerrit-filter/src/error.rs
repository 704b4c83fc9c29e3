//! Error types for the filter crate.

use std::fmt;

use thiserror::Error;

/// Boolean operator used when composing two queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Negate,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Negate => "NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query string that could not be turned into a query.
///
/// The whole input is kept so callers can point at the offending byte.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at byte {position} of {input:?})")]
pub struct ParseError {
    pub message: String,
    pub input: String,
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, input: &str, position: usize) -> Self {
        ParseError {
            message: message.into(),
            input: input.to_string(),
            position,
        }
    }
}

/// Errors that can occur when building or parsing queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A boolean composition was attempted with an empty receiver or operand.
    #[error("{operator} requires two non-empty operands")]
    EmptyOperand { operator: Operator },

    /// The query string is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_carries_input() {
        let err = ParseError::new("unexpected ')'", "a )", 2);
        assert_eq!(err.to_string(), "unexpected ')' (at byte 2 of \"a )\")");
    }

    #[test]
    fn empty_operand_display() {
        let err = FilterError::EmptyOperand {
            operator: Operator::Or,
        };
        assert_eq!(err.to_string(), "OR requires two non-empty operands");
    }

    #[test]
    fn operators_display_as_query_keywords() {
        assert_eq!(Operator::And.to_string(), "AND");
        assert_eq!(Operator::Or.to_string(), "OR");
        assert_eq!(
            FilterError::EmptyOperand {
                operator: Operator::Negate
            }
            .to_string(),
            "NOT requires two non-empty operands"
        );
    }
}
