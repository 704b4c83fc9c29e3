//! Gerrit filter - typed builder, serializer and parser for Gerrit search queries.
//!
//! Gerrit searches changes, accounts, groups and projects with a small boolean
//! query language. This crate builds those query strings from typed method
//! calls and parses them back:
//!
//! - Change queries with `AND`, `OR`, negation and nested groups
//! - Flat account, group and project queries
//! - Literal quoting, timestamps, relational counts and label votes
//! - A canonical boolean form for comparing queries by meaning
//!
//! # Quick Start
//!
//! ```rust
//! use gerrit_filter::{ChangeQuery, Relation, StatusType, TimeUnit};
//!
//! let query = ChangeQuery::new()
//!     .status(StatusType::Open)
//!     .project("platform/build")
//!     .label("Code-Review", 2)
//!     .and(
//!         ChangeQuery::new()
//!             .owner_self()
//!             .or(ChangeQuery::new().reviewer_self())
//!             .unwrap(),
//!     )
//!     .unwrap()
//!     .negate(ChangeQuery::new().age(TimeUnit::Weeks, 4))
//!     .unwrap()
//!     .added(Relation::Lt, 100);
//!
//! assert_eq!(
//!     query.to_string(),
//!     "is:open project:\"platform/build\" label:\"Code-Review=+2\" \
//!      AND (owner:self OR (reviewer:self)) -(age:4w) added:\"<100\""
//! );
//!
//! // Parsing is the inverse of serialization.
//! let parsed = ChangeQuery::parse(&query.to_string()).unwrap();
//! assert_eq!(parsed.to_string(), query.to_string());
//! ```
//!
//! # Query Semantics
//!
//! Each `and`/`or`/`negate` call appends one parenthesized group after the
//! terms already present. The server reads the result with its own
//! precedence:
//!
//! ```text
//! OR  <  AND, juxtaposition  <  NOT, -
//! ```
//!
//! so `a OR (b) c` means `a OR (b AND c)`. [`ChangeQuery::to_expr`] returns
//! that reading as an [`Expr`]; two queries with equal expressions are
//! [equivalent](ChangeQuery::is_equivalent) however they were spelled.
//!
//! # Literals
//!
//! | Predicate | Written as |
//! |-----------|------------|
//! | Categorical (`owner`, `project`, ...) | `owner:"value"` with `"` doubled |
//! | `*_self` shorthands | `owner:self` |
//! | `is`, `has`, `status` | `is:open` |
//! | `added`, `deleted`, `delta`, `size` | `added:">=10"` |
//! | `before`, `after`, `until`, `since` | `after:"2017-01-01 00:00:00.000"` (UTC) |
//! | `age` | `age:3d` |
//! | `label` | `label:"Code-Review=+1"`, `label:"Verified"`, `label:"Foo-1=ANY"` |

mod account;
mod change;
mod complex;
mod error;
mod expr;
mod group;
mod parser;
mod project;
mod relation;
mod simple;
mod term;
mod timestamp;

// Re-export public API
pub use account::AccountQuery;
pub use change::{ChangeQuery, HasType, IsType, StatusType};
pub use complex::{ComplexQuery, Node};
pub use error::{FilterError, Operator, ParseError, Result};
pub use expr::Expr;
pub use group::GroupQuery;
pub use parser::{ParseOptions, DEFAULT_MAX_DEPTH};
pub use project::{ProjectQuery, ProjectState};
pub use relation::Relation;
pub use simple::SimpleQuery;
pub use term::{sanitize_value, Term, TermKind, TermValue};
pub use timestamp::{format_timestamp, parse_timestamp, TimeUnit};
