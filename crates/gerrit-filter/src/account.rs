//! Account search queries.

use std::fmt;
use std::str::FromStr;

use crate::error::{FilterError, Result};
use crate::parser::{self, keep_negated, ParseOptions, Vocabulary};
use crate::simple::SimpleQuery;
use crate::term::Term;

/// Account search query.
///
/// ```
/// use gerrit_filter::AccountQuery;
///
/// let query = AccountQuery::new().email("jdoe@example.com").active(true);
/// assert_eq!(query.to_string(), "email:\"jdoe@example.com\" is:active");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AccountQuery {
    query: SimpleQuery,
}

fn active_term() -> Term {
    Term::keyword("is", "active")
}

fn inactive_term() -> Term {
    Term::keyword("is", "inactive")
}

impl AccountQuery {
    pub fn new() -> Self {
        AccountQuery::default()
    }

    pub fn parse(input: &str) -> Result<Self> {
        AccountQuery::parse_with(input, &ParseOptions::default())
    }

    pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Self> {
        Ok(parser::parse_flat::<AccountQuery>(input, options)?)
    }

    pub fn add(self, term: Term) -> Self {
        AccountQuery {
            query: self.query.add(term),
        }
    }

    pub fn remove(self, term: &Term) -> Self {
        AccountQuery {
            query: self.query.remove(term),
        }
    }

    pub fn as_simple(&self) -> &SimpleQuery {
        &self.query
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn simple(self, text: &str) -> Self {
        self.add(Term::text(text))
    }

    /// Full name, matched by prefix on the server.
    pub fn name(self, name: &str) -> Self {
        self.add(Term::quoted("name", name))
    }

    pub fn email(self, email: &str) -> Self {
        self.add(Term::quoted("email", email))
    }

    pub fn username(self, username: &str) -> Self {
        self.add(Term::quoted("username", username))
    }

    /// Accounts that can see the given change.
    pub fn can_see(self, change: &str) -> Self {
        self.add(Term::quoted("cansee", change))
    }

    /// `is:active` or `is:inactive`, replacing either one already present.
    pub fn active(self, active: bool) -> Self {
        let (on, off) = if active {
            (active_term(), inactive_term())
        } else {
            (inactive_term(), active_term())
        };
        AccountQuery {
            query: self.query.toggle(on, &off),
        }
    }
}

impl Vocabulary for AccountQuery {
    const KIND: &'static str = "account";

    fn knows(key: &str) -> bool {
        matches!(key, "name" | "email" | "username" | "cansee" | "is")
    }

    fn apply(self, key: &str, value: &str, _quoted: bool) -> std::result::Result<Self, String> {
        match (key, value.to_ascii_lowercase().as_str()) {
            ("is", "active") => Ok(self.active(true)),
            ("is", "inactive") => Ok(self.active(false)),
            ("is", _) => Err(format!("unknown is: value '{value}'")),
            ("name", _) => Ok(self.name(value)),
            ("email", _) => Ok(self.email(value)),
            ("username", _) => Ok(self.username(value)),
            ("cansee", _) => Ok(self.can_see(value)),
            _ => Err(format!("unknown account predicate '{key}'")),
        }
    }

    fn apply_negated(self, key: &str, value: &str, quoted: bool) -> std::result::Result<Self, String> {
        match (key, value.to_ascii_lowercase().as_str()) {
            ("is", "active") => Ok(self.active(false)),
            ("is", "inactive") => Ok(self.active(true)),
            _ => keep_negated(self, key, value, quoted),
        }
    }

    fn push_term(self, term: Term) -> Self {
        self.add(term)
    }
}

impl fmt::Display for AccountQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query, f)
    }
}

impl FromStr for AccountQuery {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        AccountQuery::parse(s)
    }
}
