//! Group search queries.

use std::fmt;
use std::str::FromStr;

use crate::error::{FilterError, Result};
use crate::parser::{self, keep_negated, ParseOptions, Vocabulary};
use crate::simple::SimpleQuery;
use crate::term::Term;

/// Group search query.
///
/// ```
/// use gerrit_filter::GroupQuery;
///
/// let query = GroupQuery::new().in_name("dev").visible_to_all(false);
/// assert_eq!(query.to_string(), "inname:\"dev\" -is:visibletoall");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupQuery {
    query: SimpleQuery,
}

fn visible_term() -> Term {
    Term::keyword("is", "visibletoall")
}

impl GroupQuery {
    pub fn new() -> Self {
        GroupQuery::default()
    }

    pub fn parse(input: &str) -> Result<Self> {
        GroupQuery::parse_with(input, &ParseOptions::default())
    }

    pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Self> {
        Ok(parser::parse_flat::<GroupQuery>(input, options)?)
    }

    pub fn add(self, term: Term) -> Self {
        GroupQuery {
            query: self.query.add(term),
        }
    }

    pub fn remove(self, term: &Term) -> Self {
        GroupQuery {
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

    /// Exact group name.
    pub fn name(self, name: &str) -> Self {
        self.add(Term::quoted("name", name))
    }

    /// Substring of the group name.
    pub fn in_name(self, part: &str) -> Self {
        self.add(Term::quoted("inname", part))
    }

    pub fn description(self, description: &str) -> Self {
        self.add(Term::quoted("description", description))
    }

    /// Groups owned by the given group.
    pub fn owner(self, owner: &str) -> Self {
        self.add(Term::quoted("owner", owner))
    }

    pub fn uuid(self, uuid: &str) -> Self {
        self.add(Term::quoted("uuid", uuid))
    }

    pub fn member(self, account: &str) -> Self {
        self.add(Term::quoted("member", account))
    }

    pub fn subgroup(self, group: &str) -> Self {
        self.add(Term::quoted("subgroup", group))
    }

    /// `is:visibletoall` or `-is:visibletoall`, replacing either one already
    /// present.
    pub fn visible_to_all(self, visible: bool) -> Self {
        let (on, off) = if visible {
            (visible_term(), visible_term().negated())
        } else {
            (visible_term().negated(), visible_term())
        };
        GroupQuery {
            query: self.query.toggle(on, &off),
        }
    }
}

impl Vocabulary for GroupQuery {
    const KIND: &'static str = "group";

    fn knows(key: &str) -> bool {
        matches!(
            key,
            "name" | "inname" | "description" | "owner" | "uuid" | "member" | "subgroup" | "is"
        )
    }

    fn apply(self, key: &str, value: &str, _quoted: bool) -> std::result::Result<Self, String> {
        Ok(match key {
            "is" if value.eq_ignore_ascii_case("visibletoall") => self.visible_to_all(true),
            "is" => return Err(format!("unknown is: value '{value}'")),
            "name" => self.name(value),
            "inname" => self.in_name(value),
            "description" => self.description(value),
            "owner" => self.owner(value),
            "uuid" => self.uuid(value),
            "member" => self.member(value),
            "subgroup" => self.subgroup(value),
            _ => return Err(format!("unknown group predicate '{key}'")),
        })
    }

    fn apply_negated(self, key: &str, value: &str, quoted: bool) -> std::result::Result<Self, String> {
        if key == "is" && value.eq_ignore_ascii_case("visibletoall") {
            return Ok(self.visible_to_all(false));
        }
        keep_negated(self, key, value, quoted)
    }

    fn push_term(self, term: Term) -> Self {
        self.add(term)
    }
}

impl fmt::Display for GroupQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query, f)
    }
}

impl FromStr for GroupQuery {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        GroupQuery::parse(s)
    }
}
