//! Project search queries.

use std::fmt;
use std::str::FromStr;

use crate::error::{FilterError, Result};
use crate::parser::{self, ParseOptions, Vocabulary};
use crate::simple::SimpleQuery;
use crate::term::Term;

/// Project state, the argument of `state:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectState {
    Active,
    ReadOnly,
    Hidden,
}

impl ProjectState {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectState::Active => "active",
            ProjectState::ReadOnly => "read-only",
            ProjectState::Hidden => "hidden",
        }
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(ProjectState::Active),
            "read-only" | "read_only" => Ok(ProjectState::ReadOnly),
            "hidden" => Ok(ProjectState::Hidden),
            _ => Err(format!("unknown project state '{s}'")),
        }
    }
}

/// Project search query.
///
/// ```
/// use gerrit_filter::{ProjectQuery, ProjectState};
///
/// let query = ProjectQuery::new()
///     .prefix("platform/")
///     .state(ProjectState::Hidden)
///     .state(ProjectState::Active);
/// assert_eq!(query.to_string(), "prefix:\"platform/\" state:active");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProjectQuery {
    query: SimpleQuery,
}

impl ProjectQuery {
    pub fn new() -> Self {
        ProjectQuery::default()
    }

    pub fn parse(input: &str) -> Result<Self> {
        ProjectQuery::parse_with(input, &ParseOptions::default())
    }

    pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Self> {
        Ok(parser::parse_flat::<ProjectQuery>(input, options)?)
    }

    pub fn add(self, term: Term) -> Self {
        ProjectQuery {
            query: self.query.add(term),
        }
    }

    pub fn remove(self, term: &Term) -> Self {
        ProjectQuery {
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

    pub fn name(self, name: &str) -> Self {
        self.add(Term::quoted("name", name))
    }

    pub fn in_name(self, part: &str) -> Self {
        self.add(Term::quoted("inname", part))
    }

    pub fn prefix(self, prefix: &str) -> Self {
        self.add(Term::quoted("prefix", prefix))
    }

    pub fn parent(self, parent: &str) -> Self {
        self.add(Term::quoted("parent", parent))
    }

    pub fn description(self, description: &str) -> Self {
        self.add(Term::quoted("description", description))
    }

    /// Sets `state:`, replacing any state already present.
    pub fn state(self, state: ProjectState) -> Self {
        ProjectQuery {
            query: self
                .query
                .remove_key("state")
                .add(Term::keyword("state", state.as_str())),
        }
    }
}

impl Vocabulary for ProjectQuery {
    const KIND: &'static str = "project";

    fn knows(key: &str) -> bool {
        matches!(
            key,
            "name" | "inname" | "prefix" | "parent" | "description" | "state"
        )
    }

    fn apply(self, key: &str, value: &str, _quoted: bool) -> std::result::Result<Self, String> {
        Ok(match key {
            "state" => self.state(value.parse()?),
            "name" => self.name(value),
            "inname" => self.in_name(value),
            "prefix" => self.prefix(value),
            "parent" => self.parent(value),
            "description" => self.description(value),
            _ => return Err(format!("unknown project predicate '{key}'")),
        })
    }

    fn push_term(self, term: Term) -> Self {
        self.add(term)
    }
}

impl fmt::Display for ProjectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query, f)
    }
}

impl FromStr for ProjectQuery {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        ProjectQuery::parse(s)
    }
}
