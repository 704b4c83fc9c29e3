//! Change search queries.
//!
//! [`ChangeQuery`] wraps a [`ComplexQuery`] and adds one method per change
//! search predicate. Every method appends exactly one term; boolean
//! composition goes through [`ChangeQuery::and`], [`ChangeQuery::or`] and
//! [`ChangeQuery::negate`].

use std::fmt;
use std::str::FromStr;

use time::OffsetDateTime;

use crate::complex::{ComplexQuery, Node};
use crate::error::{FilterError, Result};
use crate::expr::Expr;
use crate::parser::{self, ComplexVocabulary, ParseOptions, Vocabulary};
use crate::relation::Relation;
use crate::term::Term;
use crate::timestamp::{format_timestamp, parse_timestamp, TimeUnit};

macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $noun:literal {
            $($variant:ident => $text:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let lower = s.to_ascii_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|value| value.as_str() == lower)
                    .ok_or_else(|| format!("unknown {} '{}'", $noun, s))
            }
        }
    };
}

keyword_enum! {
    /// Argument of `is:`.
    IsType, "is: value" {
        Assigned => "assigned",
        Starred => "starred",
        Watched => "watched",
        Reviewed => "reviewed",
        Owner => "owner",
        Reviewer => "reviewer",
        Cc => "cc",
        Ignored => "ignored",
        Open => "open",
        Pending => "pending",
        Draft => "draft",
        Closed => "closed",
        Merged => "merged",
        Abandoned => "abandoned",
        Submittable => "submittable",
        Mergeable => "mergeable",
        Private => "private",
        Wip => "wip",
    }
}

keyword_enum! {
    /// Argument of `has:`.
    HasType, "has: value" {
        Draft => "draft",
        Star => "star",
        Edit => "edit",
        Unresolved => "unresolved",
    }
}

keyword_enum! {
    /// Change status, written as an `is:` predicate.
    StatusType, "status" {
        Open => "open",
        Pending => "pending",
        Reviewed => "reviewed",
        Closed => "closed",
        Merged => "merged",
        Abandoned => "abandoned",
        Draft => "draft",
    }
}

/// Generates `key:"value"` methods and the list of their keys.
macro_rules! categorical {
    ($($(#[$meta:meta])* $method:ident => $key:literal,)*) => {
        $(
            $(#[$meta])*
            pub fn $method(self, value: &str) -> Self {
                self.add(Term::quoted($key, value))
            }
        )*

        const CATEGORICAL: &'static [&'static str] = &[$($key,)*];
    };
}

/// Generates `key:self` methods and the list of their keys.
macro_rules! self_shorthand {
    ($($method:ident => $key:literal,)*) => {
        $(
            #[doc = concat!("Appends `", $key, ":self`.")]
            pub fn $method(self) -> Self {
                self.add(Term::keyword($key, "self"))
            }
        )*

        const SELF_KEYS: &'static [&'static str] = &[$($key,)*];
    };
}

const RELATIONAL: [&str; 4] = ["added", "deleted", "delta", "size"];
const DATES: [&str; 4] = ["before", "after", "until", "since"];

/// Change search query.
///
/// ```
/// use gerrit_filter::{ChangeQuery, StatusType};
///
/// let query = ChangeQuery::new()
///     .status(StatusType::Open)
///     .and(ChangeQuery::new().owner("username"))
///     .unwrap();
/// assert_eq!(query.to_string(), "is:open AND (owner:\"username\")");
///
/// let parsed: ChangeQuery = query.to_string().parse().unwrap();
/// assert_eq!(parsed, query);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChangeQuery {
    query: ComplexQuery,
}

impl ChangeQuery {
    pub fn new() -> Self {
        ChangeQuery::default()
    }

    /// Parses a change query with the default options.
    pub fn parse(input: &str) -> Result<Self> {
        ChangeQuery::parse_with(input, &ParseOptions::default())
    }

    pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Self> {
        Ok(parser::parse_complex::<ChangeQuery>(input, options)?)
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Appends a raw term.
    pub fn add(self, term: Term) -> Self {
        ChangeQuery {
            query: self.query.add(term),
        }
    }

    /// Removes every top-level occurrence of `term`.
    pub fn remove(self, term: &Term) -> Self {
        ChangeQuery {
            query: self.query.remove(term),
        }
    }

    /// Appends `AND (<other>)`. Fails if either query is empty.
    pub fn and(self, other: ChangeQuery) -> Result<Self> {
        Ok(ChangeQuery {
            query: self.query.and(other.query)?,
        })
    }

    /// Appends `OR (<other>)`. Fails if either query is empty.
    pub fn or(self, other: ChangeQuery) -> Result<Self> {
        Ok(ChangeQuery {
            query: self.query.or(other.query)?,
        })
    }

    /// Appends `-(<other>)`. Fails if either query is empty.
    pub fn negate(self, other: ChangeQuery) -> Result<Self> {
        Ok(ChangeQuery {
            query: self.query.negate(other.query)?,
        })
    }

    /// Builds `-(<other>)` on its own. Fails if `other` is empty.
    pub fn negation(other: ChangeQuery) -> Result<Self> {
        Ok(ChangeQuery {
            query: ComplexQuery::negation(other.query)?,
        })
    }

    pub fn as_complex(&self) -> &ComplexQuery {
        &self.query
    }

    pub fn into_complex(self) -> ComplexQuery {
        self.query
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// See [`ComplexQuery::to_expr`].
    pub fn to_expr(&self) -> Expr {
        self.query.to_expr()
    }

    /// See [`ComplexQuery::is_equivalent`].
    pub fn is_equivalent(&self, other: &ChangeQuery) -> bool {
        self.query.is_equivalent(&other.query)
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Free text, matched against the server's default fields.
    pub fn simple(self, text: &str) -> Self {
        self.add(Term::text(text))
    }

    categorical! {
        owner => "owner",
        reviewer => "reviewer",
        project => "project",
        branch => "branch",
        topic => "topic",
        file => "file",
        path => "path",
        comment => "comment",
        message => "message",
        author => "author",
        committer => "committer",
        bug => "bug",
        /// Tracking id (`tr:`).
        track => "tr",
        star => "star",
        /// Named saved query.
        query => "query",
        visible_to => "visibleto",
        starred_by => "starredby",
        watched_by => "watchedby",
        draft_by => "draftby",
        destination => "destination",
        /// Changes that conflict with the given change.
        conflicts => "conflicts",
        commit => "commit",
        parent_project => "parentproject",
        /// Projects whose name starts with the given prefix.
        projects => "projects",
        owner_in => "ownerin",
        reviewer_in => "reviewerin",
        change => "change",
        /// Git ref the change targets.
        reference => "ref",
        hashtag => "hashtag",
        from => "from",
        comment_by => "commentby",
        reviewed_by => "reviewedby",
        assignee => "assignee",
    }

    self_shorthand! {
        owner_self => "owner",
        reviewer_self => "reviewer",
        starred_by_self => "starredby",
        watched_by_self => "watchedby",
        draft_by_self => "draftby",
        assignee_self => "assignee",
        visible_to_self => "visibleto",
        comment_by_self => "commentby",
        from_self => "from",
        reviewed_by_self => "reviewedby",
    }

    pub fn is(self, value: IsType) -> Self {
        self.add(Term::keyword("is", value.as_str()))
    }

    pub fn has(self, value: HasType) -> Self {
        self.add(Term::keyword("has", value.as_str()))
    }

    /// Status filters are a subset of `is:` filters and are written as such.
    pub fn status(self, value: StatusType) -> Self {
        self.add(Term::keyword("is", value.as_str()))
    }

    /// Lines added, e.g. `added:">=10"`.
    pub fn added(self, relation: Relation, count: u32) -> Self {
        self.relational("added", relation, count)
    }

    pub fn deleted(self, relation: Relation, count: u32) -> Self {
        self.relational("deleted", relation, count)
    }

    pub fn delta(self, relation: Relation, count: u32) -> Self {
        self.relational("delta", relation, count)
    }

    pub fn size(self, relation: Relation, count: u32) -> Self {
        self.relational("size", relation, count)
    }

    fn relational(self, key: &str, relation: Relation, count: u32) -> Self {
        self.add(Term::quoted(key, &format!("{relation}{count}")))
    }

    pub fn before(self, at: OffsetDateTime) -> Self {
        self.date("before", at)
    }

    pub fn after(self, at: OffsetDateTime) -> Self {
        self.date("after", at)
    }

    pub fn until(self, at: OffsetDateTime) -> Self {
        self.date("until", at)
    }

    pub fn since(self, at: OffsetDateTime) -> Self {
        self.date("since", at)
    }

    fn date(self, key: &str, at: OffsetDateTime) -> Self {
        self.add(Term::quoted(key, &format_timestamp(at)))
    }

    /// Time since the last update, e.g. `age:3d`.
    pub fn age(self, unit: TimeUnit, amount: u32) -> Self {
        self.add(Term::keyword("age", unit.format(amount)))
    }

    /// Label vote equal to `score`: `label:"Code-Review=+1"`.
    pub fn label(self, name: &str, score: i32) -> Self {
        self.label_relation(name, Relation::Eq, score)
    }

    /// Label vote compared with `score`: `label:"Verified>=+1"`.
    pub fn label_relation(self, name: &str, relation: Relation, score: i32) -> Self {
        let value = format!("{}{}{}", name.trim(), relation, signed(score));
        self.add(Term::quoted("label", &value))
    }

    /// Any vote on the label.
    ///
    /// A name that would read back as a vote, such as `Foo-1`, is written
    /// with an explicit `=ANY`: `label:"Foo-1=ANY"`.
    pub fn label_any(self, name: &str) -> Self {
        let name = name.trim();
        let value = match parse_label(name) {
            Ok((parsed, None)) if parsed == name => name.to_string(),
            _ => format!("{name}{ANY_VOTE}"),
        };
        self.add(Term::quoted("label", &value))
    }

    /// Caps the number of results.
    pub fn limit(self, count: u32) -> Self {
        self.add(Term::keyword("limit", count.to_string()))
    }
}

/// Scores carry an explicit sign except zero.
fn signed(score: i32) -> String {
    if score > 0 {
        format!("+{score}")
    } else {
        score.to_string()
    }
}

type Label = (String, Option<(Relation, i32)>);

/// Marks a bare label name that would otherwise read as a vote.
const ANY_VOTE: &str = "=ANY";

/// Splits a label argument into its name and optional comparison.
///
/// The score is read from the end, so names may contain `-`, digits and
/// comparison symbols. Accepts `Name=+1`, `Name>=1`, `Name+1`, `Name-1`,
/// `Name=ANY` and a bare `Name`.
fn parse_label(value: &str) -> std::result::Result<Label, String> {
    let value = value.trim();
    if let Some(name) = strip_any_vote(value) {
        if name.is_empty() {
            return Err(format!("label '{value}' has no name"));
        }
        return Ok((name.to_string(), None));
    }

    let unsigned = value.trim_end_matches(|c: char| c.is_ascii_digit());
    let has_digits = unsigned.len() < value.len();
    let (rest, signed) = match unsigned
        .strip_suffix('+')
        .or_else(|| unsigned.strip_suffix('-'))
    {
        Some(rest) => (rest, true),
        None => (unsigned, false),
    };
    let comparison = match Relation::split_suffix(rest) {
        Some(found) => Some(found),
        None if signed => Some((rest, Relation::Eq)),
        None => None,
    };

    let (name, relation) = match comparison {
        Some(found) if has_digits => found,
        _ => {
            if value.contains(|c: char| matches!(c, '=' | '<' | '>')) {
                return Err(format!("invalid comparison in label '{value}'"));
            }
            return Ok((value.to_string(), None));
        }
    };
    if name.is_empty() {
        return Err(format!("label '{value}' has no name"));
    }
    let score = &value[rest.len()..];
    let score = score
        .parse::<i32>()
        .map_err(|_| format!("invalid score '{score}' in label '{value}'"))?;
    Ok((name.to_string(), Some((relation, score))))
}

fn strip_any_vote(value: &str) -> Option<&str> {
    let split = value.len().checked_sub(ANY_VOTE.len())?;
    let suffix = value.get(split..)?;
    suffix
        .eq_ignore_ascii_case(ANY_VOTE)
        .then(|| &value[..split])
}

fn parse_count(key: &str, value: &str) -> std::result::Result<(Relation, u32), String> {
    let (relation, count) = Relation::split_prefix(value).unwrap_or((Relation::Eq, value));
    let count = count
        .parse::<u32>()
        .map_err(|_| format!("invalid count '{value}' for '{key}'"))?;
    Ok((relation, count))
}

impl Vocabulary for ChangeQuery {
    const KIND: &'static str = "change";

    fn knows(key: &str) -> bool {
        Self::CATEGORICAL.contains(&key)
            || RELATIONAL.contains(&key)
            || DATES.contains(&key)
            || matches!(key, "is" | "has" | "status" | "age" | "label" | "limit")
    }

    fn apply(self, key: &str, value: &str, quoted: bool) -> std::result::Result<Self, String> {
        match key {
            "is" => Ok(self.is(value.parse()?)),
            "has" => Ok(self.has(value.parse()?)),
            "status" => Ok(self.status(value.parse()?)),
            "age" => {
                let (unit, amount) = TimeUnit::parse_duration(value)?;
                Ok(self.age(unit, amount))
            }
            "label" => Ok(match parse_label(value)? {
                (name, Some((relation, score))) => self.label_relation(&name, relation, score),
                (name, None) => self.label_any(&name),
            }),
            "limit" => {
                let count = value
                    .parse::<u32>()
                    .map_err(|_| format!("invalid limit '{value}'"))?;
                Ok(self.limit(count))
            }
            key if RELATIONAL.contains(&key) => {
                let (relation, count) = parse_count(key, value)?;
                Ok(self.relational(key, relation, count))
            }
            key if DATES.contains(&key) => {
                let at = parse_timestamp(value)
                    .ok_or_else(|| format!("invalid timestamp '{value}' for '{key}'"))?;
                Ok(self.date(key, at))
            }
            key if !quoted && value == "self" && Self::SELF_KEYS.contains(&key) => {
                Ok(self.add(Term::keyword(key, "self")))
            }
            key if Self::CATEGORICAL.contains(&key) => Ok(self.add(Term::quoted(key, value))),
            _ => Err(format!("unknown change predicate '{key}'")),
        }
    }

    fn push_term(self, term: Term) -> Self {
        self.add(term)
    }
}

impl ComplexVocabulary for ChangeQuery {
    fn push_node(self, node: Node) -> Self {
        ChangeQuery {
            query: self.query.push(node),
        }
    }

    fn into_complex(self) -> ComplexQuery {
        self.query
    }
}

impl fmt::Display for ChangeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query, f)
    }
}

impl FromStr for ChangeQuery {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        ChangeQuery::parse(s)
    }
}

impl From<ChangeQuery> for ComplexQuery {
    fn from(query: ChangeQuery) -> Self {
        query.query
    }
}
