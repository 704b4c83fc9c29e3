//! Recursive-descent parser for the search syntax.
//!
//! Parsing runs in two passes. The grammar turns tokens into a tree of
//! [`Item`]s that mirrors the input exactly: juxtaposed operands stay
//! juxtaposed, `AND`/`OR` attach the operand that follows them, and `-`/`NOT`
//! wrap the next operand. The tree is then replayed through the builder
//! methods of the target query type, so a parsed query serializes with the
//! same code as a hand-built one.
//!
//! ```text
//! sequence := (unary | ('AND' | 'OR') operand)*
//! operand  := '(' sequence ')' | unary
//! unary    := ('-' | 'NOT') (group | unary) | group | term
//! group    := '(' sequence ')'
//! ```

mod lexer;

use std::iter::Peekable;
use std::vec;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::complex::{ComplexQuery, Node};
use crate::error::{Operator, ParseError};
use crate::term::Term;

use lexer::{Token, TokenKind};

/// Nesting accepted by [`ParseOptions::default`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parser configuration.
///
/// Deserializes with defaults for missing fields, so applications can embed
/// it in their own configuration files:
///
/// ```
/// use gerrit_filter::ParseOptions;
///
/// let options: ParseOptions = serde_json::from_str(r#"{"strict": false}"#).unwrap();
/// assert_eq!(options, ParseOptions::lenient());
/// assert_eq!(options.max_depth, gerrit_filter::DEFAULT_MAX_DEPTH);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Reject `key:value` predicates the query type does not know.
    ///
    /// When `false`, unknown predicates (plugin operators, newer server
    /// versions) are kept verbatim.
    pub strict: bool,
    /// Maximum nesting of groups, negations and `AND`/`OR` operands.
    ///
    /// Builders do not limit nesting. A built query nested deeper than this
    /// is rejected when its string is parsed back.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Default options with unknown predicates passed through.
    pub fn lenient() -> Self {
        ParseOptions {
            strict: false,
            ..ParseOptions::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Predicate set of one query type, as seen by the parser.
pub(crate) trait Vocabulary: Default {
    /// Query kind used in error messages (`change`, `account`, ...).
    const KIND: &'static str;

    /// Returns `true` for lower-cased keys this query type understands.
    fn knows(key: &str) -> bool;

    /// Applies a known `key:value` predicate. `key` is lower-cased; the error
    /// describes an invalid value.
    fn apply(self, key: &str, value: &str, quoted: bool) -> Result<Self, String>;

    /// Applies a known `-key:value` predicate. Only flat query types see this.
    fn apply_negated(self, key: &str, value: &str, quoted: bool) -> Result<Self, String> {
        keep_negated(self, key, value, quoted)
    }

    /// Appends a term verbatim.
    fn push_term(self, term: Term) -> Self;
}

/// Vocabulary of a query type with boolean composition.
pub(crate) trait ComplexVocabulary: Vocabulary {
    fn push_node(self, node: Node) -> Self;

    fn into_complex(self) -> ComplexQuery;
}

/// Validates `key:value` like a positive predicate, then appends it as a
/// negated term.
pub(crate) fn keep_negated<Q: Vocabulary>(
    query: Q,
    key: &str,
    value: &str,
    quoted: bool,
) -> Result<Q, String> {
    Q::default().apply(key, value, quoted)?;
    Ok(query.push_term(field_term(key, value, quoted).negated()))
}

/// Builds the term for a predicate kept verbatim.
pub(crate) fn field_term(key: &str, value: &str, quoted: bool) -> Term {
    if quoted {
        Term::quoted(key, value)
    } else {
        Term::keyword(key, value)
    }
}

/// Parses `input` into a query with `AND`, `OR`, groups and negation.
pub(crate) fn parse_complex<Q: ComplexVocabulary>(
    input: &str,
    options: &ParseOptions,
) -> Result<Q, ParseError> {
    let result = items(input, options).and_then(|items| {
        let context = Context { input, options };
        context.build_complex::<Q>(items)
    });
    logged::<Q>(input, result)
}

/// Parses `input` into a flat query. Only terms and negated terms are
/// allowed.
pub(crate) fn parse_flat<Q: Vocabulary>(
    input: &str,
    options: &ParseOptions,
) -> Result<Q, ParseError> {
    let result = items(input, options).and_then(|items| {
        let context = Context { input, options };
        context.build_flat::<Q>(items)
    });
    logged::<Q>(input, result)
}

fn items(input: &str, options: &ParseOptions) -> Result<Vec<Item>, ParseError> {
    let tokens = lexer::tokenize(input)?;
    Grammar {
        tokens: tokens.into_iter().peekable(),
        input,
        max_depth: options.max_depth,
    }
    .parse()
}

fn logged<Q: Vocabulary>(input: &str, result: Result<Q, ParseError>) -> Result<Q, ParseError> {
    match &result {
        Ok(_) => debug!(kind = Q::KIND, input, "parsed query"),
        Err(err) => debug!(
            kind = Q::KIND,
            input,
            position = err.position,
            reason = %err.message,
            "rejected query"
        ),
    }
    result
}

// ============================================================================
// Grammar
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    kind: ItemKind,
    position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemKind {
    Atom(Atom),
    And(Vec<Item>),
    Or(Vec<Item>),
    Not(Vec<Item>),
    Group(Vec<Item>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Atom {
    Text(String),
    Field {
        key: String,
        value: String,
        quoted: bool,
    },
}

struct Grammar<'a> {
    tokens: Peekable<vec::IntoIter<Token>>,
    input: &'a str,
    max_depth: usize,
}

impl<'a> Grammar<'a> {
    fn parse(mut self) -> Result<Vec<Item>, ParseError> {
        let items = self.sequence(0)?;
        match self.tokens.next() {
            None => Ok(items),
            Some(token) => Err(self.error("unbalanced ')'", token.position)),
        }
    }

    /// Juxtaposed operands up to the end of input or a closing `)`.
    fn sequence(&mut self, depth: usize) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        loop {
            let Some(token) = self.tokens.peek() else {
                break;
            };
            let position = token.position;
            let operator = match &token.kind {
                TokenKind::Close => break,
                TokenKind::And => Operator::And,
                TokenKind::Or => Operator::Or,
                _ => {
                    items.push(self.unary(depth)?);
                    continue;
                }
            };

            self.tokens.next();
            if items.is_empty() {
                return Err(self.error(format!("'{operator}' has no left operand"), position));
            }
            let operand = self.operand(operator, position, depth)?;
            let kind = match operator {
                Operator::Or => ItemKind::Or(operand),
                _ => ItemKind::And(operand),
            };
            items.push(Item { kind, position });
        }
        Ok(items)
    }

    /// Right-hand side of `AND`/`OR`. A parenthesized operand contributes its
    /// contents directly.
    fn operand(
        &mut self,
        operator: Operator,
        position: usize,
        depth: usize,
    ) -> Result<Vec<Item>, ParseError> {
        let inner = self.enter(depth, position)?;
        match self.tokens.peek().map(|token| &token.kind) {
            Some(TokenKind::Open) => {
                let open = self.advance(position);
                self.group(open, inner)
            }
            Some(
                TokenKind::Minus | TokenKind::Not | TokenKind::Text(_) | TokenKind::Field { .. },
            ) => Ok(vec![self.unary(inner)?]),
            _ => Err(self.error(format!("'{operator}' has no right operand"), position)),
        }
    }

    fn unary(&mut self, depth: usize) -> Result<Item, ParseError> {
        let position = self.peek_position();
        let Some(token) = self.tokens.next() else {
            return Err(self.error("expected a term", position));
        };

        let kind = match token.kind {
            TokenKind::Minus | TokenKind::Not => {
                let inner = self.enter(depth, position)?;
                match self.tokens.peek().map(|token| &token.kind) {
                    Some(TokenKind::Open) => {
                        let open = self.advance(position);
                        ItemKind::Not(self.group(open, inner)?)
                    }
                    Some(
                        TokenKind::Minus
                        | TokenKind::Not
                        | TokenKind::Text(_)
                        | TokenKind::Field { .. },
                    ) => ItemKind::Not(vec![self.unary(inner)?]),
                    _ => return Err(self.error("negation has no operand", position)),
                }
            }
            TokenKind::Open => {
                let inner = self.enter(depth, position)?;
                ItemKind::Group(self.group(position, inner)?)
            }
            TokenKind::Text(text) => ItemKind::Atom(Atom::Text(text)),
            TokenKind::Field { key, value, quoted } => {
                ItemKind::Atom(Atom::Field { key, value, quoted })
            }
            TokenKind::Close | TokenKind::And | TokenKind::Or => {
                return Err(self.error("expected a term", position));
            }
        };
        Ok(Item { kind, position })
    }

    /// Body of a group whose `(` at `open` was already consumed.
    fn group(&mut self, open: usize, depth: usize) -> Result<Vec<Item>, ParseError> {
        let items = self.sequence(depth)?;
        if !matches!(self.tokens.next(), Some(Token { kind: TokenKind::Close, .. })) {
            return Err(self.error("unclosed '('", open));
        }
        if items.is_empty() {
            return Err(self.error("empty parentheses", open));
        }
        Ok(items)
    }

    fn enter(&self, depth: usize, position: usize) -> Result<usize, ParseError> {
        if depth >= self.max_depth {
            return Err(self.error(
                format!("query nests deeper than {} levels", self.max_depth),
                position,
            ));
        }
        Ok(depth + 1)
    }

    /// Consumes the next token and returns its position.
    fn advance(&mut self, fallback: usize) -> usize {
        self.tokens
            .next()
            .map_or(fallback, |token| token.position)
    }

    fn peek_position(&mut self) -> usize {
        self.tokens
            .peek()
            .map_or(self.input.len(), |token| token.position)
    }

    fn error(&self, message: impl Into<String>, position: usize) -> ParseError {
        ParseError::new(message, self.input, position)
    }
}

// ============================================================================
// Replay
// ============================================================================

struct Context<'a> {
    input: &'a str,
    options: &'a ParseOptions,
}

impl Context<'_> {
    fn build_complex<Q: ComplexVocabulary>(&self, items: Vec<Item>) -> Result<Q, ParseError> {
        items.into_iter().try_fold(Q::default(), |query, item| {
            let node = match item.kind {
                ItemKind::Atom(atom) => return self.apply(query, atom, false, item.position),
                ItemKind::And(inner) => Node::And(self.nested::<Q>(inner)?),
                ItemKind::Or(inner) => Node::Or(self.nested::<Q>(inner)?),
                ItemKind::Not(inner) => Node::Not(self.nested::<Q>(inner)?),
                ItemKind::Group(inner) => Node::Group(self.nested::<Q>(inner)?),
            };
            Ok(query.push_node(node))
        })
    }

    fn nested<Q: ComplexVocabulary>(&self, items: Vec<Item>) -> Result<ComplexQuery, ParseError> {
        self.build_complex::<Q>(items).map(Q::into_complex)
    }

    fn build_flat<Q: Vocabulary>(&self, items: Vec<Item>) -> Result<Q, ParseError> {
        items.into_iter().try_fold(Q::default(), |query, item| match item.kind {
            ItemKind::Atom(atom) => self.apply(query, atom, false, item.position),
            ItemKind::Not(inner) => match <[Item; 1]>::try_from(inner) {
                Ok(
                    [Item {
                        kind: ItemKind::Atom(atom),
                        ..
                    }],
                ) => self.apply(query, atom, true, item.position),
                _ => Err(self.unsupported::<Q>(item.position)),
            },
            _ => Err(self.unsupported::<Q>(item.position)),
        })
    }

    fn apply<Q: Vocabulary>(
        &self,
        query: Q,
        atom: Atom,
        negated: bool,
        position: usize,
    ) -> Result<Q, ParseError> {
        let (key, value, quoted) = match atom {
            Atom::Text(text) => {
                let term = Term::text(&text);
                return Ok(query.push_term(if negated { term.negated() } else { term }));
            }
            Atom::Field { key, value, quoted } => (key, value, quoted),
        };

        let lower = key.to_ascii_lowercase();
        if Q::knows(&lower) {
            let applied = if negated {
                query.apply_negated(&lower, &value, quoted)
            } else {
                query.apply(&lower, &value, quoted)
            };
            return applied.map_err(|message| ParseError::new(message, self.input, position));
        }

        if self.options.strict {
            return Err(ParseError::new(
                format!("unknown {} predicate '{key}'", Q::KIND),
                self.input,
                position,
            ));
        }
        let term = field_term(&key, &value, quoted);
        Ok(query.push_term(if negated { term.negated() } else { term }))
    }

    fn unsupported<Q: Vocabulary>(&self, position: usize) -> ParseError {
        ParseError::new(
            format!("{} queries do not support boolean operators or groups", Q::KIND),
            self.input,
            position,
        )
    }
}
