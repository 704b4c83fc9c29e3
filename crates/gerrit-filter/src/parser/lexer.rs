//! Tokenizer for the search syntax.
//!
//! The grammar is small enough that the whole input is split up front; the
//! grammar in the parent module then walks the token vector.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Open,
    Close,
    /// `-` directly in front of a term or group.
    Minus,
    And,
    Or,
    Not,
    /// Free text, bare or quoted.
    Text(String),
    /// `key:value` with the value unescaped.
    Field {
        key: String,
        value: String,
        quoted: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub position: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    Lexer { input, pos: 0 }.run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_ws();
            let position = self.pos;
            let Some(ch) = self.peek() else {
                break;
            };
            let kind = match ch {
                '(' => {
                    self.bump();
                    TokenKind::Open
                }
                ')' => {
                    self.bump();
                    TokenKind::Close
                }
                '-' => {
                    self.bump();
                    match self.peek() {
                        Some(next) if !next.is_whitespace() && next != ')' => TokenKind::Minus,
                        _ => return Err(self.error("'-' must be followed by a term or group", position)),
                    }
                }
                '"' => TokenKind::Text(self.quoted()?),
                _ => self.word()?,
            };
            tokens.push(Token { kind, position });
        }
        Ok(tokens)
    }

    fn word(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        let rest = self.rest();
        let key_len = rest.find(|c: char| !is_key_char(c)).unwrap_or(rest.len());
        let key = &rest[..key_len];

        if is_key(key) && rest[key_len..].starts_with(':') {
            let key = key.to_string();
            self.pos += key_len + 1;
            let (value, quoted) = if self.peek() == Some('"') {
                (self.quoted()?, true)
            } else {
                (self.bare().to_string(), false)
            };
            if !quoted && value.is_empty() {
                return Err(self.error(format!("missing value for '{key}'"), start));
            }
            return Ok(TokenKind::Field { key, value, quoted });
        }

        Ok(match self.bare() {
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            text => TokenKind::Text(text.to_string()),
        })
    }

    /// Reads up to the next whitespace or parenthesis.
    fn bare(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest.find(is_word_breaker).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Reads a `"..."` literal where `""` stands for one quote.
    fn quoted(&mut self) -> Result<String, ParseError> {
        let open = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated quoted string", open)),
                Some('"') => {
                    self.bump();
                    if self.peek() != Some('"') {
                        return Ok(value);
                    }
                    self.bump();
                    value.push('"');
                }
                Some(ch) => {
                    self.bump();
                    value.push(ch);
                }
            }
        }
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    fn error(&self, message: impl Into<String>, position: usize) -> ParseError {
        ParseError::new(message, self.input, position)
    }
}

fn is_word_breaker(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')')
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-')
}

fn is_key(key: &str) -> bool {
    key.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}
