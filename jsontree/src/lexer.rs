//! Hand-written lexer producing a flat token stream from (normalized) JSON text.
//!
//! Besides standard JSON this accepts `//`, `#` and `/* */` comments wherever whitespace is
//! accepted, and numbers with leading zeros.

use std::fmt;

use crate::error::{JsonError, Result};
use crate::Span;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    ObjectOpen,
    ObjectClose,
    ArrayOpen,
    ArrayClose,
    String,
    Number,
    Colon,
    Comma,
    Bool,
    Null,
    /// A character that cannot start any token. Lexing carries on; the parser rejects it when it
    /// gets there.
    Unknown,
}

impl TokenKind {
    pub const fn desc(self) -> &'static str {
        match self {
            TokenKind::ObjectOpen => "`{`",
            TokenKind::ObjectClose => "`}`",
            TokenKind::ArrayOpen => "`[`",
            TokenKind::ArrayClose => "`]`",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Bool => "boolean",
            TokenKind::Null => "`null`",
            TokenKind::Unknown => "unknown character",
        }
    }
}

/// A lexeme borrowed from the input. For strings, `text` is the raw content between the quotes
/// with escapes left untouched, while `span` covers the quotes too.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "string \"{}\"", self.text),
            TokenKind::Number | TokenKind::Bool | TokenKind::Unknown => {
                write!(f, "`{}`", self.text)
            }
            kind => f.write_str(kind.desc()),
        }
    }
}

/// Lex all of `src`, stopping at the first error.
pub fn lex(src: &str) -> Result<Vec<Token<'_>>> {
    Lexer::new(src).collect()
}

/// Single forward pass over the input. Yields tokens until the input is exhausted or an error is
/// hit; nothing is produced after an error.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        self.pos - start
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.pos)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            text: &self.src[start..self.pos],
            span: self.span_from(start),
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            self.bump_while(is_whitespace);
            match (self.peek(), self.peek_second()) {
                (Some('#'), _) | (Some('/'), Some('/')) => {
                    self.bump_while(|c| c != '\n');
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    match self.src[start + 2..].find("*/") {
                        Some(end) => self.pos = start + 2 + end + 2,
                        None => {
                            self.pos = self.src.len();
                            return Err(JsonError::UnterminatedComment {
                                span: self.span_from(start),
                            });
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn string(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        self.bump();
        let content = self.pos;
        loop {
            let Some(c) = self.bump() else {
                return Err(JsonError::UnterminatedString {
                    span: self.span_from(start),
                });
            };
            match c {
                '"' => break,
                '\\' => self.escape()?,
                _ => {}
            }
        }
        Ok(Token {
            kind: TokenKind::String,
            text: &self.src[content..self.pos - 1],
            span: self.span_from(start),
        })
    }

    /// Validate one escape sequence; the backslash has already been consumed.
    fn escape(&mut self) -> Result<()> {
        let start = self.pos - 1;
        let malformed = |lexer: &Self| JsonError::MalformedEscape {
            text: lexer.src[start..lexer.pos].to_string(),
            span: lexer.span_from(start),
        };
        match self.bump() {
            None => Err(JsonError::UnterminatedEscape {
                span: self.span_from(start),
            }),
            Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => Ok(()),
            Some('u') => {
                for _ in 0..4 {
                    match self.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            self.bump();
                        }
                        Some(_) => {
                            self.bump();
                            return Err(malformed(&*self));
                        }
                        None => return Err(malformed(&*self)),
                    }
                }
                Ok(())
            }
            Some(_) => Err(malformed(&*self)),
        }
    }

    /// `-? digit+ ('.' digit+)? ([eE] [+-]? digit+)?`
    fn number(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        let digits = |lexer: &mut Self| {
            if lexer.bump_while(|c| c.is_ascii_digit()) == 0 {
                // Include the offending character, if any, in the reported lexeme.
                lexer.bump();
                Err(JsonError::UnknownToken {
                    text: lexer.src[start..lexer.pos].to_string(),
                    span: lexer.span_from(start),
                })
            } else {
                Ok(())
            }
        };

        if self.peek() == Some('-') {
            self.bump();
        }
        digits(&mut *self)?;
        if self.peek() == Some('.') {
            self.bump();
            digits(&mut *self)?;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            digits(&mut *self)?;
        }
        Ok(self.token(TokenKind::Number, start))
    }

    /// Match `word` letter by letter.
    fn keyword(&mut self, word: &'static str, kind: TokenKind) -> Result<Token<'a>> {
        let start = self.pos;
        for expected in word.chars() {
            if self.peek() == Some(expected) {
                self.bump();
            } else {
                self.bump_while(|c| c.is_ascii_alphanumeric());
                return Err(JsonError::UnknownIdentifier {
                    text: self.src[start..self.pos].to_string(),
                    span: self.span_from(start),
                });
            }
        }
        Ok(self.token(kind, start))
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let token = match c {
            '"' => self.string()?,
            '-' | '0'..='9' => self.number()?,
            't' => self.keyword("true", TokenKind::Bool)?,
            'f' => self.keyword("false", TokenKind::Bool)?,
            'n' => self.keyword("null", TokenKind::Null)?,
            '/' => {
                self.bump();
                return Err(JsonError::UnknownToken {
                    text: "/".to_string(),
                    span: self.span_from(start),
                });
            }
            _ => {
                self.bump();
                let kind = match c {
                    '{' => TokenKind::ObjectOpen,
                    '}' => TokenKind::ObjectClose,
                    '[' => TokenKind::ArrayOpen,
                    ']' => TokenKind::ArrayClose,
                    ':' => TokenKind::Colon,
                    ',' => TokenKind::Comma,
                    _ => TokenKind::Unknown,
                };
                self.token(kind, start)
            }
        };
        Ok(Some(token))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(e) => {
                self.pos = self.src.len();
                Some(Err(e))
            }
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{8}' | '\u{b}' | '\u{c}')
}
