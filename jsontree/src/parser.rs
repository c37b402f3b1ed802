//! Recursive-descent parser over the token stream.
//!
//! Sub-parsers that may legitimately find nothing (the first element of an array, the first
//! member of an object) return `Ok(None)` without consuming input; hard errors are reserved for
//! input that is genuinely malformed.

use tracing::*;

use crate::encoding::{normalize_bytes, normalize_str};
use crate::error::{JsonError, Result};
use crate::lexer::{lex, Token, TokenKind};
use crate::value::{Object, Value};
use crate::Span;

/// Knobs for the parser.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum number of nested objects/arrays. Parsing recurses once per level, so this bounds
    /// stack usage.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig { max_depth: 512 }
    }
}

/// Parse already-decoded text: normalize, lex, parse.
pub fn from_str(text: &str) -> Result<Value> {
    from_str_with(text, &ParserConfig::default())
}

pub fn from_str_with(text: &str, config: &ParserConfig) -> Result<Value> {
    let normalized = normalize_str(text)?;
    let tokens = lex(&normalized)?;
    parse_tokens_with(&tokens, config)
}

/// Parse raw bytes in any of the RFC 4627 encodings.
pub fn from_slice(bytes: &[u8]) -> Result<Value> {
    from_slice_with(bytes, &ParserConfig::default())
}

pub fn from_slice_with(bytes: &[u8], config: &ParserConfig) -> Result<Value> {
    let normalized = normalize_bytes(bytes)?;
    let tokens = lex(&normalized)?;
    parse_tokens_with(&tokens, config)
}

/// Parse exactly one value from `tokens`; anything left over is an error.
pub fn parse_tokens(tokens: &[Token<'_>]) -> Result<Value> {
    parse_tokens_with(tokens, &ParserConfig::default())
}

#[instrument(level = "debug", skip_all, fields(tokens = tokens.len()))]
pub fn parse_tokens_with(tokens: &[Token<'_>], config: &ParserConfig) -> Result<Value> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth: config.max_depth,
        eof: tokens.last().map_or(0, |t| t.span.hi),
    };
    let value = parser.value()?;
    if let Some(trailing) = parser.peek() {
        return Err(JsonError::ExpectedGot {
            expected: "end of input",
            got: trailing.to_string(),
            span: trailing.span,
        });
    }
    Ok(value)
}

struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    depth: usize,
    max_depth: usize,
    eof: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<&'t Token<'a>> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Description and span of the next token, for diagnostics.
    fn found(&self) -> (String, Span) {
        match self.peek() {
            Some(t) => (t.to_string(), t.span),
            None => ("end of input".to_string(), Span::point(self.eof)),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<&'t Token<'a>> {
        if self.peek_kind() == Some(kind) {
            // Just peeked, so there is a token to take.
            if let Some(token) = self.bump() {
                return Ok(token);
            }
        }
        let (got, span) = self.found();
        Err(JsonError::ExpectedGot {
            expected,
            got,
            span,
        })
    }

    fn value(&mut self) -> Result<Value> {
        match self.value_opt()? {
            Some(value) => Ok(value),
            None => {
                let (got, span) = self.found();
                Err(JsonError::UnexpectedToken { got, span })
            }
        }
    }

    /// Parse a value if the next token can start one.
    fn value_opt(&mut self) -> Result<Option<Value>> {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        let value = match token.kind {
            TokenKind::String => {
                self.bump();
                Value::String(unescape(token)?)
            }
            TokenKind::Number => {
                self.bump();
                Value::Number(number(token)?)
            }
            TokenKind::Bool => {
                self.bump();
                match token.text {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => return Err(unknown_identifier(token)),
                }
            }
            TokenKind::Null => {
                self.bump();
                if token.text != "null" {
                    return Err(unknown_identifier(token));
                }
                Value::Null
            }
            TokenKind::ObjectOpen => self.object()?,
            TokenKind::ArrayOpen => self.array()?,
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    fn enter(&mut self, open: &Token<'_>) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(JsonError::NestingTooDeep {
                limit: self.max_depth,
                span: open.span,
            });
        }
        Ok(())
    }

    fn object(&mut self) -> Result<Value> {
        let open = self.expect(TokenKind::ObjectOpen, "`{`")?;
        self.enter(open)?;

        let mut members = Object::new();
        let mut first = true;
        loop {
            let key = match self.key_opt()? {
                Some(key) => key,
                None if first => break,
                None => {
                    let (got, span) = self.found();
                    return Err(JsonError::ExpectedGot {
                        expected: "string key",
                        got,
                        span,
                    });
                }
            };
            first = false;
            self.expect(TokenKind::Colon, "`:`")?;
            let value = self.value()?;
            if let Some(shadowed) = members.insert(key.0, value) {
                debug!(key = key.1, ?shadowed, "duplicate object key, keeping the last value");
            }
            if self.peek_kind() == Some(TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }

        self.expect(TokenKind::ObjectClose, "`}`")?;
        self.depth -= 1;
        Ok(Value::Object(members))
    }

    /// The unescaped key plus its raw text (for diagnostics), if the next token is a string.
    fn key_opt(&mut self) -> Result<Option<(String, &'a str)>> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::String => {
                self.bump();
                Ok(Some((unescape(token)?, token.text)))
            }
            _ => Ok(None),
        }
    }

    fn array(&mut self) -> Result<Value> {
        let open = self.expect(TokenKind::ArrayOpen, "`[`")?;
        self.enter(open)?;

        let mut elements = Vec::new();
        if let Some(first) = self.value_opt()? {
            elements.push(first);
            while self.peek_kind() == Some(TokenKind::Comma) {
                self.bump();
                // Trailing commas are rejected here: a comma must be followed by a value.
                elements.push(self.value()?);
            }
        }

        self.expect(TokenKind::ArrayClose, "`]`")?;
        self.depth -= 1;
        Ok(Value::Array(elements))
    }
}

fn unknown_identifier(token: &Token<'_>) -> JsonError {
    JsonError::UnknownIdentifier {
        text: token.text.to_string(),
        span: token.span,
    }
}

fn number(token: &Token<'_>) -> Result<f64> {
    let n: f64 = token.text.parse().map_err(|_| JsonError::UnknownToken {
        text: token.text.to_string(),
        span: token.span,
    })?;
    if !n.is_finite() {
        return Err(JsonError::NumberOutOfRange {
            text: token.text.to_string(),
            span: token.span,
        });
    }
    Ok(n)
}

/// Resolve the escapes in a string token. Surrogate pairs are combined; an escaped surrogate
/// without its partner becomes U+FFFD.
fn unescape(token: &Token<'_>) -> Result<String> {
    let raw = token.text;
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }

    // Content starts one byte after the opening quote.
    let base = token.span.lo + 1;
    let malformed = |at: usize, len: usize| {
        let mut end = (at + len).min(raw.len());
        while !raw.is_char_boundary(end) {
            end += 1;
        }
        JsonError::MalformedEscape {
            text: raw[at..end].to_string(),
            span: Span::new(base + at, base + end),
        }
    };
    let hex4 = |at: usize| -> Option<u16> {
        raw.get(at..at + 4)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|digits| u16::from_str_radix(digits, 16).ok())
    };

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw.char_indices();
    while let Some((at, c)) = rest.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some((_, escaped)) = rest.next() else {
            return Err(JsonError::UnterminatedEscape {
                span: Span::new(base + at, base + raw.len()),
            });
        };
        match escaped {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let high = hex4(at + 2).ok_or_else(|| malformed(at, 6))?;
                // Skip the four hex digits.
                rest.nth(3);
                let low = match high {
                    0xD800..=0xDBFF if raw[at + 6..].starts_with("\\u") => {
                        hex4(at + 8).filter(|low| (0xDC00..=0xDFFF).contains(low))
                    }
                    _ => None,
                };
                let c = match low {
                    Some(low) => {
                        rest.nth(5);
                        let high = u32::from(high) - 0xD800;
                        let low = u32::from(low) - 0xDC00;
                        char::from_u32(0x10000 + (high << 10) + low)
                    }
                    None => char::from_u32(u32::from(high)),
                };
                out.push(c.unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            _ => return Err(malformed(at, 2)),
        }
    }
    Ok(out)
}
