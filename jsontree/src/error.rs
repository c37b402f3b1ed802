use thiserror::Error;

use crate::encoding::Encoding;
use crate::Span;

/// Everything that can go wrong while turning raw input into a [`Value`](crate::Value).
///
/// Errors are fatal to the parse call that produced them: there is no partial result and no
/// recovery. Spans index into the *normalized* input, see [`normalize_str`](crate::normalize_str).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonError {
    #[error("input is not valid {encoding} at byte {offset}: {reason}")]
    Encoding {
        encoding: Encoding,
        offset: usize,
        reason: &'static str,
    },
    #[error("unknown token `{text}`")]
    UnknownToken { text: String, span: Span },
    #[error("number `{text}` is out of range")]
    NumberOutOfRange { text: String, span: Span },
    #[error("unknown identifier `{text}`, expected `true`, `false` or `null`")]
    UnknownIdentifier { text: String, span: Span },
    #[error("unterminated string")]
    UnterminatedString { span: Span },
    #[error("unterminated escape sequence")]
    UnterminatedEscape { span: Span },
    #[error("malformed escape sequence `{text}`")]
    MalformedEscape { text: String, span: Span },
    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },
    #[error("unexpected {got}, expected a value")]
    UnexpectedToken { got: String, span: Span },
    #[error("expected {expected}, got {got}")]
    ExpectedGot {
        expected: &'static str,
        got: String,
        span: Span,
    },
    #[error("nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize, span: Span },
}

impl JsonError {
    /// Where in the normalized input the error was detected. Encoding errors happen before
    /// normalization and carry a raw byte offset instead.
    pub fn span(&self) -> Option<Span> {
        match self {
            JsonError::Encoding { .. } => None,
            JsonError::UnknownToken { span, .. }
            | JsonError::NumberOutOfRange { span, .. }
            | JsonError::UnknownIdentifier { span, .. }
            | JsonError::UnterminatedString { span }
            | JsonError::UnterminatedEscape { span }
            | JsonError::MalformedEscape { span, .. }
            | JsonError::UnterminatedComment { span }
            | JsonError::UnexpectedToken { span, .. }
            | JsonError::ExpectedGot { span, .. }
            | JsonError::NestingTooDeep { span, .. } => Some(*span),
        }
    }
}

pub type Result<T, E = JsonError> = std::result::Result<T, E>;
