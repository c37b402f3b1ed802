//! A hand-rolled JSON library: Unicode normalization, a lexer, a recursive-descent parser and a
//! printer over a small immutable value tree.
//!
//! The pipeline is `raw bytes -> normalize -> lex -> parse -> Value`. Normalization rewrites the
//! input into an ASCII-only canonical form (non-ASCII code points become `\uXXXX` escapes), so
//! the lexer only ever deals with ASCII and spans in errors refer to the normalized text.
//!
//! We deviate from strict JSON in two places: comments (`//`, `#`, `/* */`) are accepted wherever
//! whitespace is, and numbers may have leading zeros (`01` is the number one).
//!
//! ```
//! use jsontree::{from_str, Value};
//!
//! let value = from_str(r#"{"x": [1, 2, 3], "y": "hi"} // trailing comment"#).unwrap();
//! assert_eq!(value.get("y"), Some(&Value::from("hi")));
//! assert_eq!(value.to_string(), r#"{"x":[1,2,3],"y":"hi"}"#);
//! ```

mod encoding;
mod error;
mod lexer;
mod parser;
mod printer;
mod span;
mod value;

pub use encoding::{detect_encoding, normalize_bytes, normalize_str, Encoding};
pub use error::{JsonError, Result};
pub use indexmap::IndexMap;
pub use lexer::{lex, Lexer, Token, TokenKind};
pub use parser::{
    from_slice, from_slice_with, from_str, from_str_with, parse_tokens, parse_tokens_with,
    ParserConfig,
};
pub use printer::{Display, Format, PrintOptions};
pub use span::Span;
pub use value::{Kind, Object, Value};
