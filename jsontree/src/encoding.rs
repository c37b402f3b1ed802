//! Unicode normalization pass.
//!
//! Raw input is decoded from whichever Unicode encoding it arrives in and rewritten into a
//! canonical ASCII form before lexing: printable ASCII passes through untouched, the whitespace
//! control characters `\t \n \r \b \f \v` pass through as themselves, and every other code point
//! is spelled as a `\uXXXX` escape (a surrogate pair of escapes above U+FFFF). Normalizing text
//! that is already canonical is a no-op.
//!
//! A backslash directly in front of a character that gets escaped is refused: `"\é"` is not a
//! valid escape, and rewriting it would turn it into the valid `"\\u00e9"`.

use std::borrow::Cow;
use std::fmt;

use tracing::*;

use crate::error::{JsonError, Result};
use crate::Span;

/// The encodings RFC 4627 (section 3) allows a JSON text to arrive in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf32Le => "UTF-32LE",
            Encoding::Utf32Be => "UTF-32BE",
        })
    }
}

/// Guess the encoding of `bytes`. A byte-order mark wins; otherwise the pattern of zero bytes
/// among the first four bytes decides, since the first two characters of a JSON text are always
/// ASCII:
///
/// ```text
/// 00 00 00 xx  UTF-32BE
/// 00 xx 00 xx  UTF-16BE
/// xx 00 00 00  UTF-32LE
/// xx 00 xx 00  UTF-16LE
/// xx xx xx xx  UTF-8
/// ```
pub fn detect_encoding(bytes: &[u8]) -> Encoding {
    sniff(bytes).0
}

/// Returns the detected encoding and the length of the byte-order mark to skip.
fn sniff(bytes: &[u8]) -> (Encoding, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => (Encoding::Utf8, 3),
        [0x00, 0x00, 0xFE, 0xFF, ..] => (Encoding::Utf32Be, 4),
        [0xFF, 0xFE, 0x00, 0x00, ..] => (Encoding::Utf32Le, 4),
        [0xFE, 0xFF, ..] => (Encoding::Utf16Be, 2),
        [0xFF, 0xFE, ..] => (Encoding::Utf16Le, 2),
        [0, 0, 0, _, ..] => (Encoding::Utf32Be, 0),
        [0, _, 0, _, ..] => (Encoding::Utf16Be, 0),
        [_, 0, 0, 0, ..] => (Encoding::Utf32Le, 0),
        [_, 0, _, 0, ..] => (Encoding::Utf16Le, 0),
        // Fewer than four bytes can only hold a single character in the wider encodings.
        [0, _, ..] => (Encoding::Utf16Be, 0),
        [_, 0, ..] => (Encoding::Utf16Le, 0),
        _ => (Encoding::Utf8, 0),
    }
}

/// Decode `bytes` and rewrite them into canonical form.
#[instrument(level = "debug", skip_all, fields(len = bytes.len()))]
pub fn normalize_bytes(bytes: &[u8]) -> Result<String> {
    let (encoding, bom) = sniff(bytes);
    debug!(%encoding, bom, "detected input encoding");
    let body = &bytes[bom..];
    let fail = |offset: usize, reason: &'static str| JsonError::Encoding {
        encoding,
        offset: bom + offset,
        reason,
    };

    let mut out = Canonical::new(String::with_capacity(body.len()));
    match encoding {
        Encoding::Utf8 => {
            let text = std::str::from_utf8(body)
                .map_err(|e| fail(e.valid_up_to(), "invalid UTF-8 sequence"))?;
            for c in text.chars() {
                out.push(c)?;
            }
        }
        Encoding::Utf16Le | Encoding::Utf16Be => {
            if body.len() % 2 != 0 {
                return Err(fail(body.len() - 1, "truncated UTF-16 code unit"));
            }
            let units = body.chunks_exact(2).map(|pair| {
                let pair = [pair[0], pair[1]];
                if encoding == Encoding::Utf16Le {
                    u16::from_le_bytes(pair)
                } else {
                    u16::from_be_bytes(pair)
                }
            });
            let mut consumed = 0;
            for c in char::decode_utf16(units) {
                let c = c.map_err(|_| fail(consumed * 2, "unpaired surrogate"))?;
                consumed += c.len_utf16();
                out.push(c)?;
            }
        }
        Encoding::Utf32Le | Encoding::Utf32Be => {
            if body.len() % 4 != 0 {
                return Err(fail(body.len() - body.len() % 4, "truncated UTF-32 code unit"));
            }
            for (i, quad) in body.chunks_exact(4).enumerate() {
                let quad = [quad[0], quad[1], quad[2], quad[3]];
                let unit = if encoding == Encoding::Utf32Le {
                    u32::from_le_bytes(quad)
                } else {
                    u32::from_be_bytes(quad)
                };
                let c = char::from_u32(unit).ok_or_else(|| fail(i * 4, "invalid code point"))?;
                out.push(c)?;
            }
        }
    }
    Ok(out.out)
}

/// Rewrite already-decoded text into canonical form. Borrows when nothing needs escaping.
pub fn normalize_str(text: &str) -> Result<Cow<'_, str>> {
    let Some(first) = text.find(|c: char| !is_canonical(c)) else {
        return Ok(Cow::Borrowed(text));
    };
    let (prefix, rest) = text.split_at(first);
    let mut out = Canonical::new(String::with_capacity(text.len() + 16));
    out.out.push_str(prefix);
    out.backslashes = prefix.bytes().rev().take_while(|&b| b == b'\\').count();
    for c in rest.chars() {
        out.push(c)?;
    }
    Ok(Cow::Owned(out.out))
}

fn is_canonical(c: char) -> bool {
    matches!(c, ' '..='~' | '\t' | '\n' | '\r' | '\u{8}' | '\u{b}' | '\u{c}')
}

/// Canonical output under construction.
struct Canonical {
    out: String,
    /// Length of the run of backslashes at the end of `out`.
    backslashes: usize,
}

impl Canonical {
    fn new(out: String) -> Self {
        Canonical {
            out,
            backslashes: 0,
        }
    }

    fn push(&mut self, c: char) -> Result<()> {
        if is_canonical(c) {
            self.backslashes = if c == '\\' { self.backslashes + 1 } else { 0 };
            self.out.push(c);
            return Ok(());
        }
        if self.backslashes % 2 == 1 {
            let lo = self.out.len() - 1;
            return Err(JsonError::MalformedEscape {
                text: format!("\\{c}"),
                span: Span::new(lo, self.out.len() + 6 * c.len_utf16()),
            });
        }
        self.backslashes = 0;
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            push_unicode_escape(&mut self.out, *unit);
        }
        Ok(())
    }
}

/// Append `\uXXXX` with lower-case hex digits.
pub(crate) fn push_unicode_escape(out: &mut String, unit: u16) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    out.push_str("\\u");
    for shift in [12, 8, 4, 0] {
        out.push(HEX[usize::from((unit >> shift) & 0xF)] as char);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    fn utf16be(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(u16::to_be_bytes).collect()
    }

    fn utf32le(s: &str) -> Vec<u8> {
        s.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect()
    }

    fn utf32be(s: &str) -> Vec<u8> {
        s.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect()
    }

    #[test]
    fn detects_rfc4627_patterns() {
        let text = r#"{"a":1}"#;
        assert_eq!(detect_encoding(text.as_bytes()), Encoding::Utf8);
        assert_eq!(detect_encoding(&utf16le(text)), Encoding::Utf16Le);
        assert_eq!(detect_encoding(&utf16be(text)), Encoding::Utf16Be);
        assert_eq!(detect_encoding(&utf32le(text)), Encoding::Utf32Le);
        assert_eq!(detect_encoding(&utf32be(text)), Encoding::Utf32Be);
    }

    #[test]
    fn detects_short_inputs() {
        assert_eq!(detect_encoding(b"1"), Encoding::Utf8);
        assert_eq!(detect_encoding(&utf16le("1")), Encoding::Utf16Le);
        assert_eq!(detect_encoding(&utf16be("1")), Encoding::Utf16Be);
        assert_eq!(detect_encoding(b""), Encoding::Utf8);
    }

    #[test]
    fn every_encoding_normalizes_to_the_same_text() {
        let text = "[\"caf\u{e9}\", \"\u{1F600}\"]";
        let expected = r#"["caf\u00e9", "\ud83d\ude00"]"#;
        for bytes in [
            text.as_bytes().to_vec(),
            utf16le(text),
            utf16be(text),
            utf32le(text),
            utf32be(text),
        ] {
            assert_eq!(normalize_bytes(&bytes).unwrap(), expected);
        }
    }

    #[test]
    fn byte_order_marks_are_dropped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"[1]");
        assert_eq!(normalize_bytes(&bytes).unwrap(), "[1]");

        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(utf16le("[1]"));
        assert_eq!(normalize_bytes(&bytes).unwrap(), "[1]");
    }

    #[test]
    fn whitespace_controls_pass_through() {
        let text = "\t\n\r\u{8}\u{b}\u{c}";
        assert_eq!(normalize_str(text).unwrap(), text);
        assert_eq!(normalize_str("\u{0}\u{7f}").unwrap(), r"\u0000\u007f");
    }

    #[test]
    fn canonical_text_is_borrowed() {
        let canonical = r#"{"k": "\u00e9\t"}"#;
        assert!(matches!(normalize_str(canonical), Ok(Cow::Borrowed(_))));
        let once = normalize_str("h\u{e9}llo").unwrap().into_owned();
        assert_eq!(normalize_str(&once).unwrap(), once);
    }

    #[test]
    fn backslash_before_escaped_character_is_refused() {
        assert_eq!(
            normalize_str("\"a\\\u{e9}\""),
            Err(JsonError::MalformedEscape {
                text: "\\\u{e9}".to_string(),
                span: Span::new(2, 9),
            })
        );
        assert!(matches!(
            normalize_str("\\\\\\\u{1F600}"),
            Err(JsonError::MalformedEscape { span, .. }) if span == Span::new(2, 15)
        ));
        assert_eq!(normalize_str("\\\\\u{e9}").unwrap(), r"\\\u00e9");
        assert_eq!(normalize_str("\\n\u{e9}").unwrap(), r"\n\u00e9");

        // The run of backslashes carries across code units in the wider encodings.
        assert!(matches!(
            normalize_bytes(&utf16le("[\"\\\u{e9}\"]")),
            Err(JsonError::MalformedEscape { .. })
        ));
        assert!(matches!(
            normalize_bytes(&utf32be("\"\\\u{e9}\"")),
            Err(JsonError::MalformedEscape { .. })
        ));
        assert!(matches!(
            normalize_bytes("\"\\\u{e9}\"".as_bytes()),
            Err(JsonError::MalformedEscape { .. })
        ));
    }

    #[test]
    fn invalid_input_is_an_encoding_error() {
        assert_eq!(
            normalize_bytes(b"[\"\xff\"]"),
            Err(JsonError::Encoding {
                encoding: Encoding::Utf8,
                offset: 2,
                reason: "invalid UTF-8 sequence",
            })
        );

        // A byte-order mark, then a lone high surrogate followed by an ASCII character.
        let bytes = [0xFF, 0xFE, 0x3D, 0xD8, 0x41, 0x00];
        assert!(matches!(
            normalize_bytes(&bytes),
            Err(JsonError::Encoding {
                encoding: Encoding::Utf16Le,
                offset: 2,
                ..
            })
        ));

        let mut bytes = utf32le("[1]");
        bytes.extend_from_slice(&[0x00, 0x00, 0x11, 0x00]);
        assert!(matches!(
            normalize_bytes(&bytes),
            Err(JsonError::Encoding {
                encoding: Encoding::Utf32Le,
                offset: 12,
                ..
            })
        ));
    }
}
