//! Rendering a [`Value`] back to JSON text.

use std::fmt::{self, Write as _};
use std::ops::BitOr;

use crate::Value;

/// Independent formatting switches. The default prints compact JSON with raw UTF-8.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PrintOptions {
    /// Escape everything outside printable ASCII as `\uXXXX`.
    pub ascii_only: bool,
    /// A space after `,` and `:` unless a line break follows.
    pub readable_spacing: bool,
    /// A line break after each comma between array elements.
    pub array_line_breaks: bool,
    /// A line break after each comma between object members.
    pub object_line_breaks: bool,
    /// A line break after the opening bracket and before the closing one of non-empty containers.
    pub leading_line_break: bool,
    /// A line break between an object key and its value.
    pub line_break_after_key: bool,
    /// Spaces of indentation per nesting level after a line break.
    pub indent: usize,
}

impl PrintOptions {
    /// Every line-breaking flag on, two-space indentation.
    pub fn pretty() -> Self {
        PrintOptions {
            readable_spacing: true,
            array_line_breaks: true,
            object_line_breaks: true,
            leading_line_break: true,
            indent: 2,
            ..Default::default()
        }
    }

    pub fn set(mut self, format: Format) -> Self {
        match format {
            Format::AsciiOnly => self.ascii_only = true,
            Format::ReadableSpacing => self.readable_spacing = true,
            Format::ArrayLineBreaks => self.array_line_breaks = true,
            Format::ObjectLineBreaks => self.object_line_breaks = true,
            Format::LeadingLineBreak => self.leading_line_break = true,
            Format::LineBreakAfterKey => self.line_break_after_key = true,
        }
        self
    }
}

/// Single formatting flags that compose with `|`:
/// `Format::AsciiOnly | Format::ReadableSpacing` is a [`PrintOptions`] with both set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Format {
    AsciiOnly,
    ReadableSpacing,
    ArrayLineBreaks,
    ObjectLineBreaks,
    LeadingLineBreak,
    LineBreakAfterKey,
}

impl From<Format> for PrintOptions {
    fn from(format: Format) -> Self {
        PrintOptions::default().set(format)
    }
}

impl BitOr for Format {
    type Output = PrintOptions;

    fn bitor(self, rhs: Format) -> PrintOptions {
        PrintOptions::from(self).set(rhs)
    }
}

impl BitOr<Format> for PrintOptions {
    type Output = PrintOptions;

    fn bitor(self, rhs: Format) -> PrintOptions {
        self.set(rhs)
    }
}

/// A [`Value`] paired with formatting options, see [`Value::display`].
pub struct Display<'v> {
    value: &'v Value,
    options: PrintOptions,
}

impl Value {
    pub fn display(&self, options: impl Into<PrintOptions>) -> Display<'_> {
        Display {
            value: self,
            options: options.into(),
        }
    }
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer {
            out: f,
            options: &self.options,
        }
        .value(self.value, 0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display(PrintOptions::default()), f)
    }
}

struct Printer<'f, 'o, 'b> {
    out: &'f mut fmt::Formatter<'b>,
    options: &'o PrintOptions,
}

impl Printer<'_, '_, '_> {
    fn value(&mut self, value: &Value, depth: usize) -> fmt::Result {
        match value {
            Value::String(s) => self.string(s),
            Value::Number(n) if n.is_finite() => write!(self.out, "{n}"),
            // JSON has no spelling for NaN or the infinities.
            Value::Number(_) | Value::Null => self.out.write_str("null"),
            Value::Bool(b) => write!(self.out, "{b}"),
            Value::Array(elements) => {
                let line_breaks = self.options.array_line_breaks;
                self.container('[', ']', elements.len(), depth, |p| {
                    for (i, element) in elements.iter().enumerate() {
                        if i > 0 {
                            p.separator(',', line_breaks, depth + 1)?;
                        }
                        p.value(element, depth + 1)?;
                    }
                    Ok(())
                })
            }
            Value::Object(members) => {
                let line_breaks = self.options.object_line_breaks;
                let after_key = self.options.line_break_after_key;
                self.container('{', '}', members.len(), depth, |p| {
                    for (i, (key, member)) in members.iter().enumerate() {
                        if i > 0 {
                            p.separator(',', line_breaks, depth + 1)?;
                        }
                        p.string(key)?;
                        p.separator(':', after_key, depth + 1)?;
                        p.value(member, depth + 1)?;
                    }
                    Ok(())
                })
            }
        }
    }

    fn container(
        &mut self,
        open: char,
        close: char,
        len: usize,
        depth: usize,
        body: impl FnOnce(&mut Self) -> fmt::Result,
    ) -> fmt::Result {
        self.out.write_char(open)?;
        if len == 0 {
            return self.out.write_char(close);
        }
        if self.options.leading_line_break {
            self.newline(depth + 1)?;
        }
        body(self)?;
        if self.options.leading_line_break {
            self.newline(depth)?;
        }
        self.out.write_char(close)
    }

    fn separator(&mut self, sep: char, line_break: bool, depth: usize) -> fmt::Result {
        self.out.write_char(sep)?;
        if line_break {
            self.newline(depth)
        } else if self.options.readable_spacing {
            self.out.write_char(' ')
        } else {
            Ok(())
        }
    }

    fn newline(&mut self, depth: usize) -> fmt::Result {
        self.out.write_char('\n')?;
        for _ in 0..depth * self.options.indent {
            self.out.write_char(' ')?;
        }
        Ok(())
    }

    fn string(&mut self, s: &str) -> fmt::Result {
        self.out.write_char('"')?;
        for c in s.chars() {
            match c {
                '"' => self.out.write_str("\\\"")?,
                '\\' => self.out.write_str("\\\\")?,
                '\n' => self.out.write_str("\\n")?,
                '\r' => self.out.write_str("\\r")?,
                '\t' => self.out.write_str("\\t")?,
                '\u{8}' => self.out.write_str("\\b")?,
                '\u{c}' => self.out.write_str("\\f")?,
                c if c < ' ' || c == '\u{7f}' || (self.options.ascii_only && !c.is_ascii()) => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        write!(self.out, "\\u{unit:04x}")?;
                    }
                }
                c => self.out.write_char(c)?,
            }
        }
        self.out.write_char('"')
    }
}
