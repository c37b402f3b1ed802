use chumsky::span::SimpleSpan;
use jsontree::Span;

/// A parsed fragment of path text and where it came from.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Spanned<T> {
    pub span: SimpleSpan<usize>,
    pub val: T,
}

impl<T> Spanned<T> {
    pub fn new(val: T, span: SimpleSpan<usize>) -> Self {
        Spanned { span, val }
    }

    pub fn to_span(&self) -> Span {
        Span::new(self.span.start, self.span.end)
    }
}
