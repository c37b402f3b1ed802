use std::ops::Range;

/// A [`Span`] represents a contiguous region of the normalized input. It is used to correspond a
/// token or an error to its source. An invariant to be maintained is that `lo <= hi`. It is
/// typically the case that your code has logic bugs if this invariant is violated.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub lo: usize,
    pub hi: usize,
}

impl Span {
    /// Construct a new span. Will panic if `lo > hi`. Prefer this constructor to construct a new
    /// [`Span`] over using direct struct initialization.
    pub const fn new(lo: usize, hi: usize) -> Self {
        assert!(lo <= hi, "`lo` must not be larger than `hi`");
        Span { lo, hi }
    }

    /// An empty span sitting at `at`, used for end-of-input diagnostics.
    pub const fn point(at: usize) -> Self {
        Span { lo: at, hi: at }
    }

    pub const fn len(&self) -> usize {
        self.hi - self.lo
    }

    pub const fn is_empty(&self) -> bool {
        self.lo == self.hi
    }

    pub fn into_range(self) -> Range<usize> {
        self.lo..self.hi
    }
}
