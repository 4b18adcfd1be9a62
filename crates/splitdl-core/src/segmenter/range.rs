//! Byte range type and initial segment planning.

/// An inclusive byte range `[begin, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// First byte (inclusive).
    pub begin: u64,
    /// Last byte (inclusive).
    pub end: u64,
}

impl ByteRange {
    pub fn new(begin: u64, end: u64) -> Self {
        debug_assert!(begin <= end, "empty range {}-{}", begin, end);
        Self { begin, end }
    }

    /// Length in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.begin + 1
    }

    /// Range in the form libcurl expects (`begin-end`, no unit).
    pub fn curl_range(&self) -> String {
        format!("{}-{}", self.begin, self.end)
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.begin, self.end)
    }
}

/// Splits `[0, total_size-1]` into at most `max_workers` consecutive ranges.
///
/// Every range has `ceil(total_size / max_workers)` bytes except possibly the
/// last, which is clipped to `total_size - 1`. Returns an empty vec if
/// `total_size` is 0 or `max_workers` is 0.
pub fn plan_segments(total_size: u64, max_workers: usize) -> Vec<ByteRange> {
    if total_size == 0 || max_workers == 0 {
        return Vec::new();
    }

    let step = total_size.div_ceil(max_workers as u64).max(1);
    let mut out = Vec::with_capacity(max_workers);
    let mut begin = 0u64;
    while begin < total_size {
        let end = (begin + step - 1).min(total_size - 1);
        out.push(ByteRange::new(begin, end));
        begin = end + 1;
    }
    out
}
