//! Segment download error type.

use crate::segmenter::ByteRange;
use crate::transport::TransportError;

/// Why a single segment worker gave up. Always contained to that segment:
/// the coordinator refills the uncovered range.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Anything other than `206 Partial Content`.
    #[error("HTTP {0} instead of 206 Partial Content")]
    Status(u32),
    #[error("missing or malformed Content-Range")]
    ContentRange,
    #[error("server sent bytes {got}, requested {requested}")]
    RangeMismatch { requested: ByteRange, got: ByteRange },
    #[error("server declared size {got:?}, requested {requested} bytes")]
    SizeMismatch { requested: u64, got: Option<u64> },
    /// Stream ended before a single byte arrived.
    #[error("empty response body")]
    EmptyBody,
    /// Part file could not be created or written (disk full, permissions).
    #[error("part file: {0}")]
    Io(#[from] std::io::Error),
}
