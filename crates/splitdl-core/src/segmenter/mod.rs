//! Range math and segment bookkeeping.
//!
//! Splits a download into its initial segments, tracks each segment's
//! progress behind its own lock, and keeps all segments in an ordered list
//! that the coordinator mutates under its structural lock.

mod list;
mod range;
mod segment;

pub use list::{Iter, SegmentId, SegmentList};
pub use range::{plan_segments, ByteRange};
pub use segment::{ChunkOutcome, Segment, SegmentSnapshot, SegmentState, SegmentStatus};
