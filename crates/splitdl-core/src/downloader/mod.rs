//! Segment workers.
//!
//! Each worker issues one HTTP Range GET for its segment through the job's
//! [`Transport`](crate::transport::Transport), validates `206` and
//! `Content-Range` before touching disk, and streams the body into a private
//! part file. Writes are clipped to the segment's current end, so a worker
//! whose segment was shrunk by a split simply finishes early.

mod error;
mod sink;
mod worker;

pub use error::SegmentError;
pub(crate) use worker::run_segment;
