//! A tracked segment: immutable start offset, lock-guarded progress.

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::storage::PartFile;

use super::ByteRange;

/// Lifecycle of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    Running,
    Succeeded,
    Failed,
}

/// Mutable part of a segment, guarded by the segment's own lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentState {
    /// Last byte (inclusive). Only ever shrinks.
    pub end: u64,
    pub status: SegmentStatus,
    /// Bytes persisted to the part file. Never decreases.
    pub bytes_written: u64,
}

/// Point-in-time copy of a segment, for scans and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSnapshot {
    pub range: ByteRange,
    pub status: SegmentStatus,
    pub bytes_written: u64,
}

/// Result of appending one body chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Bytes of the chunk actually persisted (clipped to the segment end).
    pub written: usize,
    /// The segment now holds all of its bytes.
    pub complete: bool,
}

/// One contiguous byte range assigned to at most one worker.
#[derive(Debug)]
pub struct Segment {
    begin: u64,
    state: Mutex<SegmentState>,
    part: Mutex<Option<PartFile>>,
}

impl Segment {
    /// New running segment with nothing written.
    pub fn new(range: ByteRange) -> Self {
        Self::with_state(
            range.begin,
            SegmentState {
                end: range.end,
                status: SegmentStatus::Running,
                bytes_written: 0,
            },
        )
    }

    pub fn with_state(begin: u64, state: SegmentState) -> Self {
        Self {
            begin,
            state: Mutex::new(state),
            part: Mutex::new(None),
        }
    }

    pub fn begin(&self) -> u64 {
        self.begin
    }

    /// Lock the mutable state (end, status, bytes written).
    pub fn lock(&self) -> MutexGuard<'_, SegmentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SegmentSnapshot {
        let st = self.lock();
        SegmentSnapshot {
            range: ByteRange {
                begin: self.begin,
                end: st.end,
            },
            status: st.status,
            bytes_written: st.bytes_written,
        }
    }

    pub fn range(&self) -> ByteRange {
        self.snapshot().range
    }

    pub fn status(&self) -> SegmentStatus {
        self.lock().status
    }

    pub fn bytes_written(&self) -> u64 {
        self.lock().bytes_written
    }

    /// Appends `data` to `part`, clipped to what still fits below the current
    /// `end`. Holds the segment lock across the write so a concurrent shrink
    /// can never leave bytes past the new end in the part file.
    pub fn write_chunk(&self, part: &mut PartFile, data: &[u8]) -> io::Result<ChunkOutcome> {
        let mut st = self.lock();
        let assigned = st.end + 1 - self.begin;
        let room = assigned.saturating_sub(st.bytes_written);
        let take = (data.len() as u64).min(room) as usize;
        if take > 0 {
            part.append(&data[..take])?;
            st.bytes_written += take as u64;
        }
        Ok(ChunkOutcome {
            written: take,
            complete: st.bytes_written >= assigned,
        })
    }

    /// Marks the segment terminal. When fewer bytes than assigned were
    /// written, `end` is trimmed so the segment covers exactly what is on
    /// disk. Must not be called with zero bytes written.
    pub fn finish(&self, status: SegmentStatus) -> ByteRange {
        let mut st = self.lock();
        debug_assert!(st.bytes_written > 0, "finish() on an empty segment");
        let written_end = self.begin + st.bytes_written.max(1) - 1;
        if written_end < st.end {
            st.end = written_end;
        }
        st.status = status;
        ByteRange {
            begin: self.begin,
            end: st.end,
        }
    }

    /// Marks the segment failed without touching its range.
    pub fn mark_failed(&self) {
        self.lock().status = SegmentStatus::Failed;
    }

    /// Hand the finished part file to the segment for the merge.
    pub fn attach_part(&self, part: PartFile) {
        *self.part.lock().unwrap_or_else(PoisonError::into_inner) = Some(part);
    }

    pub fn take_part(&self) -> Option<PartFile> {
        self.part.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}
