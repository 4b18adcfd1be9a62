//! Progress line for coordinator sitreps: bytes on disk, segment counts,
//! aggregate rate and ETA.

use std::fmt;
use std::time::Instant;

use crate::segmenter::{SegmentList, SegmentStatus};

/// Snapshot of download progress for one job (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Bytes on disk across all tracked segments.
    pub bytes_done: u64,
    /// Total file size in bytes.
    pub total_bytes: u64,
    /// Elapsed time since download start (seconds).
    pub elapsed_secs: f64,
    /// Segments that finished successfully.
    pub segments_done: usize,
    /// Segments currently tracked.
    pub segment_count: usize,
    /// Workers still expected to report.
    pub running: usize,
}

impl ProgressStats {
    /// Summarize `list`. Call with the structural lock held.
    pub fn collect(list: &SegmentList, total_bytes: u64, running: usize, started: Instant) -> Self {
        let mut bytes_done = 0u64;
        let mut segments_done = 0usize;
        for (_, segment) in list.iter() {
            let snap = segment.snapshot();
            bytes_done += snap.bytes_written;
            if snap.status == SegmentStatus::Succeeded {
                segments_done += 1;
            }
        }
        Self {
            bytes_done: bytes_done.min(total_bytes),
            total_bytes,
            elapsed_secs: started.elapsed().as_secs_f64(),
            segments_done,
            segment_count: list.len(),
            running,
        }
    }

    /// Total download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0 or already done).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }
}

impl fmt::Display for ProgressStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} bytes ({:.1}%), {}/{} segments done, {} running, {:.0} B/s",
            self.bytes_done,
            self.total_bytes,
            self.fraction() * 100.0,
            self.segments_done,
            self.segment_count,
            self.running,
            self.bytes_per_sec()
        )?;
        match self.eta_secs() {
            Some(eta) => write!(f, ", ETA {:.0}s", eta),
            None => f.write_str(", ETA unknown"),
        }
    }
}
