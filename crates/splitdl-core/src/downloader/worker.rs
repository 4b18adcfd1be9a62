//! One worker per segment: a single ranged GET streamed into a part file,
//! reported to the coordinator exactly once.

use std::sync::Arc;

use crate::notify::Notification;
use crate::scheduler::JobShared;
use crate::segmenter::{ByteRange, Segment, SegmentId, SegmentStatus};
use crate::storage::PartFile;

use super::sink::SegmentSink;
use super::SegmentError;

type FetchResult = Result<PartFile, (SegmentError, Option<PartFile>)>;

/// Downloads `segment` and reports the outcome on the job's event queue.
/// Blocks; run it on the blocking pool.
pub(crate) fn run_segment(shared: Arc<JobShared>, id: SegmentId, segment: Arc<Segment>) {
    let mut report = Report {
        shared: &shared,
        id,
        segment: &segment,
        sent: false,
    };
    let requested = segment.range();
    tracing::debug!(range = %requested, "segment worker started");

    let notification = match fetch(&shared, &segment, requested) {
        Ok(part) => succeed(&segment, part),
        Err((err, part)) => fail(&shared, id, &segment, err, part),
    };
    report.send(notification);
}

fn fetch(shared: &JobShared, segment: &Segment, requested: ByteRange) -> FetchResult {
    let mut sink = SegmentSink::new(segment, requested, &shared.temp_dir, &shared.file_stem);
    let result = shared
        .transport
        .fetch_range(&shared.url, requested, &mut sink);
    let (part, error, complete) = sink.into_parts();

    match (part, error) {
        (Some(part), _) if complete => Ok(part),
        (part, Some(err)) => Err((err, part)),
        (part, None) => match result {
            Err(e) => Err((SegmentError::Transport(e), part)),
            // End of stream: a short body still counts if it carried anything.
            Ok(()) => match part {
                Some(part) if segment.bytes_written() > 0 => Ok(part),
                part => Err((SegmentError::EmptyBody, part)),
            },
        },
    }
}

fn succeed(segment: &Segment, part: PartFile) -> Notification {
    segment.attach_part(part);
    let range = segment.finish(SegmentStatus::Succeeded);
    tracing::debug!(%range, "segment finished");
    Notification::success(format!("Segment {} completed.", range))
}

fn fail(
    shared: &JobShared,
    id: SegmentId,
    segment: &Segment,
    err: SegmentError,
    part: Option<PartFile>,
) -> Notification {
    let written = segment.bytes_written();
    let kept = match part {
        Some(mut part) if written > 0 => match part.truncate(written) {
            Ok(()) => Some(part),
            Err(e) => {
                tracing::warn!(path = %part.path().display(), "failed to trim part file: {}", e);
                None
            }
        },
        other => {
            discard(other);
            None
        }
    };

    match kept {
        Some(part) => {
            segment.attach_part(part);
            let range = segment.finish(SegmentStatus::Failed);
            tracing::warn!(%range, written, "segment failed, keeping written bytes: {}", err);
            Notification::abort(format!(
                "Segment {} failed after {} bytes: {}",
                range, written, err
            ))
        }
        None => {
            let range = segment.range();
            forget(shared, id, segment);
            tracing::warn!(%range, "segment failed: {}", err);
            Notification::abort(format!("Segment {} failed: {}", range, err))
        }
    }
}

/// Drops the segment from the list so its range reads as a gap.
fn forget(shared: &JobShared, id: SegmentId, segment: &Segment) {
    let mut tracker = shared.tracker();
    segment.mark_failed();
    tracker.list.remove(id);
}

fn discard(part: Option<PartFile>) {
    if let Some(part) = part {
        let path = part.path().to_path_buf();
        if let Err(e) = part.discard() {
            tracing::warn!("failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Guarantees the one terminal report even if the worker unwinds.
struct Report<'a> {
    shared: &'a JobShared,
    id: SegmentId,
    segment: &'a Segment,
    sent: bool,
}

impl Report<'_> {
    fn send(&mut self, notification: Notification) {
        self.sent = true;
        self.shared.report(notification);
    }
}

impl Drop for Report<'_> {
    fn drop(&mut self) {
        if self.sent {
            return;
        }
        let range = self.segment.range();
        forget(self.shared, self.id, self.segment);
        tracing::error!(%range, "segment worker panicked");
        self.shared
            .report(Notification::abort(format!("Segment {} worker panicked.", range)));
    }
}
