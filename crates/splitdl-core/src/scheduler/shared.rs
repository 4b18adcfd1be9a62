//! State shared by the coordinator and its workers for one job.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::downloader;
use crate::notify::Notification;
use crate::segmenter::{ByteRange, Segment, SegmentId, SegmentList};
use crate::transport::Transport;

/// Everything behind the structural lock: the segment list and the number
/// of workers whose terminal report has not been drained yet.
#[derive(Debug, Default)]
pub(crate) struct Tracker {
    pub(crate) list: SegmentList,
    pub(crate) running: usize,
    /// Workers started over the whole job.
    pub(crate) spawned: usize,
}

impl Tracker {
    /// Inserts a new running segment for `range` and counts its worker.
    /// The caller must start that worker.
    pub(crate) fn start(&mut self, range: ByteRange) -> (SegmentId, Arc<Segment>) {
        let segment = Arc::new(Segment::new(range));
        let id = self.list.insert_sorted(Arc::clone(&segment));
        self.running += 1;
        self.spawned += 1;
        (id, segment)
    }
}

pub(crate) struct JobShared {
    pub(crate) url: String,
    pub(crate) temp_dir: PathBuf,
    /// Prefix for part file names.
    pub(crate) file_stem: String,
    pub(crate) transport: Arc<dyn Transport>,
    events: mpsc::Sender<Notification>,
    tracker: Mutex<Tracker>,
}

impl JobShared {
    pub(crate) fn new(
        url: String,
        temp_dir: PathBuf,
        file_stem: String,
        transport: Arc<dyn Transport>,
        events: mpsc::Sender<Notification>,
    ) -> Self {
        Self {
            url,
            temp_dir,
            file_stem,
            transport,
            events,
            tracker: Mutex::new(Tracker::default()),
        }
    }

    /// Take the structural lock.
    pub(crate) fn tracker(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Worker side of the event queue. Blocks while the queue is full.
    pub(crate) fn report(&self, notification: Notification) {
        if self.events.blocking_send(notification).is_err() {
            tracing::warn!("coordinator gone, dropping segment report");
        }
    }

    /// Start a worker for a segment already registered with [`Tracker::start`].
    /// Must be called from within the tokio runtime.
    pub(crate) fn spawn_worker(self: &Arc<Self>, id: SegmentId, segment: Arc<Segment>) {
        let shared = Arc::clone(self);
        let _ = tokio::task::spawn_blocking(move || downloader::run_segment(shared, id, segment));
    }
}
