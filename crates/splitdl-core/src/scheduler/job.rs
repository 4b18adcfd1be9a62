//! The control loop for one download: probe, partition, drain worker
//! reports, rebalance after each, merge once every worker has reported.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::config::SplitdlConfig;
use crate::notify::Notification;
use crate::probe::{self, ProbeError};
use crate::segmenter::{plan_segments, Segment};
use crate::transport::Transport;

use super::merge::{self, MergeError};
use super::progress::ProgressStats;
use super::rebalance::rebalance;
use super::shared::JobShared;

/// Per-job settings.
#[derive(Debug, Clone)]
pub struct JobOptions {
    /// Size of the initial partition. Rebalancing may exceed it.
    pub max_workers: usize,
    pub output_dir: PathBuf,
    /// Where part files live until the merge.
    pub temp_dir: PathBuf,
    /// Segment aborts tolerated before no new workers are started.
    /// `None` retries forever.
    pub max_segment_failures: Option<u32>,
}

impl JobOptions {
    pub fn from_config(cfg: &SplitdlConfig, output_dir: PathBuf) -> Self {
        Self {
            max_workers: cfg.max_workers,
            output_dir,
            temp_dir: cfg.temp_dir(),
            max_segment_failures: cfg.max_segment_failures,
        }
    }
}

/// Outcome of a finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub total_size: u64,
    /// Segments concatenated into the output.
    pub segments: usize,
    pub workers_spawned: usize,
    pub segment_failures: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("max workers must be at least 1")]
    NoWorkers,
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("giving up after {0} segment failures")]
    TooManyFailures(u32),
    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),
    #[error("{0} task failed: {1}")]
    Task(&'static str, #[source] tokio::task::JoinError),
}

/// Downloads `url` into `opts.output_dir`.
///
/// Status lines go to `notify` as [`Progress`](crate::notify::NotificationKind::Progress);
/// the last notification is a single `Success` naming the output file or a
/// single `Abort` with the reason. The same outcome is returned.
pub async fn run_download(
    url: &str,
    opts: &JobOptions,
    transport: Arc<dyn Transport>,
    notify: mpsc::Sender<Notification>,
) -> Result<DownloadReport, JobError> {
    let result = drive(url, opts, transport, &notify).await;
    let last = match &result {
        Ok(report) => {
            tracing::info!(url, path = %report.path.display(), "download complete");
            Notification::success(format!("Download complete: {}", report.path.display()))
        }
        Err(e) => {
            tracing::error!(url, "download aborted: {}", e);
            Notification::abort(format!("Download aborted: {}", e))
        }
    };
    let _ = notify.send(last).await;
    result
}

async fn sitrep(notify: &mpsc::Sender<Notification>, message: String) {
    let _ = notify.send(Notification::progress(message)).await;
}

async fn drive(
    url: &str,
    opts: &JobOptions,
    transport: Arc<dyn Transport>,
    notify: &mpsc::Sender<Notification>,
) -> Result<DownloadReport, JobError> {
    if opts.max_workers == 0 {
        return Err(JobError::NoWorkers);
    }

    let head = tokio::task::spawn_blocking({
        let transport = Arc::clone(&transport);
        let url = url.to_string();
        move || probe::probe(transport.as_ref(), &url)
    })
    .await
    .map_err(|e| JobError::Task("probe", e))??;

    let final_path = opts.output_dir.join(&head.file_name);
    sitrep(
        notify,
        format!(
            "{} is {} bytes, starting {} workers.",
            head.file_name, head.total_size, opts.max_workers
        ),
    )
    .await;

    let (tx, mut rx) = mpsc::channel(opts.max_workers);
    let shared = Arc::new(JobShared::new(
        url.to_string(),
        opts.temp_dir.clone(),
        head.file_name.clone(),
        transport,
        tx,
    ));

    let result = download(&shared, opts, head.total_size, &final_path, &mut rx, notify).await;
    if result.is_err() {
        let leftovers = shared.tracker().list.drain();
        merge::discard_parts(&leftovers);
    }
    result
}

async fn download(
    shared: &Arc<JobShared>,
    opts: &JobOptions,
    total_size: u64,
    final_path: &Path,
    rx: &mut mpsc::Receiver<Notification>,
    notify: &mpsc::Sender<Notification>,
) -> Result<DownloadReport, JobError> {
    let started = Instant::now();
    let initial: Vec<_> = {
        let mut tracker = shared.tracker();
        let initial = plan_segments(total_size, opts.max_workers)
            .into_iter()
            .map(|range| tracker.start(range))
            .collect();
        initial
    };
    for (id, segment) in initial {
        shared.spawn_worker(id, segment);
    }

    let mut failures = 0u32;
    let mut exhausted = false;
    loop {
        if shared.tracker().running == 0 {
            break;
        }
        // The job holds a sender, so the queue never closes under us.
        let Some(event) = rx.recv().await else {
            break;
        };

        let stats = {
            let mut tracker = shared.tracker();
            tracker.running -= 1;
            if event.is_abort() {
                failures += 1;
                if opts.max_segment_failures.is_some_and(|max| failures > max) && !exhausted {
                    tracing::warn!(failures, "segment failure limit reached, no new workers");
                    exhausted = true;
                }
            }
            let stats = ProgressStats::collect(&tracker.list, total_size, tracker.running, started);
            stats
        };
        // Report first, then rebalance against the list as it is now.
        sitrep(notify, format!("{} {}", event.message, stats)).await;
        if exhausted {
            continue;
        }
        let next = rebalance(&mut shared.tracker(), total_size);
        if let Some(fresh) = next {
            shared.spawn_worker(fresh.id, fresh.segment);
        }
    }

    let (segments, workers_spawned): (Vec<Arc<Segment>>, usize) = {
        let tracker = shared.tracker();
        let segments = tracker.list.iter().map(|(_, s)| Arc::clone(s)).collect();
        (segments, tracker.spawned)
    };

    if exhausted {
        let snapshots: Vec<_> = segments.iter().map(|s| s.snapshot()).collect();
        if merge::verify_coverage(&snapshots, total_size).is_err() {
            return Err(JobError::TooManyFailures(failures));
        }
    }

    sitrep(notify, format!("Merging {} segments.", segments.len())).await;
    let count = segments.len();
    let path = tokio::task::spawn_blocking({
        let final_path = final_path.to_path_buf();
        move || merge::merge_segments(&segments, total_size, &final_path)
    })
    .await
    .map_err(|e| JobError::Task("merge", e))??;
    shared.tracker().list.drain();

    Ok(DownloadReport {
        path,
        total_size,
        segments: count,
        workers_spawned,
        segment_failures: failures,
    })
}
