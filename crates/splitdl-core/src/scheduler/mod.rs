//! Download coordinator.
//!
//! Drives one job through probe → initial partition → worker reports →
//! merge. After every worker report the rebalancer gets one chance to fill a
//! coverage gap or split a straggling segment, so idle capacity keeps being
//! put back to work until the whole file is on disk.

mod job;
mod merge;
mod progress;
mod rebalance;
mod shared;

pub use job::{run_download, DownloadReport, JobError, JobOptions};
pub use merge::MergeError;
pub use progress::ProgressStats;
pub use rebalance::Rebalance;
pub(crate) use shared::JobShared;
