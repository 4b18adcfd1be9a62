//! Keeps the file covered: after every worker report, fill one gap or split
//! one straggler.

use std::sync::Arc;

use crate::segmenter::{ByteRange, Segment, SegmentId, SegmentList, SegmentState, SegmentStatus};

use super::shared::Tracker;

/// A running segment is worth splitting while more than `1 / STRAGGLER_DIVISOR`
/// of the file (5%) is still ahead of it.
const STRAGGLER_DIVISOR: u64 = 20;

/// The donor keeps `bytes_written * SPLIT_LEAD_NUM / SPLIT_LEAD_DEN` bytes,
/// a 10% lead over what it already has.
const SPLIT_LEAD_NUM: u64 = 11;
const SPLIT_LEAD_DEN: u64 = 10;

/// The one corrective action a pass took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebalance {
    /// The list was empty: restart the whole file.
    Restart(ByteRange),
    /// Bytes before the first segment or after a finished one were uncovered.
    FillGap(ByteRange),
    /// The running segment at `donor` now ends at `new.begin - 1`.
    Split { donor: u64, new: ByteRange },
}

impl Rebalance {
    /// Range handed to the new worker.
    pub fn range(&self) -> ByteRange {
        match *self {
            Rebalance::Restart(r) | Rebalance::FillGap(r) => r,
            Rebalance::Split { new, .. } => new,
        }
    }
}

/// Action taken plus the segment the caller must start a worker for.
pub(crate) struct Started {
    pub(crate) action: Rebalance,
    pub(crate) id: SegmentId,
    pub(crate) segment: Arc<Segment>,
}

/// Scans the list once and performs at most one action. Call with the
/// structural lock held.
pub(crate) fn rebalance(tracker: &mut Tracker, total_size: u64) -> Option<Started> {
    let action = choose(&tracker.list, total_size)?;
    let (id, segment) = tracker.start(action.range());
    match action {
        Rebalance::Split { donor, new } => {
            tracing::debug!(donor, new = %new, "split straggler")
        }
        _ => tracing::debug!(range = %action.range(), "filling gap"),
    }
    Some(Started {
        action,
        id,
        segment,
    })
}

/// Picks the action. A split shrinks the donor here, under its own lock, so
/// the split point is computed from the same `bytes_written` it is applied to.
fn choose(list: &SegmentList, total_size: u64) -> Option<Rebalance> {
    if total_size == 0 {
        return None;
    }
    let Some(first) = list.front() else {
        return Some(Rebalance::Restart(ByteRange::new(0, total_size - 1)));
    };
    let first_begin = list.get(first)?.begin();
    if first_begin > 0 {
        return Some(Rebalance::FillGap(ByteRange::new(0, first_begin - 1)));
    }

    for (id, segment) in list.iter() {
        // First byte owned by whatever comes next.
        let boundary = list
            .next(id)
            .and_then(|n| list.get(n))
            .map(|n| n.begin())
            .unwrap_or(total_size);
        let mut st = segment.lock();
        match st.status {
            SegmentStatus::Succeeded | SegmentStatus::Failed => {
                if st.end + 1 < boundary {
                    return Some(Rebalance::FillGap(ByteRange::new(st.end + 1, boundary - 1)));
                }
            }
            SegmentStatus::Running => {
                if let Some(split) = split_point(segment.begin(), &st, total_size) {
                    st.end = split - 1;
                    return Some(Rebalance::Split {
                        donor: segment.begin(),
                        new: ByteRange::new(split, boundary - 1),
                    });
                }
            }
        }
    }
    None
}

fn split_point(begin: u64, st: &SegmentState, total_size: u64) -> Option<u64> {
    if st.bytes_written == 0 {
        return None;
    }
    let assigned = st.end + 1 - begin;
    let remaining = assigned.saturating_sub(st.bytes_written);
    if remaining.saturating_mul(STRAGGLER_DIVISOR) <= total_size {
        return None;
    }
    let split = begin + st.bytes_written.saturating_mul(SPLIT_LEAD_NUM) / SPLIT_LEAD_DEN;
    (split <= st.end).then_some(split)
}
