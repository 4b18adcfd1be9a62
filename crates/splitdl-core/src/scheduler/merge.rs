//! Final assembly: verify coverage, append the part files in offset order,
//! rename into place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::segmenter::{ByteRange, Segment, SegmentSnapshot, SegmentStatus};
use crate::storage::OutputWriter;

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("no finished segment covers byte {0}")]
    Gap(u64),
    #[error("segments overlap at byte {0}")]
    Overlap(u64),
    #[error("segment {0} is still running")]
    Unfinished(ByteRange),
    #[error("segment {0} has no part file")]
    MissingPart(ByteRange),
    #[error("part file for segment {range} holds {got} bytes")]
    PartLength { range: ByteRange, got: u64 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Checks that `snapshots` (in list order) tile `[0, total_size-1]` exactly
/// and that none is still running.
pub(crate) fn verify_coverage(snapshots: &[SegmentSnapshot], total_size: u64) -> Result<(), MergeError> {
    let mut expected = 0u64;
    for snap in snapshots {
        if snap.status == SegmentStatus::Running {
            return Err(MergeError::Unfinished(snap.range));
        }
        if snap.range.begin > expected {
            return Err(MergeError::Gap(expected));
        }
        if snap.range.begin < expected {
            return Err(MergeError::Overlap(snap.range.begin));
        }
        expected = snap.range.end + 1;
    }
    if expected != total_size {
        return Err(MergeError::Gap(expected));
    }
    Ok(())
}

/// Concatenates every segment's part file into `final_path`. Part files are
/// deleted as they are consumed. Blocks; run it on the blocking pool.
pub(crate) fn merge_segments(
    segments: &[Arc<Segment>],
    total_size: u64,
    final_path: &Path,
) -> Result<PathBuf, MergeError> {
    let snapshots: Vec<SegmentSnapshot> = segments.iter().map(|s| s.snapshot()).collect();
    verify_coverage(&snapshots, total_size)?;

    let mut out = OutputWriter::create(final_path)?;
    for (segment, snap) in segments.iter().zip(&snapshots) {
        if let Err(e) = append_segment(&mut out, segment, snap.range) {
            out.discard();
            return Err(e);
        }
    }
    let path = out.finalize()?;
    tracing::info!(path = %path.display(), total_size, segments = segments.len(), "merge complete");
    Ok(path)
}

fn append_segment(out: &mut OutputWriter, segment: &Segment, range: ByteRange) -> Result<(), MergeError> {
    let mut part = segment.take_part().ok_or(MergeError::MissingPart(range))?;
    let got = out.append_part(&mut part)?;
    if got != range.len() {
        return Err(MergeError::PartLength { range, got });
    }
    let path = part.path().to_path_buf();
    if let Err(e) = part.discard() {
        tracing::warn!("failed to remove {}: {}", path.display(), e);
    }
    Ok(())
}

/// Deletes every part file still attached to `segments`.
pub(crate) fn discard_parts(segments: &[Arc<Segment>]) {
    for segment in segments {
        if let Some(part) = segment.take_part() {
            let path = part.path().to_path_buf();
            if let Err(e) = part.discard() {
                tracing::warn!("failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::SegmentState;
    use crate::storage::PartFile;

    fn finished(dir: &Path, begin: u64, data: &[u8]) -> Arc<Segment> {
        let seg = Arc::new(Segment::new(ByteRange::new(begin, begin + data.len() as u64 - 1)));
        let mut part = PartFile::create_in(dir, "m").unwrap();
        seg.write_chunk(&mut part, data).unwrap();
        seg.attach_part(part);
        seg.finish(SegmentStatus::Succeeded);
        seg
    }

    fn snap(begin: u64, end: u64, status: SegmentStatus) -> SegmentSnapshot {
        SegmentSnapshot {
            range: ByteRange::new(begin, end),
            status,
            bytes_written: end - begin + 1,
        }
    }

    #[test]
    fn coverage_checks() {
        use SegmentStatus::*;
        assert!(verify_coverage(&[snap(0, 9, Succeeded), snap(10, 19, Failed)], 20).is_ok());
        assert!(verify_coverage(&[], 0).is_ok());
        assert!(matches!(
            verify_coverage(&[snap(0, 9, Succeeded), snap(12, 19, Succeeded)], 20),
            Err(MergeError::Gap(10))
        ));
        assert!(matches!(
            verify_coverage(&[snap(0, 9, Succeeded), snap(5, 19, Succeeded)], 20),
            Err(MergeError::Overlap(5))
        ));
        assert!(matches!(
            verify_coverage(&[snap(0, 9, Succeeded)], 20),
            Err(MergeError::Gap(10))
        ));
        assert!(matches!(
            verify_coverage(&[snap(0, 19, Running)], 20),
            Err(MergeError::Unfinished(_))
        ));
    }

    #[test]
    fn merges_in_offset_order_and_removes_parts() {
        let dir = tempfile::tempdir().unwrap();
        let segs = vec![
            finished(dir.path(), 0, b"hello "),
            finished(dir.path(), 6, b"split "),
            finished(dir.path(), 12, b"world"),
        ];
        let final_path = dir.path().join("out.txt");
        let path = merge_segments(&segs, 17, &final_path).unwrap();
        assert_eq!(path, final_path);
        assert_eq!(std::fs::read(&final_path).unwrap(), b"hello split world");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path() != final_path)
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn empty_resource_gives_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("empty.bin");
        merge_segments(&[], 0, &final_path).unwrap();
        assert_eq!(std::fs::read(&final_path).unwrap().len(), 0);
    }

    #[test]
    fn gap_fails_before_creating_output() {
        let dir = tempfile::tempdir().unwrap();
        let segs = vec![finished(dir.path(), 0, b"abc")];
        let final_path = dir.path().join("out.bin");
        assert!(matches!(
            merge_segments(&segs, 10, &final_path),
            Err(MergeError::Gap(3))
        ));
        assert!(!final_path.exists());
        assert!(!crate::storage::temp_path(&final_path).exists());
    }

    #[test]
    fn missing_part_discards_output() {
        let dir = tempfile::tempdir().unwrap();
        let seg = Arc::new(Segment::with_state(
            0,
            SegmentState {
                end: 3,
                status: SegmentStatus::Succeeded,
                bytes_written: 4,
            },
        ));
        let final_path = dir.path().join("out.bin");
        assert!(matches!(
            merge_segments(&[seg], 4, &final_path),
            Err(MergeError::MissingPart(_))
        ));
        assert!(!crate::storage::temp_path(&final_path).exists());
    }

    #[test]
    fn discard_parts_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let segs = vec![finished(dir.path(), 0, b"abc"), finished(dir.path(), 3, b"def")];
        discard_parts(&segs);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
