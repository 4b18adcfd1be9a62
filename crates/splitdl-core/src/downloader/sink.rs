//! Response sink for one segment transfer.
//! Validates 206 and Content-Range before creating the part file; clips every
//! chunk to the segment's current end.

use std::path::Path;

use crate::protocol::{ResponseHead, STATUS_PARTIAL_CONTENT};
use crate::segmenter::{ByteRange, Segment};
use crate::storage::PartFile;
use crate::transport::ResponseSink;

use super::SegmentError;

pub(super) struct SegmentSink<'a> {
    segment: &'a Segment,
    requested: ByteRange,
    temp_dir: &'a Path,
    file_stem: &'a str,
    part: Option<PartFile>,
    error: Option<SegmentError>,
    /// Every assigned byte is on disk.
    complete: bool,
}

impl<'a> SegmentSink<'a> {
    pub(super) fn new(
        segment: &'a Segment,
        requested: ByteRange,
        temp_dir: &'a Path,
        file_stem: &'a str,
    ) -> Self {
        Self {
            segment,
            requested,
            temp_dir,
            file_stem,
            part: None,
            error: None,
            complete: false,
        }
    }

    pub(super) fn into_parts(self) -> (Option<PartFile>, Option<SegmentError>, bool) {
        (self.part, self.error, self.complete)
    }

    /// The head must describe exactly the requested span. A shrink that
    /// happened after the request went out does not matter here; clipping
    /// takes care of it.
    fn check_head(&self, head: &ResponseHead) -> Result<(), SegmentError> {
        if head.status != STATUS_PARTIAL_CONTENT {
            return Err(SegmentError::Status(head.status));
        }
        let cr = head
            .parsed_content_range()
            .ok_or(SegmentError::ContentRange)?;
        match cr.range {
            Some(got) if got == self.requested => Ok(()),
            Some(got) => Err(SegmentError::RangeMismatch {
                requested: self.requested,
                got,
            }),
            None if cr.size == Some(self.requested.len()) => Ok(()),
            None => Err(SegmentError::SizeMismatch {
                requested: self.requested.len(),
                got: cr.size,
            }),
        }
    }
}

impl ResponseSink for SegmentSink<'_> {
    fn head(&mut self, head: &ResponseHead) -> bool {
        if let Err(e) = self.check_head(head) {
            self.error = Some(e);
            return false;
        }
        if self.part.is_some() {
            return true;
        }
        match PartFile::create_in(self.temp_dir, self.file_stem) {
            Ok(part) => {
                self.part = Some(part);
                true
            }
            Err(e) => {
                self.error = Some(SegmentError::Io(e));
                false
            }
        }
    }

    fn body(&mut self, chunk: &[u8]) -> bool {
        let Some(part) = self.part.as_mut() else {
            return false;
        };
        match self.segment.write_chunk(part, chunk) {
            Ok(outcome) if outcome.complete => {
                self.complete = true;
                false
            }
            Ok(_) => true,
            Err(e) => {
                self.error = Some(SegmentError::Io(e));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(status: u32, content_range: Option<&str>) -> ResponseHead {
        ResponseHead {
            status,
            content_range: content_range.map(str::to_string),
        }
    }

    #[test]
    fn rejects_non_206_without_creating_part() {
        let dir = tempfile::tempdir().unwrap();
        let seg = Segment::new(ByteRange::new(0, 99));
        let mut sink = SegmentSink::new(&seg, seg.range(), dir.path(), "f");
        assert!(!sink.head(&head(200, None)));
        assert!(matches!(sink.error, Some(SegmentError::Status(200))));
        assert!(sink.part.is_none());
        assert!(!sink.body(b"data"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn rejects_mismatched_range() {
        let dir = tempfile::tempdir().unwrap();
        let seg = Segment::new(ByteRange::new(250, 499));
        let mut sink = SegmentSink::new(&seg, seg.range(), dir.path(), "f");
        assert!(!sink.head(&head(206, Some("bytes 251-499/1000"))));
        assert!(matches!(
            sink.error,
            Some(SegmentError::RangeMismatch { got, .. }) if got == ByteRange::new(251, 499)
        ));
    }

    #[test]
    fn rejects_missing_content_range() {
        let dir = tempfile::tempdir().unwrap();
        let seg = Segment::new(ByteRange::new(0, 9));
        let mut sink = SegmentSink::new(&seg, seg.range(), dir.path(), "f");
        assert!(!sink.head(&head(206, None)));
        assert!(matches!(sink.error, Some(SegmentError::ContentRange)));
    }

    #[test]
    fn wildcard_range_checks_size() {
        let dir = tempfile::tempdir().unwrap();
        let seg = Segment::new(ByteRange::new(10, 19));

        let mut sink = SegmentSink::new(&seg, seg.range(), dir.path(), "f");
        assert!(sink.head(&head(206, Some("bytes */10"))));
        assert!(sink.part.is_some());

        let mut sink = SegmentSink::new(&seg, seg.range(), dir.path(), "f");
        assert!(!sink.head(&head(206, Some("bytes */1000"))));
        assert!(matches!(
            sink.error,
            Some(SegmentError::SizeMismatch { requested: 10, got: Some(1000) })
        ));
    }

    #[test]
    fn accepts_206_and_stops_when_complete() {
        let dir = tempfile::tempdir().unwrap();
        let seg = Segment::new(ByteRange::new(250, 257));
        let mut sink = SegmentSink::new(&seg, seg.range(), dir.path(), "f");
        assert!(sink.head(&head(206, Some("bytes 250-257/1000"))));
        assert!(sink.body(b"abcd"));
        assert!(!sink.complete);
        assert!(!sink.body(b"efghXYZ"));
        assert!(sink.complete);
        assert!(sink.error.is_none());
        assert_eq!(seg.bytes_written(), 8);
        assert_eq!(sink.part.as_ref().unwrap().len(), 8);
    }
}
