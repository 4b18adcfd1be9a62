//! Private per-segment part files.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use super::TEMP_SUFFIX;

/// A segment's private temp file. Deleted from disk when dropped or
/// [`discard`](PartFile::discard)ed.
#[derive(Debug)]
pub struct PartFile {
    file: tempfile::NamedTempFile,
    len: u64,
}

impl PartFile {
    /// Create `<stem>.<random>.part` in `dir`.
    pub fn create_in(dir: &Path, stem: &str) -> io::Result<Self> {
        let prefix = format!("{}.", stem);
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)?;
        Ok(Self { file, len: 0 })
    }

    /// Append `data` at the end of the file.
    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.as_file_mut().write_all(data)?;
        self.len += data.len() as u64;
        Ok(())
    }

    /// Cut the file back to `len` bytes (after a failed or partial write).
    pub fn truncate(&mut self, len: u64) -> io::Result<()> {
        let f = self.file.as_file_mut();
        f.set_len(len)?;
        f.seek(SeekFrom::Start(len))?;
        self.len = len;
        Ok(())
    }

    /// Bytes appended so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Rewind and copy the whole part into `out`. Leaves the cursor at the
    /// end so later appends still land after the existing bytes.
    pub fn copy_to<W: Write>(&mut self, out: &mut W) -> io::Result<u64> {
        let len = self.len;
        let f: &mut File = self.file.as_file_mut();
        f.seek(SeekFrom::Start(0))?;
        let copied = io::copy(&mut io::Read::take(&mut *f, len), out)?;
        f.seek(SeekFrom::End(0))?;
        if copied != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("part file {} holds {} of {} bytes", self.path().display(), copied, len),
            ));
        }
        Ok(copied)
    }

    /// Close and delete the file.
    pub fn discard(self) -> io::Result<()> {
        self.file.close()
    }
}
