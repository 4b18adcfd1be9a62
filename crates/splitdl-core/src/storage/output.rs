//! Output file assembly: append parts into `<final>.part`, then rename.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::{temp_path, PartFile};

/// Writer for the merged output. Bytes go to `<final>.part` until
/// [`finalize`](OutputWriter::finalize) renames it into place.
pub struct OutputWriter {
    out: BufWriter<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl OutputWriter {
    /// Create (or truncate) `<final_path>.part`.
    pub fn create(final_path: &Path) -> Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("failed to create output file: {}", temp_path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    /// Append the full contents of `part`.
    pub fn append_part(&mut self, part: &mut PartFile) -> Result<u64> {
        let n = part
            .copy_to(&mut self.out)
            .with_context(|| format!("failed to append {}", part.path().display()))?;
        self.written += n;
        Ok(n)
    }

    /// Bytes appended so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush, sync and atomically rename to the final path.
    pub fn finalize(self) -> Result<PathBuf> {
        let file = self
            .out
            .into_inner()
            .map_err(|e| e.into_error())
            .context("failed to flush output file")?;
        file.sync_all().context("output sync failed")?;
        drop(file);

        std::fs::rename(&self.temp_path, &self.final_path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                self.temp_path.display(),
                self.final_path.display()
            )
        })?;
        Ok(self.final_path)
    }

    /// Drop the unfinished output file.
    pub fn discard(self) {
        let OutputWriter { out, temp_path, .. } = self;
        drop(out);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            tracing::warn!("failed to remove {}: {}", temp_path.display(), e);
        }
    }
}
