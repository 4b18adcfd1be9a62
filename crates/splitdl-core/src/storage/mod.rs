//! Disk I/O and file lifecycle.
//!
//! Each segment streams into its own private part file. The merge appends
//! the parts in offset order into `<final>.part`, syncs it, and atomically
//! renames it to the final name.

mod output;
mod part;

pub use output::OutputWriter;
pub use part::PartFile;

/// Suffix for part files and the unfinished output.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the unfinished output: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
