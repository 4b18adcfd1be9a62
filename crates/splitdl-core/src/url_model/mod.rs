//! Output file naming.
//!
//! The output file is named after the final path component of the resource
//! locator, sanitized for Linux filesystems.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename_for_linux;

/// Fallback name when the locator has no usable final path component.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Derives a safe output file name from a resource locator.
///
/// - `derive_filename("https://example.com/archive.zip")` → `"archive.zip"`
/// - `derive_filename("https://example.com/")` → `"download.bin"`
pub fn derive_filename(locator: &str) -> String {
    let raw = match filename_from_url_path(locator) {
        Some(c) => c,
        None => return DEFAULT_FILENAME.to_string(),
    };

    let sanitized = sanitize_filename_for_linux(&raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}
