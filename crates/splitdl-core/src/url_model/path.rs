//! Filename extraction from a resource locator.

/// Final path component of `locator`, used as the output file name.
///
/// Parses the locator as a URL when possible (query and fragment are
/// ignored). Anything else is treated as a plain path and split on `/`.
/// Returns `None` when there is no usable final component.
pub fn filename_from_url_path(locator: &str) -> Option<String> {
    let segment = match url::Url::parse(locator) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segs| segs.next_back())
            .map(str::to_string),
        Err(_) => {
            let path = locator.split(&['?', '#'][..]).next().unwrap_or(locator);
            path.rsplit('/').next().map(str::to_string)
        }
    }?;
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment)
}
