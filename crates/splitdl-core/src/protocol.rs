//! Range/size metadata parsing for HTTP responses.
//!
//! Pure functions shared by the capability probe and the segment workers:
//! status line parsing, `Content-Range` parsing, and folding collected header
//! lines into a [`ResponseHead`].

use crate::segmenter::ByteRange;

/// `206 Partial Content`.
pub const STATUS_PARTIAL_CONTENT: u32 = 206;
/// `200 OK`: the server ignored the Range header.
pub const STATUS_OK: u32 = 200;
/// `416 Range Not Satisfiable`.
pub const STATUS_RANGE_NOT_SATISFIABLE: u32 = 416;

/// Parsed `Content-Range: bytes <begin>-<end>/<size>` value.
///
/// `range` is `None` for the wildcard form (`bytes */<size>`), `size` is `None`
/// when the server does not know the complete length (`bytes <b>-<e>/*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub range: Option<ByteRange>,
    pub size: Option<u64>,
}

/// Status code and the headers the downloader cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u32,
    /// Raw `Content-Range` value, if the server sent exactly one.
    pub content_range: Option<String>,
}

impl ResponseHead {
    /// Parsed `Content-Range`, or `None` if missing or malformed.
    pub fn parsed_content_range(&self) -> Option<ContentRange> {
        self.content_range.as_deref().and_then(parse_content_range)
    }

    /// Build from raw header lines (status line first). Lines from earlier
    /// responses in a redirect chain must already have been dropped.
    pub fn from_header_lines(lines: &[String]) -> Option<Self> {
        let status = parse_http_status(lines)?;
        let mut values = lines.iter().filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-range") {
                Some(value.trim().to_string())
            } else {
                None
            }
        });
        let first = values.next();
        // Conflicting duplicates are as good as none.
        let content_range = if values.next().is_some() { None } else { first };
        Some(ResponseHead {
            status,
            content_range,
        })
    }
}

/// Status code from the last `HTTP/...` status line in `lines`.
pub fn parse_http_status(lines: &[String]) -> Option<u32> {
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("HTTP/"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
}

/// Parses a `Content-Range` header value. Only the `bytes` unit is accepted.
pub fn parse_content_range(value: &str) -> Option<ContentRange> {
    let (unit, spec) = value.trim().split_once(char::is_whitespace)?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return None;
    }
    let (range, size) = spec.trim().split_once('/')?;

    let size = match size.trim() {
        "*" => None,
        s => Some(s.parse::<u64>().ok()?),
    };

    let range = match range.trim() {
        "*" => None,
        r => {
            let (begin, end) = r.split_once('-')?;
            let begin = begin.trim().parse::<u64>().ok()?;
            let end = end.trim().parse::<u64>().ok()?;
            if begin > end {
                return None;
            }
            Some(ByteRange::new(begin, end))
        }
    };

    Some(ContentRange { range, size })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn content_range_full_form() {
        let cr = parse_content_range("bytes 0-127/1000").unwrap();
        assert_eq!(cr.range, Some(ByteRange::new(0, 127)));
        assert_eq!(cr.size, Some(1000));
    }

    #[test]
    fn content_range_wildcards() {
        let cr = parse_content_range("bytes */1000").unwrap();
        assert_eq!(cr.range, None);
        assert_eq!(cr.size, Some(1000));

        let cr = parse_content_range("bytes */*").unwrap();
        assert_eq!(cr.range, None);
        assert_eq!(cr.size, None);

        let cr = parse_content_range("bytes 5-9/*").unwrap();
        assert_eq!(cr.range, Some(ByteRange::new(5, 9)));
        assert_eq!(cr.size, None);
    }

    #[test]
    fn content_range_rejects_garbage() {
        assert!(parse_content_range("items 0-1/2").is_none());
        assert!(parse_content_range("bytes 0-1").is_none());
        assert!(parse_content_range("bytes 9-1/20").is_none());
        assert!(parse_content_range("bytes a-b/20").is_none());
        assert!(parse_content_range("bytes 0-1/abc").is_none());
        assert!(parse_content_range("").is_none());
    }

    #[test]
    fn status_uses_last_status_line() {
        let l = lines(&[
            "HTTP/1.1 302 Found",
            "Location: /elsewhere",
            "HTTP/1.1 206 Partial Content",
        ]);
        assert_eq!(parse_http_status(&l), Some(206));
        assert_eq!(parse_http_status(&lines(&["HTTP/2 200"])), Some(200));
        assert_eq!(parse_http_status(&lines(&["Content-Length: 1"])), None);
    }

    #[test]
    fn head_from_lines() {
        let l = lines(&[
            "HTTP/1.1 206 Partial Content",
            "content-range: bytes 0-127/4096",
            "Content-Length: 128",
        ]);
        let head = ResponseHead::from_header_lines(&l).unwrap();
        assert_eq!(head.status, STATUS_PARTIAL_CONTENT);
        let cr = head.parsed_content_range().unwrap();
        assert_eq!(cr.size, Some(4096));
    }

    #[test]
    fn head_with_duplicate_content_range_has_none() {
        let l = lines(&[
            "HTTP/1.1 206 Partial Content",
            "Content-Range: bytes 0-9/100",
            "Content-Range: bytes 0-19/100",
        ]);
        let head = ResponseHead::from_header_lines(&l).unwrap();
        assert!(head.content_range.is_none());
    }
}
