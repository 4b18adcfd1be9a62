//! libcurl transport: one `Easy` handle per request.

use std::cell::RefCell;
use std::str;
use std::time::Duration;

use crate::config::SplitdlConfig;
use crate::protocol::ResponseHead;
use crate::segmenter::ByteRange;

use super::{ResponseSink, Transport, TransportError};

const MAX_REDIRECTIONS: u32 = 10;

/// Per-request curl options.
#[derive(Debug, Clone, Copy)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    pub follow_redirects: bool,
    /// Receive buffer size in bytes (None = libcurl default).
    pub buffer_size: Option<usize>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        CurlOptions::from(&SplitdlConfig::default())
    }
}

impl From<&SplitdlConfig> for CurlOptions {
    fn from(cfg: &SplitdlConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout(),
            follow_redirects: cfg.follow_redirects,
            buffer_size: cfg.buffer_size,
        }
    }
}

/// [`Transport`] backed by the curl crate.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: CurlOptions,
}

impl CurlTransport {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    fn easy_for(&self, url: &str, range: ByteRange) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(self.opts.follow_redirects)?;
        easy.max_redirections(MAX_REDIRECTIONS)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        if let Some(sz) = self.opts.buffer_size {
            easy.buffer_size(sz)?;
        }
        // curl expects "start-end" (inclusive), not "bytes=start-end".
        easy.range(&range.curl_range())?;
        Ok(easy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadState {
    Pending,
    Accepted,
    Rejected,
    Malformed,
}

/// Delivers the collected head to the sink once.
fn deliver_head(lines: &[String], sink: &mut dyn ResponseSink) -> HeadState {
    match ResponseHead::from_header_lines(lines) {
        Some(head) if sink.head(&head) => HeadState::Accepted,
        Some(_) => HeadState::Rejected,
        None => HeadState::Malformed,
    }
}

impl Transport for CurlTransport {
    fn fetch_range(
        &self,
        url: &str,
        range: ByteRange,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), TransportError> {
        let mut easy = self.easy_for(url, range)?;
        let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let mut head_state = HeadState::Pending;
        let mut body_stopped = false;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    let line = s.trim_end();
                    let mut lines = lines.borrow_mut();
                    // A new status line starts a new response (redirect hop).
                    if line.starts_with("HTTP/") {
                        lines.clear();
                    }
                    if !line.is_empty() {
                        lines.push(line.to_string());
                    }
                }
                true
            })?;
            transfer.write_function(|data| {
                if head_state == HeadState::Pending {
                    head_state = deliver_head(&lines.borrow(), &mut *sink);
                }
                if head_state != HeadState::Accepted {
                    return Ok(0);
                }
                if !sink.body(data) {
                    body_stopped = true;
                    return Ok(0);
                }
                Ok(data.len())
            })?;
            transfer.perform()
        };

        match performed {
            Ok(()) => {
                if head_state == HeadState::Pending {
                    // Empty body: the head never went through the write callback.
                    head_state = deliver_head(&lines.borrow(), sink);
                }
                match head_state {
                    HeadState::Malformed => Err(TransportError::NoResponse),
                    _ => Ok(()),
                }
            }
            Err(e) if e.is_write_error() => match head_state {
                HeadState::Malformed => Err(TransportError::NoResponse),
                HeadState::Rejected => Err(TransportError::Stopped),
                _ if body_stopped => Err(TransportError::Stopped),
                _ => Err(TransportError::Curl(e)),
            },
            Err(e) => Err(TransportError::Curl(e)),
        }
    }
}
