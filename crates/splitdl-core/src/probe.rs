//! Capability probe.
//!
//! Asks for the first 128 bytes of the resource. A `206` answer proves the
//! server honours ranges and its `Content-Range` tells us the total size;
//! anything else ends the job before a single worker starts.

use crate::protocol::{
    ResponseHead, STATUS_OK, STATUS_PARTIAL_CONTENT, STATUS_RANGE_NOT_SATISFIABLE,
};
use crate::segmenter::ByteRange;
use crate::transport::{ResponseSink, Transport, TransportError};
use crate::url_model;

/// Bytes requested by the probe.
pub const PROBE_RANGE: ByteRange = ByteRange { begin: 0, end: 127 };

/// What the probe learned about the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub total_size: u64,
    /// Output file name derived from the locator.
    pub file_name: String,
}

/// Fatal probe outcomes.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("error sending HTTP request: {0}")]
    Transport(#[source] TransportError),
    #[error("server ignored ranged downloading for this file")]
    RangesIgnored,
    #[error("server doesn't support ranged downloading for this file")]
    RangesUnsupported,
    #[error("unexpected status code {0}")]
    UnexpectedStatus(u32),
    #[error("server didn't respond with total size")]
    MissingSize,
}

/// Keeps the head and stops before any body arrives.
#[derive(Default)]
struct HeadCapture {
    head: Option<ResponseHead>,
}

impl ResponseSink for HeadCapture {
    fn head(&mut self, head: &ResponseHead) -> bool {
        self.head = Some(head.clone());
        false
    }

    fn body(&mut self, _chunk: &[u8]) -> bool {
        false
    }
}

/// Probes `url`. Blocks; call from `spawn_blocking` if used from async code.
pub fn probe(transport: &dyn Transport, url: &str) -> Result<ProbeResult, ProbeError> {
    let mut capture = HeadCapture::default();
    let result = transport.fetch_range(url, PROBE_RANGE, &mut capture);
    let head = match (capture.head, result) {
        (Some(head), _) => head,
        (None, Err(e)) => return Err(ProbeError::Transport(e)),
        (None, Ok(())) => return Err(ProbeError::Transport(TransportError::NoResponse)),
    };

    match head.status {
        STATUS_PARTIAL_CONTENT => {}
        STATUS_OK => return Err(ProbeError::RangesIgnored),
        STATUS_RANGE_NOT_SATISFIABLE => return Err(ProbeError::RangesUnsupported),
        other => return Err(ProbeError::UnexpectedStatus(other)),
    }

    let total_size = head
        .parsed_content_range()
        .and_then(|cr| cr.size)
        .ok_or(ProbeError::MissingSize)?;
    tracing::debug!(url, total_size, "probe ok");

    Ok(ProbeResult {
        total_size,
        file_name: url_model::derive_filename(url),
    })
}
