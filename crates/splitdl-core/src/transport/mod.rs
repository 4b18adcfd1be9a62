//! Injected transport capability.
//!
//! The engine never talks to the network directly: every request goes
//! through a [`Transport`], which issues one ranged GET and pushes the
//! response into a [`ResponseSink`]. [`CurlTransport`] is the libcurl-backed
//! implementation used by the CLI.

mod curl;
#[cfg(test)]
pub(crate) mod memory;

pub use self::curl::{CurlOptions, CurlTransport};

use crate::protocol::ResponseHead;
use crate::segmenter::ByteRange;

/// Receiver for one response.
///
/// `head` is called exactly once per response that reaches the client,
/// before any body bytes, including when the body is empty.
pub trait ResponseSink {
    /// Return `false` to stop the transfer.
    fn head(&mut self, head: &ResponseHead) -> bool;
    /// Return `false` to stop the transfer.
    fn body(&mut self, chunk: &[u8]) -> bool;
}

/// Range-capable request capability. Implementations block the calling
/// thread until the transfer ends.
pub trait Transport: Send + Sync + 'static {
    /// GET `url` with `Range: bytes=<begin>-<end>`, streaming the response
    /// into `sink`. Returns [`TransportError::Stopped`] if the sink asked to
    /// stop.
    fn fetch_range(
        &self,
        url: &str,
        range: ByteRange,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), TransportError>;
}

/// Failure reported by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The sink returned `false`.
    #[error("transfer stopped by receiver")]
    Stopped,
    /// The server sent something that is not an HTTP response head.
    #[error("no valid HTTP response head received")]
    NoResponse,
    #[error("curl: {0}")]
    Curl(#[from] ::curl::Error),
    #[error("{0}")]
    Other(String),
}
