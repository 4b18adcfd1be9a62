//! In-memory transport for engine tests: serves a fixed body with scripted
//! per-request faults.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::protocol::ResponseHead;
use crate::segmenter::ByteRange;

use super::{ResponseSink, Transport, TransportError};

/// Misbehaviour applied to one request whose range starts at a given offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail before any response arrives.
    Refuse,
    /// Send `n` body bytes, then fail.
    CutAfter(u64),
    /// Answer 206 with a Content-Range that does not match the request.
    WrongRange,
    /// Answer with this status and no body.
    Status(u32),
}

#[derive(Debug)]
pub struct MemoryTransport {
    body: Arc<Vec<u8>>,
    chunk_size: usize,
    ignore_ranges: bool,
    faults: Mutex<HashMap<u64, VecDeque<Fault>>>,
    requests: Mutex<Vec<ByteRange>>,
}

impl MemoryTransport {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body: Arc::new(body),
            chunk_size: usize::MAX,
            ignore_ranges: false,
            faults: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n.max(1);
        self
    }

    /// Reply `200 OK` with the whole body, like a server without range support.
    pub fn ignore_ranges(mut self) -> Self {
        self.ignore_ranges = true;
        self
    }

    /// Queue `fault` for the next request whose range begins at `begin`.
    pub fn fault_at(self, begin: u64, fault: Fault) -> Self {
        self.faults
            .lock()
            .unwrap()
            .entry(begin)
            .or_default()
            .push_back(fault);
        self
    }

    /// Every range requested so far, in request order.
    pub fn requests(&self) -> Vec<ByteRange> {
        self.requests.lock().unwrap().clone()
    }

    fn head(status: u32, content_range: Option<String>) -> ResponseHead {
        ResponseHead {
            status,
            content_range,
        }
    }

    fn stream(
        &self,
        slice: &[u8],
        limit: Option<u64>,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), TransportError> {
        let cap = limit.map(|n| n as usize).unwrap_or(slice.len()).min(slice.len());
        for chunk in slice[..cap].chunks(self.chunk_size) {
            if !sink.body(chunk) {
                return Err(TransportError::Stopped);
            }
        }
        if limit.is_some() {
            return Err(TransportError::Other("connection reset".to_string()));
        }
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn fetch_range(
        &self,
        _url: &str,
        range: ByteRange,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), TransportError> {
        self.requests.lock().unwrap().push(range);
        let fault = self
            .faults
            .lock()
            .unwrap()
            .get_mut(&range.begin)
            .and_then(|q| q.pop_front());
        let total = self.body.len() as u64;

        if fault == Some(Fault::Refuse) {
            return Err(TransportError::Other("connection refused".to_string()));
        }
        if let Some(Fault::Status(code)) = fault {
            sink.head(&Self::head(code, Some(format!("bytes */{}", total))));
            return Ok(());
        }
        if self.ignore_ranges {
            if !sink.head(&Self::head(200, None)) {
                return Err(TransportError::Stopped);
            }
            return self.stream(&self.body, None, sink);
        }
        if range.begin >= total {
            sink.head(&Self::head(416, Some(format!("bytes */{}", total))));
            return Ok(());
        }

        let end = range.end.min(total - 1);
        let declared = if fault == Some(Fault::WrongRange) {
            format!("bytes {}-{}/{}", range.begin + 1, end, total)
        } else {
            format!("bytes {}-{}/{}", range.begin, end, total)
        };
        if !sink.head(&Self::head(206, Some(declared))) {
            return Err(TransportError::Stopped);
        }
        let slice = &self.body[range.begin as usize..=end as usize];
        let limit = match fault {
            Some(Fault::CutAfter(n)) => Some(n),
            _ => None,
        };
        self.stream(slice, limit, sink)
    }
}
