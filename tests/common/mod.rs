#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use rangeseek::RangeReader;
use rangeseek::error::BoxError;
use rangeseek::io::{Body, BytesBody, Request, Response, Transport};
use reqwest::{Method, StatusCode};

pub const URL: &str = "http://example.com/resource.bin";

/// Deterministic content: byte `i` is `i % 251`.
pub fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Parse `bytes=<start>-<end>` into an inclusive pair.
pub fn parse_range(value: &str) -> (u64, u64) {
    let bounds = value.strip_prefix("bytes=").expect("range unit");
    let (start, end) = bounds.split_once('-').expect("range separator");
    (start.parse().unwrap(), end.parse().unwrap())
}

/// In-memory origin that honors `Range` like a well-behaved server.
pub struct FakeServer {
    data: Bytes,
    ignore_range: bool,
    requests: Mutex<Vec<Request>>,
}

impl FakeServer {
    pub fn new(data: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            data: Bytes::from(data),
            ignore_range: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// An origin that answers every `GET` with `200` and the whole body.
    pub fn ignoring_range(data: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            data: Bytes::from(data),
            ignore_range: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter(|r| r.method == Method::GET)
            .map(|r| r.range().unwrap_or_default().to_string())
            .collect()
    }

    pub fn heads(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == Method::HEAD)
            .count()
    }

    pub fn reader(self: &Arc<Self>) -> RangeReader<Arc<FakeServer>> {
        RangeReader::with_transport(URL, Arc::clone(self)).unwrap()
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn execute(&self, request: Request) -> Result<Response, BoxError> {
        self.requests.lock().unwrap().push(request.clone());
        let len = self.data.len() as u64;

        if request.method == Method::HEAD {
            return Ok(Response::new(StatusCode::OK, BytesBody::empty()).with_content_length(len));
        }

        let range = match request.range() {
            Some(range) if !self.ignore_range => parse_range(range),
            _ => {
                return Ok(Response::new(StatusCode::OK, BytesBody::new(self.data.clone()))
                    .with_content_length(len));
            }
        };

        let (start, end) = range;
        if start >= len {
            return Ok(Response::new(
                StatusCode::RANGE_NOT_SATISFIABLE,
                BytesBody::new(&b"unsatisfiable"[..]),
            ));
        }
        let end = end.min(len - 1);
        let slice = self.data.slice(start as usize..=end as usize);
        let slice_len = slice.len() as u64;
        Ok(Response::new(StatusCode::PARTIAL_CONTENT, BytesBody::new(slice))
            .with_content_length(slice_len))
    }
}

/// A body that can fail on close, and records that it was drained.
pub struct TrackedBody {
    inner: BytesBody,
    fail_close: bool,
    drained: Arc<Mutex<bool>>,
}

impl TrackedBody {
    pub fn new(bytes: impl Into<Bytes>, fail_close: bool) -> (Self, Arc<Mutex<bool>>) {
        let drained = Arc::new(Mutex::new(false));
        let body = Self {
            inner: BytesBody::new(bytes),
            fail_close,
            drained: Arc::clone(&drained),
        };
        (body, drained)
    }
}

#[async_trait]
impl Body for TrackedBody {
    async fn chunk(&mut self) -> Result<Option<Bytes>, BoxError> {
        let chunk = self.inner.chunk().await?;
        if chunk.is_none() {
            *self.drained.lock().unwrap() = true;
        }
        Ok(chunk)
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        if self.fail_close {
            return Err("connection reset while closing body".into());
        }
        Ok(())
    }
}

/// Yields one chunk, then fails as if the connection dropped.
pub struct InterruptedBody {
    first: Option<Bytes>,
}

impl InterruptedBody {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            first: Some(bytes.into()),
        }
    }
}

#[async_trait]
impl Body for InterruptedBody {
    async fn chunk(&mut self) -> Result<Option<Bytes>, BoxError> {
        match self.first.take() {
            Some(chunk) => Ok(Some(chunk)),
            None => Err("connection dropped mid-body".into()),
        }
    }
}

/// Replays a fixed list of responses in order.
pub struct Scripted {
    responses: Mutex<VecDeque<Result<Response, BoxError>>>,
    requests: Mutex<Vec<Request>>,
}

impl Scripted {
    pub fn new(responses: Vec<Result<Response, BoxError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn reader(self: &Arc<Self>) -> RangeReader<Arc<Scripted>> {
        RangeReader::with_transport(URL, Arc::clone(self)).unwrap()
    }
}

#[async_trait]
impl Transport for Scripted {
    async fn execute(&self, request: Request) -> Result<Response, BoxError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted response left".into()))
    }
}
