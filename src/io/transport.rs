use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, RANGE};
use reqwest::{Client, Method, StatusCode, Url};

use crate::error::{BoxError, Error, Result};

/// Request timeout used by [`ReqwestTransport::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A request issued by the reader: `GET` with a `Range` header, or `HEAD`.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn head(url: Url) -> Self {
        Self::new(Method::HEAD, url)
    }

    /// Value of the `Range` header, if any.
    pub fn range(&self) -> Option<&str> {
        self.headers.get(RANGE).and_then(|v| v.to_str().ok())
    }
}

/// Streamed response body. Must be drained and closed by whoever receives it.
#[async_trait]
pub trait Body: Send {
    /// Next chunk of the body, `None` once exhausted.
    async fn chunk(&mut self) -> std::result::Result<Option<Bytes>, BoxError>;

    async fn close(&mut self) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

/// A response as seen by the reader.
pub struct Response {
    pub status: StatusCode,
    /// Parsed `Content-Length`; `None` when absent or unparsable.
    pub content_length: Option<u64>,
    pub body: Box<dyn Body>,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Body + 'static) -> Self {
        Self {
            status,
            content_length: None,
            body: Box::new(body),
        }
    }

    pub fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = Some(content_length);
        self
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Issues HTTP requests on behalf of a [`RangeReader`](crate::RangeReader).
///
/// Retries, timeouts and connection reuse all belong here; the reader
/// never retries on its own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> std::result::Result<Response, BoxError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: Request) -> std::result::Result<Response, BoxError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn execute(&self, request: Request) -> std::result::Result<Response, BoxError> {
        (**self).execute(request).await
    }
}

/// A body held entirely in memory, yielded as a single chunk.
#[derive(Debug, Default)]
pub struct BytesBody(Option<Bytes>);

impl BytesBody {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(Some(bytes.into()))
    }

    pub fn empty() -> Self {
        Self(None)
    }
}

#[async_trait]
impl Body for BytesBody {
    async fn chunk(&mut self) -> std::result::Result<Option<Bytes>, BoxError> {
        Ok(self.0.take().filter(|b| !b.is_empty()))
    }
}

/// Default transport backed by a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a [`DEFAULT_TIMEOUT`] client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(Error::transport)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> std::result::Result<Response, BoxError> {
        let resp = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .send()
            .await?;

        // Read the header directly; the body size hint is zero for HEAD.
        let content_length = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());

        Ok(Response {
            status: resp.status(),
            content_length,
            body: Box::new(resp),
        })
    }
}

#[async_trait]
impl Body for reqwest::Response {
    async fn chunk(&mut self) -> std::result::Result<Option<Bytes>, BoxError> {
        Ok(reqwest::Response::chunk(self).await?)
    }
}

/// Drain whatever is left of `body`, then close it.
///
/// The close is attempted even when draining fails; the drain error wins.
pub(crate) async fn finish(body: &mut dyn Body) -> std::result::Result<u64, BoxError> {
    let mut discarded = 0u64;
    let drained = loop {
        match body.chunk().await {
            Ok(Some(chunk)) => discarded += chunk.len() as u64,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    let closed = body.close().await;
    drained.and(closed).map(|()| discarded)
}
