use std::io::SeekFrom;

use reqwest::header::{HeaderValue, RANGE};
use reqwest::{StatusCode, Url};
use tracing::{debug, info};

use super::Whence;
use super::stream::RangeStream;
use super::transport::{self, Body, ReqwestTransport, Request, Response, Transport};
use crate::error::{Error, Result};

/// Default minimum number of bytes requested per network call (1 MiB).
pub const DEFAULT_MIN_FETCH: u64 = 1024 * 1024;

/// The most recently fetched contiguous byte range.
#[derive(Debug)]
struct Window {
    offset: u64,
    bytes: Vec<u8>,
}

impl Window {
    fn end(&self) -> u64 {
        self.offset + self.bytes.len() as u64
    }

    /// The `len` bytes at `offset`, only if the window contains all of them.
    fn slice(&self, offset: u64, len: u64) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        if offset < self.offset || end > self.end() {
            return None;
        }
        let start = (offset - self.offset) as usize;
        Some(&self.bytes[start..start + len as usize])
    }
}

/// Format an inclusive `Range` header value for `len` bytes at `from`.
///
/// A zero length still asks for the single byte at `from`.
fn format_range(from: u64, len: u64) -> String {
    let to = from.saturating_add(len.saturating_sub(1));
    format!("bytes={}-{}", from, to)
}

/// Random-access reader over an HTTP resource.
///
/// Each read that misses the cached window becomes one `GET` with a
/// `Range` header for at least `min_fetch` bytes; the body is kept as the
/// new window so nearby reads are served without a round trip.
///
/// A `RangeReader` holds a single cursor and a single window. Methods take
/// `&mut self`; use one instance per concurrent consumer.
pub struct RangeReader<T = ReqwestTransport> {
    url: Url,
    transport: T,
    cursor: i64,
    known_size: Option<u64>,
    min_fetch: u64,
    window: Option<Window>,
    transferred_bytes: u64,
    request_count: u64,
}

impl RangeReader<ReqwestTransport> {
    /// Create a reader for `url` using the default [`ReqwestTransport`].
    pub fn new(url: &str) -> Result<Self> {
        Self::with_transport(url, ReqwestTransport::new()?)
    }
}

impl<T: Transport> RangeReader<T> {
    /// Create a reader for `url` that issues requests through `transport`.
    pub fn with_transport(url: &str, transport: T) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            url: parsed,
            transport,
            cursor: 0,
            known_size: None,
            min_fetch: DEFAULT_MIN_FETCH,
            window: None,
            transferred_bytes: 0,
            request_count: 0,
        })
    }

    /// Set the minimum fetch size. `0` disables amplification.
    pub fn with_min_fetch(mut self, min_fetch: u64) -> Self {
        self.min_fetch = min_fetch;
        self
    }

    /// Start with a size the caller already knows, skipping discovery.
    pub fn with_known_size(mut self, size: u64) -> Self {
        self.known_size = Some(size);
        self
    }

    /// Wrap the reader in a [`RangeStream`] for `AsyncRead + AsyncSeek` consumers.
    pub fn into_stream(self) -> RangeStream<T>
    where
        T: 'static,
    {
        RangeStream::new(self)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Current cursor used by [`read`](Self::read).
    pub fn position(&self) -> i64 {
        self.cursor
    }

    pub(crate) fn set_position(&mut self, position: i64) {
        self.cursor = position;
    }

    pub fn known_size(&self) -> Option<u64> {
        self.known_size
    }

    pub fn min_fetch(&self) -> u64 {
        self.min_fetch
    }

    /// Total body bytes received from the network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    /// Number of requests handed to the transport, `HEAD` probes included
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Read up to `length` bytes at `offset`, copying at most `buf.len()`
    /// of them into `buf`.
    ///
    /// `length` may exceed the buffer; it is raised to `min_fetch` and
    /// clamped to the known size before the window is consulted. Returns
    /// the number of bytes copied into `buf`.
    pub async fn read_range(&mut self, buf: &mut [u8], offset: i64, length: u64) -> Result<usize> {
        debug!(offset, length, "read range");

        let offset = u64::try_from(offset).map_err(|_| Error::eof())?;

        let mut length = length;
        if self.min_fetch != 0 {
            length = length.max(self.min_fetch);
        }
        if let Some(size) = self.known_size {
            if offset >= size {
                return Err(Error::eof());
            }
            length = length.min(size - offset);
        }

        match &self.window {
            Some(window) => {
                if let Some(cached) = window.slice(offset, length) {
                    debug!(
                        offset,
                        length,
                        window_start = window.offset,
                        window_end = window.end(),
                        "cache hit"
                    );
                    return Ok(copy_prefix(buf, cached));
                }
                debug!(
                    offset,
                    length,
                    window_start = window.offset,
                    window_end = window.end(),
                    "cache miss"
                );
            }
            None => debug!("cache miss: cache empty"),
        }

        self.fetch(offset, length).await?;
        self.serve(buf, offset, length)
    }

    /// Fill `buf` from `offset`.
    ///
    /// Returns `Ok(buf.len())` only when the whole buffer was filled;
    /// otherwise [`Error::Eof`] reports how many bytes made it in.
    pub async fn read_at(&mut self, buf: &mut [u8], offset: i64) -> Result<usize> {
        let want = buf.len();
        let n = match self.read_range(buf, offset, want as u64).await {
            Ok(n) => n.min(want),
            Err(Error::Eof { read }) => return Err(Error::Eof { read: read.min(want) }),
            Err(e) => return Err(e),
        };
        if n != want {
            return Err(Error::Eof { read: n });
        }
        Ok(n)
    }

    /// Read at the cursor and advance it by the number of bytes read.
    ///
    /// The cursor does not move on error, including a short read.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        debug!(len = buf.len(), "read");

        let n = self.read_at(buf, self.cursor).await?;
        self.advance(n)?;
        Ok(n)
    }

    /// Read from the cursor to the end of the resource, appending to `out`.
    ///
    /// Bytes of the final short read are kept and the cursor is left at
    /// the end. Returns the number of bytes appended.
    pub async fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let chunk = self.min_fetch.clamp(8 * 1024, DEFAULT_MIN_FETCH) as usize;
        let mut buf = vec![0u8; chunk];
        let start = out.len();
        loop {
            match self.read(&mut buf).await {
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(Error::Eof { read }) => {
                    out.extend_from_slice(&buf[..read]);
                    self.advance(read)?;
                    return Ok(out.len() - start);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn advance(&mut self, n: usize) -> Result<()> {
        self.cursor = i64::try_from(n)
            .ok()
            .and_then(|n| self.cursor.checked_add(n))
            .ok_or(Error::InvalidArgument("read position overflows"))?;
        Ok(())
    }

    /// Move the cursor for the next [`read`](Self::read).
    ///
    /// Seeking from the end resolves the size first and rejects targets
    /// outside `0..=size` with [`Error::Eof`], leaving the cursor as it was.
    pub async fn seek(&mut self, offset: i64, whence: Whence) -> Result<i64> {
        debug!(offset, ?whence, "seek");

        let target = match whence {
            Whence::Start => offset,
            Whence::Current => self
                .cursor
                .checked_add(offset)
                .ok_or(Error::InvalidArgument("seek position overflows"))?,
            Whence::End => {
                let size = i64::try_from(self.size().await?)
                    .map_err(|_| Error::InvalidArgument("resource size exceeds i64"))?;
                match size.checked_add(offset) {
                    Some(target) if (0..=size).contains(&target) => target,
                    _ => return Err(Error::eof()),
                }
            }
        };

        self.cursor = target;
        Ok(target)
    }

    /// [`seek`](Self::seek) driven by a [`SeekFrom`].
    pub async fn seek_from(&mut self, pos: SeekFrom) -> Result<i64> {
        match pos {
            SeekFrom::Start(offset) => {
                let offset = i64::try_from(offset)
                    .map_err(|_| Error::InvalidArgument("seek position overflows"))?;
                self.seek(offset, Whence::Start).await
            }
            SeekFrom::Current(offset) => self.seek(offset, Whence::Current).await,
            SeekFrom::End(offset) => self.seek(offset, Whence::End).await,
        }
    }

    /// Total size of the resource.
    ///
    /// Free once known; otherwise a `HEAD` request whose `Content-Length`
    /// becomes the permanent size.
    pub async fn size(&mut self) -> Result<u64> {
        if let Some(size) = self.known_size {
            return Ok(size);
        }

        self.request_count += 1;
        let response = self
            .transport
            .execute(Request::head(self.url.clone()))
            .await
            .map_err(Error::transport)?;

        let Response {
            status,
            content_length,
            mut body,
        } = response;
        let finished = transport::finish(body.as_mut()).await;

        if !status.is_success() {
            return Err(Error::UnexpectedStatus(status));
        }
        let size = content_length.ok_or(Error::MissingContentLength)?;
        finished.map_err(Error::transport)?;

        debug!(url = %self.url, size, "discovered size");
        self.known_size = Some(size);
        Ok(size)
    }

    /// Fetch `length` bytes at `offset` into a fresh window.
    async fn fetch(&mut self, offset: u64, length: u64) -> Result<()> {
        let range = format_range(offset, length);
        let mut request = Request::get(self.url.clone());
        request
            .headers
            .insert(RANGE, HeaderValue::from_str(&range).map_err(Error::transport)?);

        info!(range = %range, "start HTTP GET");
        self.request_count += 1;
        let Response {
            status,
            content_length,
            mut body,
        } = self
            .transport
            .execute(request)
            .await
            .map_err(Error::transport)?;
        info!(status = %status, "response status");

        let loaded = if status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT {
            self.load_window(status, offset, content_length, body.as_mut()).await
        } else {
            Err(Error::eof())
        };

        // Drain and close the body whatever the status.
        let finished = transport::finish(body.as_mut()).await;
        loaded?;
        finished.map_err(Error::transport)?;
        Ok(())
    }

    async fn load_window(
        &mut self,
        status: StatusCode,
        offset: u64,
        content_length: Option<u64>,
        body: &mut dyn Body,
    ) -> Result<()> {
        // Reuse the previous window's allocation.
        let mut bytes = self
            .window
            .take()
            .map(|window| window.bytes)
            .unwrap_or_default();
        bytes.clear();

        let drained = loop {
            match body.chunk().await {
                Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
                Ok(None) => break Ok(()),
                Err(e) => break Err(Error::transport(e)),
            }
        };
        let read = bytes.len() as u64;
        self.transferred_bytes += read;

        // Whatever arrived is a contiguous prefix starting at `offset`.
        self.window = Some(Window { offset, bytes });
        drained?;

        if let Some(expected) = content_length.filter(|&len| len != 0) {
            if expected != read {
                return Err(Error::ContentLengthMismatch { read, expected });
            }
        }

        if status == StatusCode::OK && self.known_size.is_none() {
            info!(size = read, "full content received, size is now known");
            self.known_size = Some(read);
        }

        debug!(bytes = read, window_start = offset, "loaded window");
        Ok(())
    }

    /// Copy what the fresh window holds of `[offset, offset + length)` into `buf`.
    fn serve(&self, buf: &mut [u8], offset: u64, length: u64) -> Result<usize> {
        let window = self.window.as_ref().ok_or_else(Error::eof)?;
        if offset < window.offset || offset > window.end() {
            return Err(Error::eof());
        }
        let available = (window.end() - offset).min(length);
        let cached = window.slice(offset, available).ok_or_else(Error::eof)?;
        Ok(copy_prefix(buf, cached))
    }
}

/// Copy as much of `src` as fits into `dst`.
fn copy_prefix(dst: &mut [u8], src: &[u8]) -> usize {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}
