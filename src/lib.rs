//! # rangeseek
//!
//! Random-access reads over HTTP using Range requests.
//!
//! [`RangeReader`] turns a remote resource into a seekable byte stream.
//! Reads are translated into `GET` requests with a `Range` header, and the
//! response body is kept as a single read-ahead window so that nearby reads
//! are answered without another round trip. The total size is discovered
//! lazily from a full-content response or a `HEAD` probe.
//!
//! ## Features
//!
//! - Sequential [`read`](RangeReader::read) with a cursor and [`seek`](RangeReader::seek)
//! - Positional [`read_at`](RangeReader::read_at) and [`read_range`](RangeReader::read_range)
//! - Minimum fetch size to amplify small reads (1 MiB by default)
//! - Pluggable [`Transport`], with a `reqwest` implementation by default
//! - [`RangeStream`] adapter implementing tokio's `AsyncRead + AsyncSeek`
//!
//! ## Example
//!
//! ```no_run
//! use rangeseek::{RangeReader, Whence};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut reader = RangeReader::new("https://example.com/archive.zip")?;
//!
//!     // Read the last 22 bytes (a ZIP end-of-central-directory record)
//!     reader.seek(-22, Whence::End).await?;
//!     let mut eocd = [0u8; 22];
//!     reader.read(&mut eocd).await?;
//!
//!     println!("size: {}", reader.size().await?);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod logging;

pub use cli::Cli;
pub use error::{Error, Result};
pub use io::{RangeReader, RangeStream, ReqwestTransport, Transport, Whence};
