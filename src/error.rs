//! Error types for range reads.

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

/// Boxed error returned by a [`Transport`](crate::io::Transport) or a response [`Body`](crate::io::Body).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for range reader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by [`RangeReader`](crate::RangeReader).
///
/// [`Error::Eof`] is the routine "no more data" signal of a stream; every
/// other variant is either caller misuse or a genuine fault.
#[derive(Error, Debug)]
pub enum Error {
    /// No (more) data at the requested position. `read` is the number of
    /// bytes that were still copied into the caller's buffer.
    #[error("end of data after {read} bytes")]
    Eof { read: usize },

    #[error("invalid seek whence: {0}")]
    InvalidWhence(i32),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("read {read} bytes but content length indicated {expected}")]
    ContentLengthMismatch { read: u64, expected: u64 },

    #[error("no content length for size probe")]
    MissingContentLength,

    #[error("size probe failed with status: {0}")]
    UnexpectedStatus(StatusCode),
}

impl Error {
    /// End-of-data with nothing copied.
    pub fn eof() -> Self {
        Error::Eof { read: 0 }
    }

    pub(crate) fn transport(err: impl Into<BoxError>) -> Self {
        Error::Transport(err.into())
    }

    /// True for the end-of-data sentinel, whatever the partial count.
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Eof { .. })
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::Eof { .. } => io::ErrorKind::UnexpectedEof,
            Error::InvalidWhence(_) | Error::InvalidArgument(_) | Error::InvalidUrl { .. } => {
                io::ErrorKind::InvalidInput
            }
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
