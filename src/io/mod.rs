mod range;
mod stream;
mod transport;

pub use range::{DEFAULT_MIN_FETCH, RangeReader};
pub use stream::RangeStream;
pub use transport::{
    Body, BytesBody, DEFAULT_TIMEOUT, Request, Response, ReqwestTransport, Transport,
};

use crate::error::Error;

/// Reference point for [`RangeReader::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Offset from the start of the resource
    Start,
    /// Offset from the current cursor
    Current,
    /// Offset from the end of the resource; resolves the size first
    End,
}

/// Numeric whence values `0`, `1` and `2`, as used by `lseek`.
impl TryFrom<i32> for Whence {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            other => Err(Error::InvalidWhence(other)),
        }
    }
}
