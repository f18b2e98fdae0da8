use std::future::Future;
use std::io::{self, SeekFrom};
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use super::range::RangeReader;
use super::transport::Transport;
use crate::error::{Error, Result};

/// A boxed operation that owns the reader until it completes.
type Pending<T, O> = Pin<Box<dyn Future<Output = (RangeReader<T>, O)> + Send>>;

enum State<T> {
    Idle(RangeReader<T>),
    /// Read at the recorded offset into an owned chunk
    Reading(Pending<T, (i64, Vec<u8>, Result<usize>)>),
    Seeking(Pending<T, Result<i64>>),
    /// Only observed if an operation panicked
    Poisoned,
}

/// [`RangeReader`] as a tokio `AsyncRead + AsyncSeek` stream.
///
/// End-of-data surfaces as a zero-length read. Seeking to a negative
/// position fails with `InvalidInput` and leaves the position unchanged.
pub struct RangeStream<T> {
    state: State<T>,
}

// The reader is only ever moved into boxed futures, never pinned in place.
impl<T> Unpin for RangeStream<T> {}

impl<T: Transport + 'static> RangeStream<T> {
    pub fn new(reader: RangeReader<T>) -> Self {
        Self {
            state: State::Idle(reader),
        }
    }

    /// The reader, unless a read or seek is in flight.
    pub fn get_ref(&self) -> Option<&RangeReader<T>> {
        match &self.state {
            State::Idle(reader) => Some(reader),
            _ => None,
        }
    }

    /// Unwrap the reader, unless a read or seek is in flight.
    pub fn into_inner(self) -> Option<RangeReader<T>> {
        match self.state {
            State::Idle(reader) => Some(reader),
            _ => None,
        }
    }
}

fn busy() -> io::Error {
    io::Error::other("another read or seek is in progress")
}

fn poisoned() -> io::Error {
    io::Error::other("range stream is unusable after a panic")
}

fn to_position(position: i64) -> io::Result<u64> {
    u64::try_from(position)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "negative stream position"))
}

impl<T: Transport + 'static> AsyncRead for RangeStream<T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            match mem::replace(&mut this.state, State::Poisoned) {
                State::Idle(mut reader) => {
                    let len = buf.remaining();
                    if len == 0 {
                        this.state = State::Idle(reader);
                        return Poll::Ready(Ok(()));
                    }
                    this.state = State::Reading(Box::pin(async move {
                        let offset = reader.position();
                        let mut chunk = vec![0u8; len];
                        let result = match reader.read_at(&mut chunk, offset).await {
                            Err(Error::Eof { read }) => Ok(read),
                            other => other,
                        };
                        (reader, (offset, chunk, result))
                    }));
                }
                State::Reading(mut op) => match op.as_mut().poll(cx) {
                    Poll::Pending => {
                        this.state = State::Reading(op);
                        return Poll::Pending;
                    }
                    Poll::Ready((mut reader, (offset, chunk, result))) => {
                        let outcome = result.map(|n| {
                            let n = n.min(buf.remaining());
                            buf.put_slice(&chunk[..n]);
                            reader.set_position(offset.saturating_add(n as i64));
                        });
                        this.state = State::Idle(reader);
                        return Poll::Ready(outcome.map_err(io::Error::from));
                    }
                },
                State::Seeking(op) => {
                    this.state = State::Seeking(op);
                    return Poll::Ready(Err(busy()));
                }
                State::Poisoned => return Poll::Ready(Err(poisoned())),
            }
        }
    }
}

impl<T: Transport + 'static> AsyncSeek for RangeStream<T> {
    fn start_seek(self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        let this = self.get_mut();
        match mem::replace(&mut this.state, State::Poisoned) {
            State::Idle(mut reader) => {
                this.state = State::Seeking(Box::pin(async move {
                    let previous = reader.position();
                    let result = match reader.seek_from(position).await {
                        Ok(target) if target < 0 => {
                            reader.set_position(previous);
                            Err(Error::InvalidArgument("seek to a negative position"))
                        }
                        other => other,
                    };
                    (reader, result)
                }));
                Ok(())
            }
            State::Poisoned => Err(poisoned()),
            other => {
                this.state = other;
                Err(busy())
            }
        }
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        let this = self.get_mut();
        match mem::replace(&mut this.state, State::Poisoned) {
            State::Idle(reader) => {
                let position = reader.position();
                this.state = State::Idle(reader);
                Poll::Ready(to_position(position))
            }
            State::Seeking(mut op) => match op.as_mut().poll(cx) {
                Poll::Pending => {
                    this.state = State::Seeking(op);
                    Poll::Pending
                }
                Poll::Ready((reader, result)) => {
                    this.state = State::Idle(reader);
                    Poll::Ready(result.map_err(io::Error::from).and_then(to_position))
                }
            },
            // An abandoned read never moved the cursor; finish it and drop the bytes.
            State::Reading(mut op) => match op.as_mut().poll(cx) {
                Poll::Pending => {
                    this.state = State::Reading(op);
                    Poll::Pending
                }
                Poll::Ready((reader, _)) => {
                    let position = reader.position();
                    this.state = State::Idle(reader);
                    Poll::Ready(to_position(position))
                }
            },
            State::Poisoned => Poll::Ready(Err(poisoned())),
        }
    }
}
