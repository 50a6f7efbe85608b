//! Bounded pass-through for append bodies.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures_core::Stream;

use crate::ByteStream;

/// Observes whether a [`MeteredStream`] hit its ceiling.
#[derive(Debug, Clone, Default)]
pub struct MeterHandle {
    overflowed: Arc<AtomicBool>,
}

impl MeterHandle {
    pub fn overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Acquire)
    }
}

/// Forwards chunks unchanged while the running total stays within `limit`.
///
/// The chunk that would cross the limit is not forwarded: the stream yields
/// an error instead and ends. Only a counter is kept, never the bytes.
pub struct MeteredStream {
    inner: ByteStream,
    limit: Option<u64>,
    seen: u64,
    finished: bool,
    handle: MeterHandle,
}

impl MeteredStream {
    /// `None` means unbounded: bytes pass through uncounted.
    pub fn new(inner: ByteStream, limit: Option<u64>) -> Self {
        Self {
            inner,
            limit,
            seen: 0,
            finished: false,
            handle: MeterHandle::default(),
        }
    }

    pub fn handle(&self) -> MeterHandle {
        self.handle.clone()
    }

    pub fn into_byte_stream(self) -> ByteStream {
        Box::pin(self)
    }
}

impl Stream for MeteredStream {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        let Some(limit) = this.limit else {
            return this.inner.as_mut().poll_next(cx);
        };

        match ready!(this.inner.as_mut().poll_next(cx)) {
            Some(Ok(chunk)) => {
                let total = this.seen.saturating_add(chunk.len() as u64);
                if total > limit {
                    this.finished = true;
                    this.handle.overflowed.store(true, Ordering::Release);
                    return Poll::Ready(Some(Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Stream exceeded specified max of {} bytes.", limit),
                    ))));
                }
                this.seen = total;
                Poll::Ready(Some(Ok(chunk)))
            }
            other => Poll::Ready(other),
        }
    }
}
