use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::{Error, Result};

/// Payload of the `io::Error` produced when a [`BoundedReader`] runs past
/// its ceiling.
#[derive(Debug, Error)]
#[error("max size exceeded")]
pub struct MaxSizeExceeded;

/// Returns true if `err` is the [`BoundedReader`] exceedance signal.
pub fn is_max_size_exceeded(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<MaxSizeExceeded>())
}

/// Wraps a reader and restricts the amount of data read to `max_size`
/// bytes, inclusive. Each read updates the running total; once the total
/// goes past the ceiling the reader reports [`MaxSizeExceeded`] instead of
/// whatever the inner reader produced, clean end-of-stream included, and
/// keeps reporting it on every later read.
pub struct BoundedReader<R> {
    inner: R,
    max_size: usize,
    bytes_read: usize,
}

impl<R> BoundedReader<R> {
    pub fn new(inner: R, max_size: usize) -> Self {
        Self {
            inner,
            max_size,
            bytes_read: 0,
        }
    }

    /// Total bytes consumed from the inner reader so far. Exact, never
    /// capped to `max_size`.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for BoundedReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let me = &mut *self;
        if me.bytes_read > me.max_size {
            return Poll::Ready(Err(io::Error::other(MaxSizeExceeded)));
        }
        let before = buf.filled().len();
        let result = Pin::new(&mut me.inner).poll_read(cx, buf);
        if result.is_ready() {
            me.bytes_read += buf.filled().len() - before;
            if me.bytes_read > me.max_size {
                return Poll::Ready(Err(io::Error::other(MaxSizeExceeded)));
            }
        }
        result
    }
}

/// Drains `reader` into a buffer through a [`BoundedReader`], mapping the
/// exceedance signal to [`Error::MaxSizeExceeded`].
pub(crate) async fn read_bounded<R>(reader: R, max_size: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BoundedReader::new(reader, max_size);
    let mut out = Vec::new();
    let mut buf = [0u8; 8 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(Error::from_read_error)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exact_ceiling_is_not_an_exceedance() {
        let data = [7u8; 16];
        let mut reader = BoundedReader::new(&data[..], 16);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out.len(), 16);
        assert_eq!(reader.bytes_read(), 16);
    }

    #[tokio::test]
    async fn under_ceiling_reads_cleanly() {
        let data = [0u8; 5];
        let mut reader = BoundedReader::new(&data[..], 100);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(reader.bytes_read(), 5);
    }

    #[tokio::test]
    async fn crossing_read_reports_exceedance_with_exact_total() {
        let data = [0u8; 10];
        let mut reader = BoundedReader::new(&data[..], 4);
        let mut buf = [0u8; 4];

        assert_eq!(reader.read(&mut buf).await.unwrap(), 4);
        assert_eq!(reader.bytes_read(), 4);

        let err = reader.read(&mut buf).await.unwrap_err();
        assert!(is_max_size_exceeded(&err));
        // The total reflects bytes actually consumed, not the ceiling.
        assert_eq!(reader.bytes_read(), 8);
    }

    #[tokio::test]
    async fn exceeded_reader_stays_exceeded() {
        let data = [0u8; 10];
        let mut reader = BoundedReader::new(&data[..], 2);
        let mut buf = [0u8; 8];

        let err = reader.read(&mut buf).await.unwrap_err();
        assert!(is_max_size_exceeded(&err));
        let total = reader.bytes_read();

        for _ in 0..3 {
            let err = reader.read(&mut buf).await.unwrap_err();
            assert!(is_max_size_exceeded(&err));
            assert_eq!(reader.bytes_read(), total);
        }
    }

    #[tokio::test]
    async fn read_bounded_returns_content() {
        let out = read_bounded(&b"hello"[..], 8).await.unwrap();
        assert_eq!(out, b"hello");
    }

    #[tokio::test]
    async fn read_bounded_maps_exceedance() {
        let data = [0u8; 9];
        let err = read_bounded(&data[..], 8).await.unwrap_err();
        assert!(matches!(err, Error::MaxSizeExceeded));
        assert!(err.is_cover_photo_rejected());
    }

    #[tokio::test]
    async fn read_bounded_passes_other_io_errors_through() {
        struct FailingReader;

        impl AsyncRead for FailingReader {
            fn poll_read(
                self: Pin<&mut Self>,
                _cx: &mut Context<'_>,
                _buf: &mut ReadBuf<'_>,
            ) -> Poll<io::Result<()>> {
                Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "boom")))
            }
        }

        let err = read_bounded(FailingReader, 8).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_cover_photo_rejected());
    }
}
