//! Line framing over a byte stream.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Accumulates raw reads until a full line is available.
///
/// Lines end at `\n`; a preceding `\r` is stripped so both network newlines and
/// bare newlines are accepted. The buffer is bounded: a peer that sends more
/// than `max_len` bytes without a terminator gets an `InvalidData` error.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    max_len: usize,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R, max_len: usize) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(max_len.min(1024)),
            max_len,
        }
    }

    /// Returns the next line without its terminator.
    ///
    /// `Ok(None)` means the peer closed the stream. A zero-length line is a
    /// valid `Some("")`, not a disconnect. Bytes left without a terminator when
    /// the stream closes are discarded.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut chunk = [0u8; 512];

        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            if self.buf.len() >= self.max_len {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line exceeds {} bytes", self.max_len),
                ));
            }

            let want = (self.max_len - self.buf.len()).min(chunk.len());
            let n = self.inner.read(&mut chunk[..want]).await?;
            if n == 0 {
                return Ok(None);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Number of bytes received but not yet returned as a line.
    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.buf.len()
    }
}
