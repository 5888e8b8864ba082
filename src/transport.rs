use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::error::{ProxyError, Result};

/// Buffered, line oriented reader over the client side of a connection.
///
/// Every line is bounded by `max_line` bytes so a client can never make the
/// proxy buffer an unbounded request or header line.
pub struct LineReader<R> {
    inner: BufReader<R>,
    max_line: usize,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(inner: R, max_line: usize) -> Self {
        LineReader {
            inner: BufReader::new(inner),
            max_line,
        }
    }

    /// Read one line including its `\n` terminator.
    ///
    /// Returns `Ok(None)` when the stream ends before any byte of a new line.
    /// A last line cut short by end-of-stream is returned without terminator.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = Vec::new();
        let n = (&mut self.inner)
            .take(self.max_line as u64)
            .read_until(b'\n', &mut line)
            .await?;
        if n == 0 {
            return Ok(None);
        }
        if line.last() != Some(&b'\n') && n >= self.max_line {
            return Err(ProxyError::LineTooLong {
                limit: self.max_line,
            });
        }
        String::from_utf8(line)
            .map(Some)
            .map_err(|_| ProxyError::NotUtf8)
    }
}
