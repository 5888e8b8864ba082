use bytes::{BufMut, Bytes, BytesMut};
use indoc::formatdoc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};

/// A complete HTML error document the proxy sends on its own behalf.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub reason: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: &str) -> Self {
        ErrorResponse {
            status_code: 400,
            reason: "Bad Request",
            message: String::from(message),
        }
    }

    pub fn not_implemented() -> Self {
        ErrorResponse {
            status_code: 501,
            reason: "Not Implemented",
            message: String::from("This proxy only supports the GET method."),
        }
    }

    pub fn connection_failed(uri: &str) -> Self {
        ErrorResponse {
            status_code: 502,
            reason: "Connection Failed",
            message: format!("Could not connect to {}. Try again later.", uri),
        }
    }

    fn get_body_text(&self, limit: usize) -> Result<String> {
        let body = formatdoc! {"
            <!DOCTYPE html>
            <html>
            <head><title>Proxy Error</title></head>
            <body>
            <h1>{code}: {reason}</h1>
            <p>{message}</p>
            <hr /><em>forward-proxy</em>
            </body></html>
            ",
            code = self.status_code,
            reason = self.reason,
            message = self.message,
        };
        if body.len() >= limit {
            return Err(ProxyError::ErrorPageTooLarge { limit });
        }
        Ok(body)
    }

    fn get_header_text(&self, body_len: usize, limit: usize) -> Result<String> {
        let head = format!(
            "HTTP/1.0 {} {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n",
            self.status_code, self.reason, body_len
        );
        if head.len() >= limit {
            return Err(ProxyError::ErrorPageTooLarge { limit });
        }
        Ok(head)
    }

    /// Build status line, headers and body, refusing to build anything that
    /// does not fit within the configured ceilings.
    pub fn build_message(&self, config: &ProxyConfig) -> Result<Bytes> {
        let body = self.get_body_text(config.max_error_body)?;
        let head = self.get_header_text(body.len(), config.max_error_head)?;
        let mut buf = BytesMut::with_capacity(head.len() + body.len());
        buf.put(head.as_bytes());
        buf.put(body.as_bytes());
        Ok(buf.freeze())
    }
}

/// Write `response` to `socket`. Oversized pages are dropped without sending
/// anything and write failures are only logged.
pub async fn send_error<W>(socket: &mut W, response: &ErrorResponse, config: &ProxyConfig)
where
    W: AsyncWrite + Unpin,
{
    let message = match response.build_message(config) {
        Ok(message) => message,
        Err(err) => {
            warn!(status = response.status_code, "dropping error page: {}", err);
            return;
        }
    };
    let written = async {
        socket.write_all(&message).await?;
        socket.flush().await
    };
    if let Err(err) = written.await {
        warn!(status = response.status_code, "failed to send error page: {}", err);
    }
}
