//! Translation of a client request into the request sent to the origin.
//!
//! The origin always receives an `HTTP/1.0` request line, the proxy's own
//! fixed headers and at most the selected pass-through pair. Everything else
//! the client sent is consumed and dropped.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use crate::headers::HeaderSelection;
use crate::request::{HTTPRequest, ParseState, RequestParser, Target};
use crate::response::{send_error, ErrorResponse};
use crate::transport::LineReader;

const OUTBOUND_VERSION: &str = "HTTP/1.0";

/// The header block written to the origin in a single write.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    message: Bytes,
}

impl OutboundRequest {
    pub fn build(
        request: &HTTPRequest,
        target: &Target,
        selection: &HeaderSelection,
        user_agent: &str,
    ) -> Self {
        let mut ret = String::new();
        ret.push_str(&format!(
            "{} {} {}\r\n",
            request.method, target.path, OUTBOUND_VERSION
        ));
        ret.push_str(&format!("Host: {}:{}\r\n", target.host, target.port));
        ret.push_str(&format!("User-Agent: {}\r\n", user_agent));
        ret.push_str("Connection: close\r\n");
        ret.push_str("Proxy-Connection: close\r\n");
        if let Some((request_id, response)) = selection.pair() {
            ret.push_str(request_id);
            ret.push_str("\r\n");
            ret.push_str(response);
            ret.push_str("\r\n");
        }
        ret.push_str("\r\n");
        let mut message = BytesMut::with_capacity(ret.len());
        message.put(ret.as_bytes());
        OutboundRequest {
            message: message.freeze(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.message
    }
}

/// Consume the rest of the client's header block and send the rewritten
/// request to `upstream`.
///
/// A malformed header line answers the client with `400 Bad Request` before
/// the error is returned. Nothing reaches `upstream` unless the whole header
/// block was accepted.
pub async fn forward_request<R, C, U>(
    client_reader: &mut LineReader<R>,
    client: &mut C,
    upstream: &mut U,
    parser: &mut RequestParser,
    target: &Target,
    config: &ProxyConfig,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    C: AsyncWrite + Unpin,
    U: AsyncWrite + Unpin,
{
    let mut selection = HeaderSelection::new();
    loop {
        let line = match client_reader.read_line().await {
            Ok(Some(line)) => line,
            // Client stopped sending without a blank line; forward what we have.
            Ok(None) => break,
            Err(ProxyError::Io(err)) => {
                debug!("client header read failed: {}", err);
                return Err(ProxyError::Io(err));
            }
            Err(err) => {
                warn!("unreadable header line: {}", err);
                let response = ErrorResponse::bad_request("Failed to parse request headers");
                send_error(client, &response, config).await;
                return Err(err);
            }
        };
        if line == "\r\n" {
            break;
        }
        if parser.parse_line(&line) != ParseState::Header {
            warn!(line = line.trim_end(), "malformed header line");
            let response = ErrorResponse::bad_request("Failed to parse request headers");
            send_error(client, &response, config).await;
            return Err(ProxyError::MalformedHeader);
        }
        selection.observe(&line);
    }

    let request = match parser.request() {
        Some(request) => request,
        None => return Err(ProxyError::MalformedHeader),
    };
    let outbound = OutboundRequest::build(request, target, &selection, &config.user_agent);
    upstream.write_all(outbound.as_bytes()).await?;
    upstream.flush().await?;
    Ok(())
}
