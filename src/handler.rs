use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::forward::forward_request;
use crate::request::{ParseState, RequestParser};
use crate::response::{send_error, ErrorResponse};
use crate::transport::LineReader;
use crate::utils::{connect_upstream, relay_response};

/// How a single client connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The client went away before sending a request line.
    Disconnected,
    /// Answered with `400 Bad Request`.
    BadRequest,
    /// Answered with `501 Not Implemented`.
    NotImplemented,
    /// Answered with `502 Connection Failed`.
    UpstreamUnreachable,
    /// The client's header block could not be forwarded.
    ForwardAborted,
    /// The origin's response was relayed to the client.
    Relayed { bytes: u64 },
}

/// Serve exactly one request on `client`.
///
/// The upstream connection, when one is opened, is closed before returning.
/// Closing `client` is left to the caller.
pub async fn handle_client<S>(client: &mut S, config: &ProxyConfig) -> Outcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (client_rd, mut client_wr) = tokio::io::split(client);
    let mut client_reader = LineReader::new(client_rd, config.max_line);

    let line = match client_reader.read_line().await {
        Ok(Some(line)) => line,
        Ok(None) => return Outcome::Disconnected,
        Err(ProxyError::Io(err)) => {
            debug!("client read failed: {}", err);
            return Outcome::Disconnected;
        }
        Err(err) => {
            warn!("unreadable request line: {}", err);
            let response = ErrorResponse::bad_request("The proxy received a malformed request");
            send_error(&mut client_wr, &response, config).await;
            return Outcome::BadRequest;
        }
    };

    let mut parser = RequestParser::new();
    let request = match parser.parse_line(&line) {
        ParseState::Request => match parser.request() {
            Some(request) => request.clone(),
            None => return Outcome::BadRequest,
        },
        _ => {
            warn!(line = line.trim_end(), "malformed request line");
            let response = ErrorResponse::bad_request("The proxy received a malformed request");
            send_error(&mut client_wr, &response, config).await;
            return Outcome::BadRequest;
        }
    };

    if request.method != "GET" {
        warn!(method = %request.method, uri = %request.uri, "unsupported method");
        send_error(&mut client_wr, &ErrorResponse::not_implemented(), config).await;
        return Outcome::NotImplemented;
    }

    let target = match request.target() {
        Ok(target) => target,
        Err(err) => {
            warn!(uri = %request.uri, "{}", err);
            let response =
                ErrorResponse::bad_request("The request URI must be an absolute http:// URL");
            send_error(&mut client_wr, &response, config).await;
            return Outcome::BadRequest;
        }
    };

    let mut upstream = match connect_upstream(&target).await {
        Ok(upstream) => upstream,
        Err(err) => {
            warn!(uri = %request.uri, "{}", err);
            let response = ErrorResponse::connection_failed(&request.uri);
            send_error(&mut client_wr, &response, config).await;
            return Outcome::UpstreamUnreachable;
        }
    };
    info!(host = %target.host, port = target.port, path = %target.path, "connected to upstream");

    if let Err(err) = forward_request(
        &mut client_reader,
        &mut client_wr,
        &mut upstream,
        &mut parser,
        &target,
        config,
    )
    .await
    {
        debug!(uri = %request.uri, "forwarding aborted: {}", err);
        return Outcome::ForwardAborted;
    }

    let bytes = relay_response(&mut upstream, &mut client_wr, config.relay_chunk).await;
    if let Err(err) = upstream.shutdown().await {
        debug!("upstream shutdown failed: {}", err);
    }
    info!(uri = %request.uri, version = %request.protocol, bytes, "relayed response");
    Outcome::Relayed { bytes }
}
