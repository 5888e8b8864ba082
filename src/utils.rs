use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{ProxyError, Result};
use crate::request::Target;

/// Find the addresses of the host.
async fn lookup_addresses(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    let full_host = format!("{}:{}", host, port);
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(full_host).await?.collect();
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address found for {}", host),
        ));
    }
    Ok(addrs)
}

/// Open a connection to the origin named by `target`, trying each resolved
/// address in turn.
pub async fn connect_upstream(target: &Target) -> Result<TcpStream> {
    let upstream_error = |source: io::Error| ProxyError::Upstream {
        host: target.host.clone(),
        port: target.port,
        source,
    };
    let addrs = lookup_addresses(&target.host, target.port)
        .await
        .map_err(upstream_error)?;
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(socket) => return Ok(socket),
            Err(err) => {
                debug!(%addr, "connect attempt failed: {}", err);
                last_err = Some(err);
            }
        }
    }
    Err(upstream_error(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no address to connect to")
    })))
}

/// Copy the origin's response to the client until the origin closes.
///
/// A read error ends the copy just like end-of-stream; a client that stops
/// accepting writes ends it silently. Returns the number of bytes delivered.
pub async fn relay_response<U, C>(upstream: &mut U, client: &mut C, chunk: usize) -> u64
where
    U: AsyncRead + Unpin,
    C: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; chunk];
    let mut relayed = 0u64;
    loop {
        let c_size = match upstream.read(&mut buffer).await {
            Ok(0) => break,
            Ok(c_size) => c_size,
            Err(err) => {
                debug!("upstream read failed: {}", err);
                break;
            }
        };
        if let Err(err) = client.write_all(&buffer[..c_size]).await {
            debug!("client went away mid-transfer: {}", err);
            return relayed;
        }
        relayed += c_size as u64;
    }
    if let Err(err) = client.flush().await {
        debug!("client flush failed: {}", err);
    }
    relayed
}
