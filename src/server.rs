use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::ProxyConfig;
use crate::error::Result;
use crate::handler::handle_client;

/// Accepts client connections and hands each one to its own task.
pub struct Server {
    listener: TcpListener,
    config: Arc<ProxyConfig>,
}

impl Server {
    pub async fn bind(config: ProxyConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr).await?;
        Ok(Server {
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop forever.
    ///
    /// Connection tasks are spawned detached and never counted or joined.
    pub async fn serve(self) {
        loop {
            let (mut socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    error!("accept error: {}", err);
                    continue;
                }
            };
            info!(%peer, "accepted connection");
            let config = Arc::clone(&self.config);
            tokio::spawn(async move {
                let outcome = handle_client(&mut socket, &config).await;
                debug!(%peer, ?outcome, "connection finished");
                if let Err(err) = socket.shutdown().await {
                    debug!(%peer, "client shutdown failed: {}", err);
                }
            });
        }
    }
}
