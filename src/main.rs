use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod forward;
mod handler;
mod headers;
mod request;
mod response;
mod server;
mod transport;
mod utils;

use config::{Cli, ProxyConfig};
use server::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forward_proxy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // SIGPIPE is already ignored by the Rust runtime; a peer closing during a
    // write shows up as a BrokenPipe error on that connection only.
    let server = Server::bind(ProxyConfig::from_cli(&cli)).await?;
    info!(address = %server.local_addr()?, "listening for connections");

    tokio::select! {
        () = server.serve() => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("shutting down");
        }
    }
    Ok(())
}
