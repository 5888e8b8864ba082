use std::net::{Ipv4Addr, SocketAddr};

use clap::Parser;

/// Identification sent upstream in place of the client's own `User-Agent`.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:3.10.0) Gecko/20230411 Firefox/63.0.1";

const MAX_LINE: usize = 8192;
const MAX_BUF: usize = 8192;

/// A forwarding HTTP/1.0 proxy for GET requests
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port the proxy listens on
    pub port: u16,
}

/// Settings shared read-only by every connection task.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub listen_addr: SocketAddr,
    pub user_agent: String,
    /// Upper bound for a single request or header line, terminator included.
    pub max_line: usize,
    /// Size of each chunk copied from the origin to the client.
    pub relay_chunk: usize,
    pub max_error_body: usize,
    pub max_error_head: usize,
}

impl ProxyConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        ProxyConfig {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, cli.port)),
            ..Default::default()
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            user_agent: String::from(USER_AGENT),
            max_line: MAX_LINE,
            relay_chunk: MAX_LINE,
            max_error_body: MAX_BUF,
            max_error_head: MAX_LINE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_port_argument() {
        let cli = Cli::try_parse_from(["forward-proxy", "15213"]).unwrap();
        let config = ProxyConfig::from_cli(&cli);
        assert_eq!(config.listen_addr.port(), 15213);
        assert!(config.listen_addr.ip().is_unspecified());
        assert_eq!(config.user_agent, USER_AGENT);
    }

    #[test]
    fn rejects_missing_or_extra_arguments() {
        assert!(Cli::try_parse_from(["forward-proxy"]).is_err());
        assert!(Cli::try_parse_from(["forward-proxy", "80", "81"]).is_err());
        assert!(Cli::try_parse_from(["forward-proxy", "http"]).is_err());
    }
}
