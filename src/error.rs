use thiserror::Error;

/// Errors raised while serving a single proxied connection.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A read or write on one of the connections failed.
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    /// A request or header line did not end within the line limit.
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
    /// A request or header line is not valid UTF-8.
    #[error("line is not valid UTF-8")]
    NotUtf8,
    /// A line in the client's header block is not a well-formed header.
    #[error("malformed header line")]
    MalformedHeader,
    /// The request URI cannot be turned into an origin host, port and path.
    #[error("unsupported request URI: {0}")]
    InvalidUri(String),
    /// No address of the origin accepted a connection.
    #[error("upstream {host}:{port} is unreachable: {source}")]
    Upstream {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    /// A synthesized error page would not fit in its buffer.
    #[error("error page exceeds {limit} bytes")]
    ErrorPageTooLarge { limit: usize },
}

pub type Result<T> = std::result::Result<T, ProxyError>;
