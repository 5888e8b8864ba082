use url::Url;

use crate::error::{ProxyError, Result};

/// Classification of the last line fed to a [`RequestParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// A well-formed request line.
    Request,
    /// A well-formed header line.
    Header,
    /// Malformed input.
    Error,
}

/// The struct for HTTP Request
#[derive(Debug, Clone)]
pub struct HTTPRequest {
    /// HTTP method of this request. Only `GET` is ever forwarded.
    pub method: String,
    /// The request target exactly as the client sent it.
    pub uri: String,
    /// The protocol named by the client, `HTTP/1.0` or `HTTP/1.1`.
    pub protocol: String,
}

/// Where a request has to be sent: origin host, port and the path to ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl HTTPRequest {
    /// Split the absolute request URI into the origin to contact and the path
    /// to request from it.
    pub fn target(&self) -> Result<Target> {
        let uri = Url::parse(&self.uri).map_err(|_| ProxyError::InvalidUri(self.uri.clone()))?;
        if uri.scheme() != "http" {
            return Err(ProxyError::InvalidUri(self.uri.clone()));
        }
        let host = match uri.host_str() {
            Some(host) if !host.is_empty() => String::from(host),
            _ => return Err(ProxyError::InvalidUri(self.uri.clone())),
        };
        let port = uri.port_or_known_default().unwrap_or(80);
        let path = match uri.query() {
            Some(query) => format!("{}?{}", uri.path(), query),
            None => String::from(uri.path()),
        };
        Ok(Target { host, port, path })
    }
}

/// Incremental classifier for the lines of one client request.
///
/// The first line must be a request line, every later line is a header.
#[derive(Debug, Default)]
pub struct RequestParser {
    request: Option<HTTPRequest>,
}

impl RequestParser {
    pub fn new() -> Self {
        RequestParser::default()
    }

    /// Classify `line`, recording the request line if it is one.
    pub fn parse_line(&mut self, line: &str) -> ParseState {
        let line = strip_terminator(line);
        if self.request.is_some() {
            return if is_header_line(line) {
                ParseState::Header
            } else {
                ParseState::Error
            };
        }
        match parse_request_line(line) {
            Some(request) => {
                self.request = Some(request);
                ParseState::Request
            }
            None => ParseState::Error,
        }
    }

    /// The parsed request, available once a request line has been accepted.
    pub fn request(&self) -> Option<&HTTPRequest> {
        self.request.as_ref()
    }
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

fn parse_request_line(line: &str) -> Option<HTTPRequest> {
    let items: Vec<&str> = line.split(' ').collect();
    if items.len() != 3 {
        return None;
    }
    let (method, uri, protocol) = (items[0], items[1], items[2]);
    if !is_token(method) || uri.is_empty() || uri.contains(char::is_whitespace) {
        return None;
    }
    if protocol != "HTTP/1.0" && protocol != "HTTP/1.1" {
        return None;
    }
    Some(HTTPRequest {
        method: String::from(method),
        uri: String::from(uri),
        protocol: String::from(protocol),
    })
}

fn is_header_line(line: &str) -> bool {
    match line.find(':') {
        Some(spliter) => is_token(&line[..spliter]),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> (ParseState, RequestParser) {
        let mut parser = RequestParser::new();
        let state = parser.parse_line(line);
        (state, parser)
    }

    #[test]
    fn request_line_fields() {
        let (state, parser) = parsed("GET http://example.com:8080/a/b?c=d HTTP/1.1\r\n");
        assert_eq!(state, ParseState::Request);
        let request = parser.request().unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.uri, "http://example.com:8080/a/b?c=d");
        assert_eq!(request.protocol, "HTTP/1.1");
        assert_eq!(
            request.target().unwrap(),
            Target {
                host: String::from("example.com"),
                port: 8080,
                path: String::from("/a/b?c=d"),
            }
        );
    }

    #[test]
    fn default_port_and_root_path() {
        let (_, parser) = parsed("GET http://example.com HTTP/1.0\r\n");
        let target = parser.request().unwrap().target().unwrap();
        assert_eq!(target.port, 80);
        assert_eq!(target.path, "/");
    }

    #[test]
    fn malformed_request_lines() {
        for line in [
            "\r\n",
            "GET\r\n",
            "GET http://example.com/\r\n",
            "GET http://example.com/ HTTP/2.0\r\n",
            "GET  http://example.com/ HTTP/1.0\r\n",
            "GET http://example.com/ HTTP/1.0 extra\r\n",
            "G(T http://example.com/ HTTP/1.0\r\n",
        ] {
            let (state, parser) = parsed(line);
            assert_eq!(state, ParseState::Error, "{:?}", line);
            assert!(parser.request().is_none());
        }
    }

    #[test]
    fn other_methods_still_parse() {
        let (state, parser) = parsed("POST http://example.com/ HTTP/1.0\r\n");
        assert_eq!(state, ParseState::Request);
        assert_eq!(parser.request().unwrap().method, "POST");
    }

    #[test]
    fn headers_after_request_line() {
        let mut parser = RequestParser::new();
        assert_eq!(parser.parse_line("GET http://a/ HTTP/1.0\r\n"), ParseState::Request);
        assert_eq!(parser.parse_line("Host: a\r\n"), ParseState::Header);
        assert_eq!(parser.parse_line("X-Empty:\r\n"), ParseState::Header);
        assert_eq!(parser.parse_line("no colon here\r\n"), ParseState::Error);
        assert_eq!(parser.parse_line(": no name\r\n"), ParseState::Error);
        assert_eq!(parser.parse_line("Bad Name: x\r\n"), ParseState::Error);
        assert_eq!(parser.parse_line("\r\n"), ParseState::Error);
        assert_eq!(parser.request().unwrap().uri, "http://a/");
    }

    #[test]
    fn header_before_request_line_is_an_error() {
        let (state, _) = parsed("Host: a\r\n");
        assert_eq!(state, ParseState::Error);
    }

    #[test]
    fn unsupported_targets() {
        for uri in ["/index.html", "https://example.com/", "example.com:443", "ftp://example.com/"] {
            let request = HTTPRequest {
                method: String::from("GET"),
                uri: String::from(uri),
                protocol: String::from("HTTP/1.0"),
            };
            assert!(
                matches!(request.target(), Err(ProxyError::InvalidUri(_))),
                "{}",
                uri
            );
        }
    }
}
