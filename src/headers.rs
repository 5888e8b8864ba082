//! Client headers that are passed through to the origin.
//!
//! Apart from the fixed headers the proxy writes itself, only two client
//! headers ever reach the origin, and only together.

/// Capture slot for a passed-through header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    RequestId,
    Response,
}

/// Header name prefixes, matched case-insensitively at the start of a line.
pub const SELECTED_HEADERS: &[(&str, Slot)] = &[
    ("Request-ID", Slot::RequestId),
    ("Response", Slot::Response),
];

/// Selected header lines captured while streaming a client header block.
#[derive(Debug, Default, Clone)]
pub struct HeaderSelection {
    request_id: Option<String>,
    response: Option<String>,
}

impl HeaderSelection {
    pub fn new() -> Self {
        HeaderSelection::default()
    }

    /// Capture `line` if it starts with a selected prefix. A later line for
    /// the same slot replaces the earlier one.
    pub fn observe(&mut self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);
        for (prefix, slot) in SELECTED_HEADERS {
            if starts_with_ignore_case(line, prefix) {
                let captured = Some(String::from(line));
                match slot {
                    Slot::RequestId => self.request_id = captured,
                    Slot::Response => self.response = captured,
                }
            }
        }
    }

    /// Both captured lines, without terminators, or `None` unless both slots
    /// were filled.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (&self.request_id, &self.response) {
            (Some(request_id), Some(response)) => Some((request_id, response)),
            _ => None,
        }
    }
}

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.len() >= prefix.len()
        && line.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
