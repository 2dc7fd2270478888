use std::fmt;
use std::io::{self, BufRead};

use crate::http::request::{HeaderMap, RequestLine, RequestLineBuilder};

#[derive(Debug)]
pub enum ParseError {
    /// The peer closed the connection before sending a request
    ConnectionClosed,
    InvalidRequestLine,
    InvalidHeader,
    /// The stream ended inside the header block
    UnexpectedEof,
    Io(io::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::ConnectionClosed => write!(f, "connection closed by client"),
            ParseError::InvalidRequestLine => write!(f, "malformed request line"),
            ParseError::InvalidHeader => write!(f, "malformed header line"),
            ParseError::UnexpectedEof => write!(f, "connection closed inside header block"),
            ParseError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io(e)
    }
}

/// Reads the request line, tolerating a single empty line before it.
pub fn read_request_line(reader: &mut dyn BufRead) -> Result<RequestLine, ParseError> {
    let mut line = read_line(reader)?.ok_or(ParseError::ConnectionClosed)?;
    if line.is_empty() {
        line = read_line(reader)?.ok_or(ParseError::ConnectionClosed)?;
    }

    let mut parts = line.split_whitespace();

    let method = parts.next().ok_or(ParseError::InvalidRequestLine)?;
    let target = parts.next().ok_or(ParseError::InvalidRequestLine)?;
    let protocol = parts.next().ok_or(ParseError::InvalidRequestLine)?;

    if parts.next().is_some() || !protocol.starts_with("HTTP/") {
        return Err(ParseError::InvalidRequestLine);
    }

    let (scheme, path, query) = split_target(target)?;

    RequestLineBuilder::new()
        .method(method)
        .path(path)
        .protocol(protocol)
        .scheme(scheme)
        .query_string(query)
        .build()
        .map_err(|_| ParseError::InvalidRequestLine)
}

/// Reads header lines up to and including the blank separator line.
pub fn read_headers(reader: &mut dyn BufRead) -> Result<HeaderMap, ParseError> {
    let mut headers = HeaderMap::new();

    loop {
        let line = read_line(reader)?.ok_or(ParseError::UnexpectedEof)?;

        if line.is_empty() {
            break;
        }

        // obs-fold continuation
        if line.starts_with(' ') || line.starts_with('\t') {
            let previous = headers.last_mut().ok_or(ParseError::InvalidHeader)?;
            previous.push(' ');
            previous.push_str(line.trim());
            continue;
        }

        let (key, value) = line
            .split_once(':')
            .ok_or(ParseError::InvalidHeader)?;

        if key.trim().is_empty() {
            return Err(ParseError::InvalidHeader);
        }

        headers.append(key, value.trim());
    }

    Ok(headers)
}

fn split_target(target: &str) -> Result<(String, String, String), ParseError> {
    let lower = target.get(..8).unwrap_or(target).to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        let url = url::Url::parse(target).map_err(|_| ParseError::InvalidRequestLine)?;
        return Ok((
            url.scheme().to_string(),
            url.path().to_string(),
            url.query().unwrap_or("").to_string(),
        ));
    }

    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    Ok(("http".to_string(), path.to_string(), query.to_string()))
}

/// Returns `None` at end of stream. Line endings are stripped and bytes are
/// decoded as Latin-1.
fn read_line(reader: &mut dyn BufRead) -> Result<Option<String>, ParseError> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf)?;

    if n == 0 {
        return Ok(None);
    }

    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }

    Ok(Some(buf.iter().map(|&b| b as char).collect()))
}
