//! Validation of the status line and header pairs an application supplies.
//!
//! Names must be 7-bit ASCII and values must be representable in Latin-1,
//! since both go onto the wire one byte per character.

use std::fmt;

/// A status or header the application handed over that cannot be put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    NonAsciiName(String),
    NonLatin1Value { name: String },
    /// CR or LF inside a name or value
    LineBreak { name: String },
    EmptyName,
    InvalidStatus(String),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::NonAsciiName(name) => write!(f, "header name {:?} is not ASCII", name),
            HeaderError::NonLatin1Value { name } => {
                write!(f, "value of header {:?} is not Latin-1", name)
            }
            HeaderError::LineBreak { name } => {
                write!(f, "header {:?} contains a line break", name)
            }
            HeaderError::EmptyName => write!(f, "empty header name"),
            HeaderError::InvalidStatus(status) => write!(f, "invalid status line {:?}", status),
        }
    }
}

impl std::error::Error for HeaderError {}

/// Trims and validates every `(name, value)` pair, keeping their order.
pub fn normalize_headers<I, K, V>(pairs: I) -> Result<Vec<(String, String)>, HeaderError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|(name, value)| normalize_pair(name.as_ref(), value.as_ref()))
        .collect()
}

fn normalize_pair(name: &str, value: &str) -> Result<(String, String), HeaderError> {
    let name = name.trim();
    let value = value.trim();

    if name.is_empty() {
        return Err(HeaderError::EmptyName);
    }
    if !name.is_ascii() {
        return Err(HeaderError::NonAsciiName(name.to_string()));
    }
    if !is_latin1(value) {
        return Err(HeaderError::NonLatin1Value { name: name.to_string() });
    }
    if has_line_break(name) || has_line_break(value) {
        return Err(HeaderError::LineBreak { name: name.to_string() });
    }

    Ok((name.to_string(), value.to_string()))
}

/// Checks that `status` reads like `"200 OK"` and returns it trimmed.
pub fn normalize_status(status: &str) -> Result<String, HeaderError> {
    let status = status.trim();
    let code = status.split(' ').next().unwrap_or("");

    let valid = code.len() == 3
        && code.bytes().all(|b| b.is_ascii_digit())
        && is_latin1(status)
        && !has_line_break(status);

    if !valid {
        return Err(HeaderError::InvalidStatus(status.to_string()));
    }

    Ok(status.to_string())
}

/// Numeric code of a status line such as `"404 Not Found"`.
pub fn status_code(status: &str) -> Option<u16> {
    status.split(' ').next()?.parse().ok()
}

/// Encodes validated text one byte per character.
pub(crate) fn encode_latin1(text: &str, out: &mut Vec<u8>) {
    out.extend(text.chars().map(|c| c as u32 as u8));
}

fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| (c as u32) <= 0xFF)
}

fn has_line_break(text: &str) -> bool {
    text.contains(['\r', '\n'])
}
