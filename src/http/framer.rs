use std::collections::HashMap;
use std::time::SystemTime;

use crate::http::headers::{encode_latin1, status_code};
use crate::http::response::{Disposition, TransferMode};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Product token sent in the `Server` header unless the application set one.
pub const SERVER_SOFTWARE: &str = concat!("Gantry/", env!("CARGO_PKG_VERSION"));

/// Framing decisions fixed when the headers are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    pub transfer_mode: TransferMode,
    pub disposition: Disposition,
}

/// Completes the application's header set before it goes on the wire.
///
/// Adds `Date` and `Server` when missing, picks `Content-Length` or chunked
/// framing when the application gave no length, and appends the `Connection`
/// header. `first_chunk_len` is the size of the section that triggered the
/// commit; `sections` is the declared section count, if known.
pub fn finalize_headers(
    headers: &mut Vec<(String, String)>,
    status: &str,
    first_chunk_len: usize,
    sections: Option<usize>,
    client_connection: Option<&str>,
) -> Framing {
    // Lowercased view for lookups; later duplicates win.
    let folded: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
        .collect();

    let mut transfer_mode = match folded.get("transfer-encoding") {
        Some(te) if te.eq_ignore_ascii_case("chunked") => TransferMode::Chunked,
        _ => TransferMode::Identity,
    };

    if !folded.contains_key("date") {
        headers.push(("Date".to_string(), httpdate::fmt_http_date(SystemTime::now())));
    }

    if !folded.contains_key("server") {
        headers.push(("Server".to_string(), SERVER_SOFTWARE.to_string()));
    }

    if !folded.contains_key("content-length") {
        let code = status_code(status);
        let needs_framing = code.is_none_or(|s| s < 200 || !matches!(s, 204 | 205 | 304));

        if needs_framing && transfer_mode == TransferMode::Identity {
            if sections == Some(1) {
                headers.push(("Content-Length".to_string(), first_chunk_len.to_string()));
            } else {
                headers.push(("Transfer-Encoding".to_string(), "chunked".to_string()));
                transfer_mode = TransferMode::Chunked;
                tracing::debug!(status, ?sections, "Adding header Transfer-Encoding: chunked");
            }
        }
    }

    let app_connection = folded
        .get("connection")
        .map(|v| v.to_ascii_lowercase())
        .unwrap_or_default();
    let client_keep_alive =
        client_connection.is_some_and(|v| v.eq_ignore_ascii_case("keep-alive"));

    let disposition = if app_connection != "close" && client_keep_alive {
        headers.push(("Connection".to_string(), "keep-alive".to_string()));
        Disposition::KeepAlive
    } else {
        headers.push(("Connection".to_string(), "close".to_string()));
        Disposition::Close
    };

    Framing {
        transfer_mode,
        disposition,
    }
}

/// Serializes the status line and header block, blank line included.
pub fn serialize_head(status: &str, headers: &[(String, String)]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + headers.len() * 32);

    buf.extend_from_slice(HTTP_VERSION.as_bytes());
    buf.push(b' ');
    encode_latin1(status, &mut buf);
    buf.extend_from_slice(b"\r\n");

    for (k, v) in headers {
        encode_latin1(k, &mut buf);
        buf.extend_from_slice(b": ");
        encode_latin1(v, &mut buf);
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");
    buf
}
