//! The two-phase response contract.
//!
//! An application first declares its status and headers through
//! [`StartResponse`], then produces body sections. Nothing reaches the wire
//! until the first non-empty section, so the declaration can be replaced by
//! passing an error until that point. After the commit, an error passed to
//! `start_response` is handed straight back to the application.

use std::fmt;
use std::io;

use bytes::Bytes;

use crate::http::connection::Connection;
use crate::http::framer::{finalize_headers, serialize_head};
use crate::http::headers::{normalize_headers, normalize_status};
use crate::http::response::{Disposition, ErrorOverride, TransactionState};

#[derive(Debug)]
pub enum StartResponseError {
    /// Called a second time without an error to justify it
    HeadersAlreadySet,
    /// Called with an error after the headers were committed; carries that error
    HeadersSent(anyhow::Error),
}

impl fmt::Display for StartResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartResponseError::HeadersAlreadySet => {
                write!(f, "start_response called twice without an error")
            }
            StartResponseError::HeadersSent(e) => write!(f, "headers already sent: {}", e),
        }
    }
}

impl std::error::Error for StartResponseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartResponseError::HeadersAlreadySet => None,
            StartResponseError::HeadersSent(e) => Some(e.as_ref()),
        }
    }
}

/// Response side of one transaction: its state plus the socket it writes to.
pub(crate) struct ResponseChannel<'a> {
    pub(crate) state: TransactionState,
    conn: &'a mut dyn Connection,
}

impl<'a> ResponseChannel<'a> {
    pub(crate) fn new(state: TransactionState, conn: &'a mut dyn Connection) -> Self {
        Self { state, conn }
    }

    /// Sends one body section, committing the headers first if needed.
    ///
    /// Only a failed header write is an error. A failed body write marks the
    /// connection for closing and silences every later write.
    pub(crate) fn write(&mut self, data: Bytes, sections: Option<usize>) -> io::Result<()> {
        if self.state.status.is_none() && self.state.error.is_none() {
            tracing::warn!("Application produced a body without calling start_response");
            self.state.error = Some(ErrorOverride::internal(
                "start_response must be called before the body is produced.",
            ));
        }

        // Applies to every write, not just the one that commits.
        let data = match &self.state.error {
            Some(error) => {
                self.state.status = Some(error.status.clone());
                Bytes::from(error.message.clone())
            }
            None => data,
        };

        if !self.state.headers_sent {
            self.send_headers(data.len(), sections)?;
        }

        if self.state.head || self.state.write_failed || data.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.send_body(&data) {
            self.abandon(e);
        }

        Ok(())
    }

    /// Emits the terminating zero-length chunk when the body was chunked.
    pub(crate) fn finish(&mut self) {
        if !self.state.is_chunked() || self.state.head || self.state.write_failed {
            return;
        }

        if let Err(e) = self.conn.send_all(b"0\r\n\r\n") {
            self.abandon(e);
        }
    }

    fn send_headers(&mut self, first_chunk_len: usize, sections: Option<usize>) -> io::Result<()> {
        let status = self.state.status.clone().unwrap_or_default();
        let mut headers = self.state.headers.take().unwrap_or_default();

        let framing = finalize_headers(
            &mut headers,
            &status,
            first_chunk_len,
            sections,
            self.state.client_connection.as_deref(),
        );
        self.state.transfer_mode = framing.transfer_mode;
        self.state.disposition = framing.disposition;

        let head = serialize_head(&status, &headers);
        self.state.headers = Some(headers);

        tracing::debug!(
            status = %status,
            transfer_mode = ?framing.transfer_mode,
            disposition = ?framing.disposition,
            "Sending headers"
        );
        self.conn.send_all(&head)?;
        self.state.headers_sent = true;

        Ok(())
    }

    fn send_body(&mut self, data: &[u8]) -> io::Result<()> {
        if self.state.is_chunked() {
            self.conn.send_all(format!("{:x}\r\n", data.len()).as_bytes())?;
            self.conn.send_all(data)?;
            self.conn.send_all(b"\r\n")
        } else {
            self.conn.send_all(data)
        }
    }

    // Clients may hang up before the body is complete.
    fn abandon(&mut self, error: io::Error) {
        tracing::warn!(error = %error, "Client stopped receiving the response body");
        self.state.disposition = Disposition::Close;
        self.state.write_failed = true;
    }
}

/// Handle through which an application declares its response status and
/// headers.
pub struct StartResponse<'a> {
    channel: ResponseChannel<'a>,
}

impl<'a> StartResponse<'a> {
    pub(crate) fn new(channel: ResponseChannel<'a>) -> Self {
        Self { channel }
    }

    pub(crate) fn channel(&mut self) -> &mut ResponseChannel<'a> {
        &mut self.channel
    }

    pub(crate) fn into_state(self) -> TransactionState {
        self.channel.state
    }

    /// Declares the status (`"200 OK"`) and headers of the response.
    ///
    /// May succeed only once per transaction. Names must be ASCII and values
    /// Latin-1; a violation is not returned here but turns the response into
    /// a 500 once the body starts.
    pub fn start<I, K, V>(
        &mut self,
        status: &str,
        headers: I,
    ) -> Result<LegacyWriter<'_, 'a>, StartResponseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.declare(status, headers, None)
    }

    /// Replaces an earlier declaration because of `error`.
    ///
    /// Before the headers are committed the error is dropped and the new
    /// status and headers take effect. Afterwards the response can no longer
    /// change and `error` comes back as [`StartResponseError::HeadersSent`].
    pub fn start_with_error<I, K, V>(
        &mut self,
        status: &str,
        headers: I,
        error: anyhow::Error,
    ) -> Result<LegacyWriter<'_, 'a>, StartResponseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.declare(status, headers, Some(error))
    }

    pub fn headers_sent(&self) -> bool {
        self.channel.state.headers_sent
    }

    fn declare<I, K, V>(
        &mut self,
        status: &str,
        headers: I,
        error: Option<anyhow::Error>,
    ) -> Result<LegacyWriter<'_, 'a>, StartResponseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let state = &mut self.channel.state;

        match error {
            Some(error) if state.headers_sent => {
                return Err(StartResponseError::HeadersSent(error));
            }
            Some(error) => {
                tracing::debug!(error = %error, "Application replaced its response before commit");
            }
            None if state.headers.is_some() => {
                return Err(StartResponseError::HeadersAlreadySet);
            }
            None => {}
        }

        match normalize_status(status) {
            Ok(status) => state.status = Some(status),
            Err(e) => {
                tracing::warn!(error = %e, "Received invalid status from application");
                state.error = Some(ErrorOverride::internal("HTTP status must look like \"200 OK\"."));
            }
        }

        match normalize_headers(headers) {
            Ok(headers) => state.headers = Some(headers),
            Err(e) => {
                tracing::warn!(error = %e, "Received malformed HTTP headers from application");
                state.error = Some(ErrorOverride::internal(
                    "HTTP headers must be Latin-1 text with ASCII names.",
                ));
            }
        }

        Ok(LegacyWriter {
            channel: &mut self.channel,
        })
    }
}

/// Direct body writer returned by `start_response`.
///
/// Kept for applications written against the older push-style interface;
/// returning the body is preferred.
pub struct LegacyWriter<'s, 'a> {
    channel: &'s mut ResponseChannel<'a>,
}

impl LegacyWriter<'_, '_> {
    pub fn write(&mut self, data: impl Into<Bytes>) -> io::Result<()> {
        tracing::warn!(
            "Application called the write callable directly. This is obsolete behavior; return the body instead"
        );
        self.channel.write(data.into(), None)
    }
}
