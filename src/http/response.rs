/// How body bytes are delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// Raw bytes, bounded by `Content-Length` or by closing the connection
    #[default]
    Identity,
    /// Hex-length-prefixed chunks ending with a zero-length chunk
    Chunked,
}

/// Whether the connection serves another request after this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    KeepAlive,
    #[default]
    Close,
}

/// Replacement status and body used once the application broke the response
/// contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorOverride {
    pub status: String,
    pub message: String,
}

impl ErrorOverride {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: "500 Internal Server Error".to_string(),
            message: message.into(),
        }
    }
}

/// Everything one transaction learns about its response.
///
/// Created fresh for every request so nothing leaks between transactions on
/// a reused connection.
#[derive(Debug, Clone, Default)]
pub struct TransactionState {
    pub status: Option<String>,
    /// `None` until `start_response` succeeds
    pub headers: Option<Vec<(String, String)>>,
    pub headers_sent: bool,
    pub error: Option<ErrorOverride>,
    pub transfer_mode: TransferMode,
    pub disposition: Disposition,
    /// Request method was HEAD: never send body bytes
    pub head: bool,
    /// Client's `Connection` request header
    pub client_connection: Option<String>,
    /// Set after a body write failed; nothing more goes to the socket
    pub write_failed: bool,
}

impl TransactionState {
    pub fn new(method: &str, client_connection: Option<&str>) -> Self {
        Self {
            head: method.eq_ignore_ascii_case("HEAD"),
            client_connection: client_connection.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn is_chunked(&self) -> bool {
        self.transfer_mode == TransferMode::Chunked
    }
}
