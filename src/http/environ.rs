use std::collections::HashMap;
use std::io::{self, BufRead, Read};

use crate::app::FileWrapper;
use crate::config::WorkerConfig;
use crate::http::chunked::ChunkedReader;
use crate::http::connection::Connection;
use crate::http::parser::{self, ParseError};
use crate::logging::ErrorSink;

/// Gateway interface version advertised to applications.
pub const GATEWAY_VERSION: (u8, u8) = (1, 0);

/// Process-wide part of every request environment.
///
/// Built once per worker pool and shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct BaseContext {
    vars: HashMap<String, String>,
    multithread: bool,
}

/// Request body as seen by the application.
pub enum InputStream {
    Raw(Box<dyn BufRead + Send>),
    Chunked(ChunkedReader<Box<dyn BufRead + Send>>),
}

/// Execution context of a single request.
///
/// Holds the process environment, the CGI variables of the request, every
/// request header under its `HTTP_*` key, and the protocol extensions.
pub struct Environ {
    vars: HashMap<String, String>,
    client_connection: Option<String>,
    /// "http" or "https"
    pub url_scheme: String,
    /// Request body, already de-chunked when the client sent it chunked
    pub input: InputStream,
    /// Diagnostic stream for the application
    pub errors: ErrorSink,
    pub version: (u8, u8),
    pub multithread: bool,
    pub multiprocess: bool,
    pub run_once: bool,
}

impl BaseContext {
    /// Snapshots the process environment. Variables that are not valid
    /// UTF-8 are skipped.
    pub fn new(config: &WorkerConfig) -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::with_vars(vars, config)
    }

    /// Builds the context from an explicit set of variables instead of the
    /// process environment. `SERVER_NAME` always comes from `config`.
    pub fn with_vars<I>(vars: I, config: &WorkerConfig) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: HashMap<String, String> = vars.into_iter().collect();
        vars.insert("SERVER_NAME".to_string(), config.server_name.clone());

        Self {
            vars,
            multithread: config.multithread(),
        }
    }

    /// Looks up a process-wide variable.
    ///
    /// # Arguments
    ///
    /// * `key` - Variable name, e.g. `SERVER_NAME`
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the value if present, `None` otherwise.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn multithread(&self) -> bool {
        self.multithread
    }

    /// Reads the request line and headers from `reader` and assembles the
    /// request environment. The reader ends up as the environment's input.
    pub fn build_environ(
        &self,
        mut reader: Box<dyn BufRead + Send>,
        conn: &dyn Connection,
    ) -> Result<Environ, ParseError> {
        let request = parser::read_request_line(&mut *reader)?;
        let headers = parser::read_headers(&mut *reader)?;

        let mut vars = self.vars.clone();

        vars.insert("REQUEST_METHOD".to_string(), request.method);
        vars.insert("PATH_INFO".to_string(), request.path);
        vars.insert("SERVER_PROTOCOL".to_string(), request.protocol);
        vars.insert("SCRIPT_NAME".to_string(), String::new());
        vars.insert("SERVER_PORT".to_string(), conn.server_port().to_string());
        vars.insert("REMOTE_ADDR".to_string(), conn.client_address());
        vars.insert("QUERY_STRING".to_string(), request.query_string);

        // Present only when the client sent the matching header.
        vars.remove("CONTENT_LENGTH");
        vars.remove("CONTENT_TYPE");
        if let Some(length) = headers.get("HTTP_CONTENT_LENGTH") {
            vars.insert("CONTENT_LENGTH".to_string(), length.to_string());
        }
        if let Some(content_type) = headers.get("HTTP_CONTENT_TYPE") {
            vars.insert("CONTENT_TYPE".to_string(), content_type.to_string());
        }

        let chunked = headers
            .get("HTTP_TRANSFER_ENCODING")
            .is_some_and(|te| te.eq_ignore_ascii_case("chunked"));

        let input = if chunked {
            InputStream::Chunked(ChunkedReader::new(reader))
        } else {
            InputStream::Raw(reader)
        };

        let client_connection = headers.get("HTTP_CONNECTION").map(str::to_string);

        for (key, value) in headers.iter() {
            vars.insert(key.to_string(), value.to_string());
        }

        Ok(Environ {
            vars,
            client_connection,
            url_scheme: request.scheme,
            input,
            errors: ErrorSink::new(),
            version: GATEWAY_VERSION,
            multithread: self.multithread,
            multiprocess: false,
            run_once: false,
        })
    }
}

impl Environ {
    /// Looks up a variable of the request environment.
    ///
    /// # Arguments
    ///
    /// * `key` - CGI name (`PATH_INFO`) or normalized header key (`HTTP_HOST`)
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the value if present, `None` otherwise.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// The `Connection` header exactly as the client sent it, if it did.
    ///
    /// Unlike `get("HTTP_CONNECTION")` this never falls back to a process
    /// variable of the same name.
    pub fn client_connection(&self) -> Option<&str> {
        self.client_connection.as_deref()
    }

    /// Every variable in no particular order.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn request_method(&self) -> &str {
        self.get("REQUEST_METHOD").unwrap_or("")
    }

    pub fn path_info(&self) -> &str {
        self.get("PATH_INFO").unwrap_or("")
    }

    pub fn query_string(&self) -> &str {
        self.get("QUERY_STRING").unwrap_or("")
    }

    /// Streams `reader` as a response body in `block_size` pieces.
    pub fn file_wrapper<R: Read + Send>(&self, reader: R, block_size: usize) -> FileWrapper<R> {
        FileWrapper::new(reader, block_size)
    }
}

impl InputStream {
    pub fn is_chunked(&self) -> bool {
        matches!(self, InputStream::Chunked(_))
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputStream::Raw(r) => r.read(buf),
            InputStream::Chunked(r) => r.read(buf),
        }
    }
}
