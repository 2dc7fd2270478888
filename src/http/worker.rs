use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::Bytes;

use crate::app::{Application, Body};
use crate::config::WorkerConfig;
use crate::http::connection::Connection;
use crate::http::environ::BaseContext;
use crate::http::parser::ParseError;
use crate::http::response::{Disposition, ErrorOverride, TransactionState};
use crate::http::start_response::{ResponseChannel, StartResponse};

/// Why a transaction ended without a complete response.
#[derive(Debug)]
pub enum TransactionError {
    /// The request could not be read
    Request(ParseError),
    /// Acquiring the reader or writing the headers failed
    Io(io::Error),
    /// The application failed while being invoked or while producing its body
    Application(anyhow::Error),
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::Request(e) => write!(f, "request error: {}", e),
            TransactionError::Io(e) => write!(f, "IO error: {}", e),
            TransactionError::Application(e) => write!(f, "application error: {}", e),
        }
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransactionError::Request(e) => Some(e),
            TransactionError::Io(e) => Some(e),
            TransactionError::Application(e) => Some(e.as_ref()),
        }
    }
}

impl From<ParseError> for TransactionError {
    fn from(e: ParseError) -> Self {
        TransactionError::Request(e)
    }
}

impl From<io::Error> for TransactionError {
    fn from(e: io::Error) -> Self {
        TransactionError::Io(e)
    }
}

/// Serves the transactions of one connection at a time.
///
/// The application and base context are shared with every other worker;
/// all per-request state lives in a [`TransactionState`] created by
/// [`Worker::run_app`].
#[derive(Clone)]
pub struct Worker {
    app: Arc<dyn Application>,
    base: Arc<BaseContext>,
    buffer_size: usize,
}

impl Worker {
    /// Builds a worker around a shared application and base context.
    ///
    /// # Arguments
    ///
    /// * `app` - Application invoked once per request
    /// * `base` - Process-wide environment shared with the other workers
    /// * `config` - Supplies the request reader's buffer size
    pub fn new(app: Arc<dyn Application>, base: Arc<BaseContext>, config: &WorkerConfig) -> Self {
        Self {
            app,
            base,
            buffer_size: config.buffer_size,
        }
    }

    /// Builds a worker with a base context of its own.
    pub fn with_config(app: Arc<dyn Application>, config: &WorkerConfig) -> Self {
        Self::new(app, Arc::new(BaseContext::new(config)), config)
    }

    /// Process-wide context every request environment starts from.
    pub fn base(&self) -> &BaseContext {
        &self.base
    }

    /// Reads one request from `conn`, runs the application and writes its
    /// response.
    ///
    /// Returns whether the connection may carry another request. Errors from
    /// the application are returned after its body is closed and the request
    /// reader released.
    pub fn run_app<C: Connection>(&self, conn: &mut C) -> Result<Disposition, TransactionError> {
        tracing::debug!("Acquiring request reader");
        let reader = conn.make_reader(self.buffer_size)?;

        let mut environ = self.base.build_environ(reader, &*conn)?;
        let state = TransactionState::new(environ.request_method(), environ.client_connection());

        tracing::debug!(
            method = %environ.request_method(),
            path = %environ.path_info(),
            "Invoking application"
        );

        let mut start_response = StartResponse::new(ResponseChannel::new(state, conn));

        let mut output = match self.app.call(&mut environ, &mut start_response) {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(error = %e, "Application failed before returning a body");
                return Err(TransactionError::Application(e));
            }
        };

        let result = stream_body(start_response.channel(), &mut output);

        tracing::debug!("Closing application output and request reader");
        output.close();
        drop(environ);

        result?;

        Ok(start_response.into_state().disposition)
    }
}

fn stream_body(channel: &mut ResponseChannel<'_>, output: &mut Body) -> Result<(), TransactionError> {
    let sections = output.section_count();

    match output {
        Body::Sized(chunks) => {
            for chunk in std::mem::take(chunks) {
                // Empty sections never commit the headers.
                if !chunk.is_empty() {
                    channel.write(chunk, sections)?;
                }
            }
        }
        Body::Streaming(body) => {
            while let Some(chunk) = body.next_chunk() {
                let chunk = chunk.map_err(TransactionError::Application)?;
                if !chunk.is_empty() {
                    channel.write(chunk, sections)?;
                }
            }
        }
        Body::Unsupported => {
            tracing::warn!("Application returned a body that is neither sized nor iterable");
            channel.state.error = Some(ErrorOverride::internal(
                "Applications must return a list or generator type.",
            ));
        }
    }

    if !channel.state.headers_sent {
        channel.write(Bytes::new(), sections)?;
    }

    channel.finish();

    Ok(())
}
