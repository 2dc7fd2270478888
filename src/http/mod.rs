//! HTTP/1.1 transaction engine.
//!
//! A [`worker::Worker`] owns one connection at a time and runs its requests
//! one after another, each as a self-contained transaction.
//!
//! # Architecture
//!
//! - **`connection`**: The socket abstraction and the per-connection loop
//! - **`parser`**: Reads the request line and header block off the stream
//! - **`chunked`**: Decodes chunked request bodies for the application
//! - **`request`**: Request line and header map types
//! - **`environ`**: Builds the per-request execution context
//! - **`headers`**: Validates the status and headers supplied by the application
//! - **`start_response`**: The two-phase status/header declaration contract
//! - **`framer`**: Completes the header set and picks body framing
//! - **`response`**: Per-transaction state and framing types
//! - **`worker`**: The transaction controller
//!
//! # Transaction State Machine
//!
//! ```text
//!        ┌─────────────────┐
//!        │  BuildContext   │ ← Read request line + headers, build environ
//!        └──────┬──────────┘
//!               ▼
//!        ┌─────────────────┐
//!        │ InvokeApp       │ ← Application declares status/headers
//!        └──────┬──────────┘
//!               ▼
//!        ┌─────────────────┐
//!        │  StreamBody     │ ← First non-empty section commits headers
//!        └──────┬──────────┘
//!               ▼
//!        ┌─────────────────┐
//!        │   Finalize      │ ← Forced commit for empty bodies, last chunk
//!        └──────┬──────────┘
//!               ├─ KeepAlive → next transaction on the same connection
//!               └─ Close → connection dropped by the caller
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::net::TcpListener;
//! use std::sync::Arc;
//!
//! use gantry::app::{app_fn, Body};
//! use gantry::config::WorkerConfig;
//! use gantry::http::worker::Worker;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = WorkerConfig::load();
//!     let app = app_fn(|_environ, start_response| {
//!         start_response.start("200 OK", [("Content-Type", "text/html")])?;
//!         Ok(Body::sized(["<h1>It works</h1>"]))
//!     });
//!     let worker = Worker::with_config(Arc::new(app), &config);
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080")?;
//!     for stream in listener.incoming() {
//!         let mut stream = stream?;
//!         if let Err(e) = worker.serve(&mut stream) {
//!             eprintln!("Connection error: {}", e);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod chunked;
pub mod connection;
pub mod environ;
pub mod framer;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod start_response;
pub mod worker;
