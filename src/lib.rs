//! Gantry - HTTP/1.1 application gateway worker
//!
//! Core library: request environment construction, the two-phase response
//! contract and HTTP/1.1 response framing.

pub mod app;
pub mod config;
pub mod http;
pub mod logging;
