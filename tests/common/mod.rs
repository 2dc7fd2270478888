//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Cursor};
use std::sync::Arc;

use gantry::app::Application;
use gantry::config::WorkerConfig;
use gantry::http::connection::Connection;
use gantry::http::worker::Worker;

/// In-memory connection. Every transaction reads the next queued request.
pub struct MockConnection {
    requests: RefCell<VecDeque<Vec<u8>>>,
    pub output: Vec<u8>,
    /// Sends fail once the output would grow past this many bytes
    fail_after: Option<usize>,
}

impl MockConnection {
    pub fn new(request: &[u8]) -> Self {
        Self::with_requests(&[request])
    }

    pub fn with_requests(requests: &[&[u8]]) -> Self {
        Self {
            requests: RefCell::new(requests.iter().map(|r| r.to_vec()).collect()),
            output: Vec::new(),
            fail_after: None,
        }
    }

    pub fn failing_after(request: &[u8], limit: usize) -> Self {
        Self {
            fail_after: Some(limit),
            ..Self::new(request)
        }
    }

    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Status line and headers, without the blank line.
    pub fn head(&self) -> String {
        let text = self.output_str();
        match text.find("\r\n\r\n") {
            Some(end) => text[..end].to_string(),
            None => text,
        }
    }

    /// Everything after the header block.
    pub fn body(&self) -> Vec<u8> {
        match self.output.windows(4).position(|w| w == b"\r\n\r\n") {
            Some(end) => self.output[end + 4..].to_vec(),
            None => Vec::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.head().lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(": ")?;
            k.eq_ignore_ascii_case(name).then(|| v.to_string())
        })
    }
}

impl Connection for MockConnection {
    fn client_address(&self) -> String {
        "10.0.0.7".to_string()
    }

    fn server_port(&self) -> u16 {
        8080
    }

    fn make_reader(&self, _buffer_size: usize) -> io::Result<Box<dyn BufRead + Send>> {
        let next = self.requests.borrow_mut().pop_front().unwrap_or_default();
        Ok(Box::new(Cursor::new(next)))
    }

    fn send_all(&mut self, data: &[u8]) -> io::Result<()> {
        if let Some(limit) = self.fail_after {
            if self.output.len() + data.len() > limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer closed"));
            }
        }
        self.output.extend_from_slice(data);
        Ok(())
    }
}

pub fn worker(app: impl Application + 'static) -> Worker {
    Worker::with_config(Arc::new(app), &WorkerConfig::default())
}

pub const GET_KEEP_ALIVE: &[u8] = b"GET / HTTP/1.1\r\nHost: test\r\nConnection: keep-alive\r\n\r\n";
pub const GET_CLOSE: &[u8] = b"GET / HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n";
pub const GET_PLAIN: &[u8] = b"GET / HTTP/1.1\r\nHost: test\r\n\r\n";
pub const HEAD_KEEP_ALIVE: &[u8] = b"HEAD / HTTP/1.1\r\nHost: test\r\nConnection: keep-alive\r\n\r\n";
