//! The interface between the worker and the hosted application.
//!
//! An application receives the request environment and a [`StartResponse`]
//! handle, declares its status and headers through the handle, and returns a
//! [`Body`] that the worker iterates and frames onto the wire.

use std::io::{self, Read};

use bytes::Bytes;

use crate::http::environ::Environ;
use crate::http::start_response::StartResponse;

/// A hosted application. One instance is shared by every worker, so it must
/// tolerate concurrent calls.
pub trait Application: Send + Sync {
    fn call(
        &self,
        environ: &mut Environ,
        start_response: &mut StartResponse<'_>,
    ) -> anyhow::Result<Body>;
}

/// Application backed by a closure. Build it with [`app_fn`].
#[derive(Clone)]
pub struct AppFn<F> {
    f: F,
}

/// Wraps a closure as an [`Application`].
///
/// ```
/// use gantry::app::{app_fn, Body};
///
/// let app = app_fn(|_environ, start_response| {
///     start_response.start("200 OK", [("Content-Type", "text/plain")])?;
///     Ok(Body::sized(["hello"]))
/// });
/// # let _ = app;
/// ```
pub fn app_fn<F>(f: F) -> AppFn<F>
where
    F: Fn(&mut Environ, &mut StartResponse<'_>) -> anyhow::Result<Body> + Send + Sync,
{
    AppFn { f }
}

impl<F> Application for AppFn<F>
where
    F: Fn(&mut Environ, &mut StartResponse<'_>) -> anyhow::Result<Body> + Send + Sync,
{
    fn call(
        &self,
        environ: &mut Environ,
        start_response: &mut StartResponse<'_>,
    ) -> anyhow::Result<Body> {
        (self.f)(environ, start_response)
    }
}

/// Lazily produced response sections.
pub trait ResponseBody: Send {
    /// Next section, or `None` once exhausted. Errors abort the transaction.
    fn next_chunk(&mut self) -> Option<anyhow::Result<Bytes>>;

    /// Releases whatever backs the body. Called exactly once by the worker,
    /// whether or not iteration finished.
    fn close(&mut self) {}
}

/// What an application hands back after `start_response`.
pub enum Body {
    /// A known number of sections. The count drives `Content-Length` framing.
    Sized(Vec<Bytes>),
    /// Sections of unknown count, pulled one at a time.
    Streaming(Box<dyn ResponseBody>),
    /// A value that is neither sized nor iterable. Adapters for foreign
    /// application types map such values here; the worker answers with a 500.
    Unsupported,
}

impl Body {
    pub fn empty() -> Self {
        Body::Sized(Vec::new())
    }

    pub fn sized<I, B>(sections: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Body::Sized(sections.into_iter().map(Into::into).collect())
    }

    pub fn stream<I>(sections: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::try_stream(sections.into_iter().map(Ok))
    }

    pub fn try_stream<I>(sections: I) -> Self
    where
        I: IntoIterator<Item = anyhow::Result<Bytes>>,
        I::IntoIter: Send + 'static,
    {
        Body::Streaming(Box::new(IterBody {
            iter: sections.into_iter(),
        }))
    }

    pub fn from_body(body: impl ResponseBody + 'static) -> Self {
        Body::Streaming(Box::new(body))
    }

    /// Number of sections when known up front.
    pub fn section_count(&self) -> Option<usize> {
        match self {
            Body::Sized(sections) => Some(sections.len()),
            Body::Streaming(_) | Body::Unsupported => None,
        }
    }

    pub(crate) fn close(&mut self) {
        if let Body::Streaming(body) = self {
            body.close();
        }
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Sized(sections) => f.debug_tuple("Sized").field(sections).finish(),
            Body::Streaming(_) => f.write_str("Streaming(..)"),
            Body::Unsupported => f.write_str("Unsupported"),
        }
    }
}

struct IterBody<I> {
    iter: I,
}

impl<I> ResponseBody for IterBody<I>
where
    I: Iterator<Item = anyhow::Result<Bytes>> + Send,
{
    fn next_chunk(&mut self) -> Option<anyhow::Result<Bytes>> {
        self.iter.next()
    }
}

/// Streams any reader in fixed-size blocks; the file-streaming extension
/// offered through the request environment.
pub struct FileWrapper<R> {
    reader: Option<R>,
    block_size: usize,
}

impl<R: Read + Send> FileWrapper<R> {
    pub const DEFAULT_BLOCK_SIZE: usize = 8192;

    pub fn new(reader: R, block_size: usize) -> Self {
        Self {
            reader: Some(reader),
            block_size: block_size.max(1),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }
}

impl<R: Read + Send> ResponseBody for FileWrapper<R> {
    fn next_chunk(&mut self) -> Option<anyhow::Result<Bytes>> {
        let reader = self.reader.as_mut()?;
        let mut block = vec![0; self.block_size];

        loop {
            match reader.read(&mut block) {
                Ok(0) => return None,
                Ok(n) => {
                    block.truncate(n);
                    return Some(Ok(Bytes::from(block)));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    fn close(&mut self) {
        self.reader = None;
    }
}
