use std::io::{self, BufRead, Read};

/// Decodes a `Transfer-Encoding: chunked` request body into a flat stream.
pub struct ChunkedReader<R> {
    inner: R,
    /// Bytes left in the current chunk
    remaining: usize,
    done: bool,
}

impl<R: BufRead> ChunkedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            remaining: 0,
            done: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_size_line(&mut self) -> io::Result<usize> {
        let line = self.read_crlf_line()?;
        let size = line.split(';').next().unwrap_or("").trim();

        usize::from_str_radix(size, 16).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid chunk size line: {:?}", line),
            )
        })
    }

    fn read_crlf_line(&mut self) -> io::Result<String> {
        let mut buf = Vec::new();
        if self.inner.read_until(b'\n', &mut buf)? == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn skip_trailers(&mut self) -> io::Result<()> {
        while !self.read_crlf_line()?.is_empty() {}
        Ok(())
    }
}

impl<R: BufRead> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.done || buf.is_empty() {
            return Ok(0);
        }

        if self.remaining == 0 {
            self.remaining = self.read_size_line()?;

            if self.remaining == 0 {
                self.skip_trailers()?;
                self.done = true;
                return Ok(0);
            }
        }

        let want = buf.len().min(self.remaining);
        let n = self.inner.read(&mut buf[..want])?;

        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }

        self.remaining -= n;

        if self.remaining == 0 {
            // CRLF that closes the chunk data
            self.read_crlf_line()?;
        }

        Ok(n)
    }
}
