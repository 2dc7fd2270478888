//! Log subscriber setup and the application error sink.

use std::io;

use tracing::Level;

/// Installs a global `fmt` subscriber capped at `level`.
///
/// Fails on an unknown level name or when a subscriber is already installed.
pub fn init(level: &str) -> anyhow::Result<()> {
    let level: Level = level
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown log level: {level}"))?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

/// Error stream handed to applications in every request environment.
///
/// Each complete line is emitted as an error event under the `gantry::app`
/// target; a trailing partial line is emitted on flush or drop.
#[derive(Debug, Default)]
pub struct ErrorSink {
    pending: Vec<u8>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(line: &[u8]) {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches('\r');
        tracing::error!(target: "gantry::app", "{}", line);
    }
}

impl io::Write for ErrorSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);

        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            Self::emit(&line[..line.len() - 1]);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            Self::emit(&line);
        }
        Ok(())
    }
}

impl Drop for ErrorSink {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}
