use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;

use crate::http::parser::ParseError;
use crate::http::response::Disposition;
use crate::http::worker::{TransactionError, Worker};

/// The client socket a worker serves.
pub trait Connection {
    /// Peer address as it appears in `REMOTE_ADDR`.
    fn client_address(&self) -> String;

    fn server_port(&self) -> u16;

    /// A buffered reader over the incoming bytes, owned by one transaction.
    fn make_reader(&self, buffer_size: usize) -> io::Result<Box<dyn BufRead + Send>>;

    /// Writes every byte or fails.
    fn send_all(&mut self, data: &[u8]) -> io::Result<()>;
}

impl Connection for TcpStream {
    fn client_address(&self) -> String {
        self.peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default()
    }

    fn server_port(&self) -> u16 {
        self.local_addr().map(|addr| addr.port()).unwrap_or(0)
    }

    fn make_reader(&self, buffer_size: usize) -> io::Result<Box<dyn BufRead + Send>> {
        let stream = self.try_clone()?;
        Ok(Box::new(BufReader::with_capacity(buffer_size, stream)))
    }

    fn send_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data)
    }
}

enum ConnectionState {
    Transacting,
    Closed,
}

impl Worker {
    /// Runs transactions on `conn` until one ends with `Close` or the client
    /// hangs up between requests.
    ///
    /// Returns the number of completed transactions.
    pub fn serve<C: Connection>(&self, conn: &mut C) -> Result<usize, TransactionError> {
        let mut state = ConnectionState::Transacting;
        let mut completed = 0;

        loop {
            match state {
                ConnectionState::Transacting => match self.run_app(conn) {
                    Ok(disposition) => {
                        completed += 1;
                        if disposition == Disposition::Close {
                            state = ConnectionState::Closed;
                        }
                    }
                    Err(TransactionError::Request(ParseError::ConnectionClosed)) => {
                        tracing::debug!(completed, "Client closed connection");
                        state = ConnectionState::Closed;
                    }
                    Err(e) => return Err(e),
                },

                ConnectionState::Closed => break,
            }
        }

        Ok(completed)
    }
}
