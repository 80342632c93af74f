//! Connection state management.

use std::io;
use std::time::Instant;

use tokio::net::TcpStream;

use crate::address::Address;
use crate::parser::{FrameBuffer, FramePhase};

/// What a single read did to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadOutcome {
    /// Bytes were buffered; the request is now in this phase.
    Progress(FramePhase),
    /// Readiness was reported but no bytes were available.
    Spurious,
    /// The peer closed its side.
    PeerClosed,
    /// The buffer or the declared body exceeds the size cap.
    Overflow,
}

/// State of one accepted client, owned by the reactor.
pub(crate) struct Connection {
    /// TCP stream.
    pub stream: TcpStream,
    /// The peer.
    pub address: Address,
    /// Buffered request bytes and framing state.
    pub frame: FrameBuffer,
    /// When the connection was accepted.
    pub accepted_at: Instant,
}

impl Connection {
    pub fn new(stream: TcpStream, address: Address, max_request_size: usize) -> Self {
        Self {
            stream,
            address,
            frame: FrameBuffer::new(max_request_size),
            accepted_at: Instant::now(),
        }
    }

    /// Read at most one chunk without blocking and feed it to the framer.
    pub fn read_chunk(&mut self, chunk_size: usize) -> io::Result<ReadOutcome> {
        let mut chunk = vec![0u8; chunk_size];

        match self.stream.try_read(&mut chunk) {
            Ok(0) => Ok(ReadOutcome::PeerClosed),
            Ok(n) => match self.frame.push(&chunk[..n]) {
                Ok(phase) => Ok(ReadOutcome::Progress(phase)),
                Err(_) => Ok(ReadOutcome::Overflow),
            },
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(ReadOutcome::Spurious),
            Err(e) => Err(e),
        }
    }
}
