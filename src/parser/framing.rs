//! Request framing under partial reads.
//!
//! A [`FrameBuffer`] accumulates the bytes of one connection and decides when
//! they form a complete request: the header block must be terminated by a
//! blank line and the bytes following it must cover the declared
//! `Content-Length` (zero when absent).

use crate::parser::error::Error;

/// Marker separating the header block from the body.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Progress of a connection through one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Nothing received yet.
    Accepted,
    /// Waiting for the header terminator.
    ReceivingHeaders,
    /// Headers are complete, the declared body is still arriving.
    ReceivingBody,
    /// The buffer holds a complete request.
    Complete,
}

/// Growable per-connection request buffer.
#[derive(Debug)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
    headers_complete: bool,
    content_length: u64,
    body_start: usize,
    // Bytes already searched for the terminator.
    scanned: usize,
    max_size: usize,
}

impl FrameBuffer {
    /// Create an empty buffer that refuses to grow beyond `max_size` bytes.
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            headers_complete: false,
            content_length: 0,
            body_start: 0,
            scanned: 0,
            max_size,
        }
    }

    /// Append a chunk read from the socket and report the resulting phase.
    ///
    /// Fails with [`Error::PayloadTooLarge`] as soon as the buffer grows past
    /// the size cap or the header block declares a larger `Content-Length`;
    /// the connection must then be dropped without a response.
    pub fn push(&mut self, chunk: &[u8]) -> Result<FramePhase, Error> {
        self.buffer.extend_from_slice(chunk);

        if self.buffer.len() > self.max_size {
            return Err(Error::PayloadTooLarge(self.buffer.len() as u64));
        }

        if !self.headers_complete {
            // The terminator may straddle the previous chunk boundary.
            let from = self.scanned.saturating_sub(HEADER_TERMINATOR.len() - 1);
            match find_subsequence(&self.buffer[from..], HEADER_TERMINATOR) {
                Some(pos) => {
                    let header_end = from + pos;
                    self.headers_complete = true;
                    self.body_start = header_end + HEADER_TERMINATOR.len();
                    self.content_length =
                        declared_content_length(&self.buffer[..header_end], self.max_size)?;
                }
                None => self.scanned = self.buffer.len(),
            }
        }

        Ok(self.phase())
    }

    /// Current phase of the buffered request.
    pub fn phase(&self) -> FramePhase {
        if !self.headers_complete {
            if self.buffer.is_empty() {
                FramePhase::Accepted
            } else {
                FramePhase::ReceivingHeaders
            }
        } else if self.body_len() >= self.content_length {
            FramePhase::Complete
        } else {
            FramePhase::ReceivingBody
        }
    }

    /// Whether the buffer holds a complete request.
    pub fn is_complete(&self) -> bool {
        self.phase() == FramePhase::Complete
    }

    pub fn headers_complete(&self) -> bool {
        self.headers_complete
    }

    /// Declared body length, zero until the headers are complete.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Offset of the first body byte, zero until the headers are complete.
    pub fn body_start(&self) -> usize {
        self.body_start
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The raw bytes received so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn body_len(&self) -> u64 {
        (self.buffer.len() - self.body_start) as u64
    }
}

/// Extract `Content-Length` (case-insensitive) from a header block.
///
/// Only the leading digits of the value count; absent or non-numeric values
/// count as zero.
fn declared_content_length(header_block: &[u8], max_size: usize) -> Result<u64, Error> {
    let block = String::from_utf8_lossy(header_block);

    for line in block.split("\r\n").skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("content-length") {
            continue;
        }

        let length = leading_digits(value);
        if length > max_size as u64 {
            return Err(Error::PayloadTooLarge(length));
        }
        return Ok(length);
    }

    Ok(0)
}

/// The number formed by the leading ASCII digits of `value` after leading
/// whitespace; `0` when there are none, `u64::MAX` on overflow.
pub(crate) fn leading_digits(value: &str) -> u64 {
    let value = value.trim_start();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let digits = &value[..end];
    if digits.is_empty() {
        return 0;
    }
    // All digits: a parse failure can only mean overflow.
    digits.parse::<u64>().unwrap_or(u64::MAX)
}

pub(crate) fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
