//! Stdio transport layer with LSP header framing.
//!
//! LSP uses a simple framing protocol over stdio:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```
//!
//! The reader and writer halves are split so the reader can live on its own
//! thread while the session keeps writing.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

use crate::errors::TransportError;

const CONTENT_LENGTH: &str = "content-length";

/// Largest message body accepted from the server.
pub const MAX_FRAME_LENGTH: usize = 64 * 1024 * 1024;

/// Reads LSP-framed messages.
pub struct MessageReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> MessageReader<R> {
    /// Wraps a byte stream, usually the server's stdout.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    /// Receives one message body (blocks until complete).
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between messages.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::MissingContentLength` if no Content-Length header is found,
    /// `TransportError::InvalidHeader` for a malformed header line,
    /// `TransportError::FrameTooLarge` when the announced body exceeds
    /// [`MAX_FRAME_LENGTH`] and `TransportError::Io` if reading fails or the
    /// stream ends mid-message.
    pub fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let Some(content_length) = self.read_headers()? else {
            return Ok(None);
        };
        if content_length > MAX_FRAME_LENGTH {
            return Err(TransportError::FrameTooLarge {
                length: content_length,
                limit: MAX_FRAME_LENGTH,
            });
        }
        let mut content = vec![0u8; content_length];
        self.reader.read_exact(&mut content)?;
        Ok(Some(content))
    }

    fn read_headers(&mut self) -> Result<Option<usize>, TransportError> {
        let mut content_length: Option<usize> = None;
        let mut seen_header = false;

        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                if seen_header {
                    return Err(TransportError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed while reading headers",
                    )));
                }
                return Ok(None);
            }
            seen_header = true;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            if let Some(length) = parse_content_length(trimmed)? {
                content_length = Some(length);
            }
        }

        content_length
            .map(Some)
            .ok_or(TransportError::MissingContentLength)
    }
}

/// Extracts the length from a `Content-Length` header; other headers yield `None`.
fn parse_content_length(header_line: &str) -> Result<Option<usize>, TransportError> {
    let (name, value) = header_line
        .split_once(':')
        .ok_or(TransportError::InvalidHeader)?;
    if !name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
        return Ok(None);
    }
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| TransportError::InvalidHeader)
}

/// Writes LSP-framed messages.
pub struct MessageWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> MessageWriter<W> {
    /// Wraps a byte sink, usually the server's stdin.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
        }
    }

    /// Sends an LSP-framed message.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if writing to the process fails.
    pub fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        let header = format!("Content-Length: {}\r\n\r\n", message.len());
        self.writer.write_all(header.as_bytes())?;
        self.writer.write_all(message)?;
        self.writer.flush()?;
        Ok(())
    }
}
