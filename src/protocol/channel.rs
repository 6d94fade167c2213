//! Framed message channel over any async byte stream.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::frame::{encode_header, parse_header, DEFAULT_HEADER_WIDTH};
use crate::error::FrameError;

/// Largest payload accepted unless configured otherwise.
const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Sends and receives length-prefixed messages on a byte stream.
#[derive(Debug)]
pub struct FramedChannel<S> {
    stream: S,
    header_width: usize,
    max_message_size: usize,
}

impl<S> FramedChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self::with_limits(stream, DEFAULT_HEADER_WIDTH, DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn with_limits(stream: S, header_width: usize, max_message_size: usize) -> Self {
        Self {
            stream,
            header_width,
            max_message_size,
        }
    }

    /// Write one message: the complete header first, then the payload.
    pub async fn send_message(&mut self, payload: &[u8]) -> Result<(), FrameError> {
        let header = encode_header(payload.len(), self.header_width)?;

        self.stream.write_all(&header).await?;
        self.stream.write_all(payload).await?;
        self.stream.flush().await?;

        trace!(len = payload.len(), "Sent frame");
        Ok(())
    }

    /// Read one message.
    ///
    /// Returns `Ok(None)` when the header is 0 or the peer closed the stream
    /// before sending any header byte.
    pub async fn receive_message(&mut self) -> Result<Option<Bytes>, FrameError> {
        match self.read_length().await? {
            Some(len) => self.read_payload(len).await.map(Some),
            None => Ok(None),
        }
    }

    /// Read and decode one length header. `None` means "no message".
    pub async fn read_length(&mut self) -> Result<Option<usize>, FrameError> {
        let mut header = vec![0u8; self.header_width];
        let mut filled = 0;

        while filled < header.len() {
            let n = self.stream.read(&mut header[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    trace!("Stream closed before header");
                    return Ok(None);
                }
                return Err(FrameError::ConnectionClosed);
            }
            filled += n;
        }

        let len = parse_header(&header)?;
        if len == 0 {
            return Ok(None);
        }
        if len > self.max_message_size {
            return Err(FrameError::FrameTooLarge {
                len,
                max: self.max_message_size,
            });
        }
        Ok(Some(len))
    }

    /// Read exactly `len` payload bytes following a header.
    pub async fn read_payload(&mut self, len: usize) -> Result<Bytes, FrameError> {
        let mut payload = BytesMut::zeroed(len);
        match self.stream.read_exact(&mut payload).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(FrameError::ConnectionClosed);
            }
            Err(e) => return Err(e.into()),
        }

        trace!(len, "Received frame");
        Ok(payload.freeze())
    }

    /// Shut down the write half so the peer sees EOF after the last message.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.stream.shutdown().await
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}
