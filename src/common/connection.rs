//! # TCP Connection Abstraction
//!
//! Provides a wrapper around byte streams with message framing for the control
//! channel.
//!
//! ## Wire Protocol
//!
//! Messages are sent with a 4-byte length prefix (big-endian) followed by JSON data:
//! ```text
//! [4 bytes: message length] [N bytes: JSON message data]
//! ```
//!
//! The prefix keeps message boundaries intact no matter how the transport
//! splits or coalesces segments.

use log::error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::error::{PollError, Result};

/// Largest frame accepted in either direction (64 KiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Stream wrapper with message framing support.
///
/// Generic over the underlying stream so the same framing runs over TCP in
/// production and over in-memory pipes in tests.
pub struct Connection<S = TcpStream> {
    stream: S,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an established stream.
    ///
    /// # Example
    /// ```ignore
    /// let stream = TcpStream::connect("127.0.0.1:50007").await?;
    /// let mut conn = Connection::new(stream);
    /// ```
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Read one raw frame.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))`: a complete frame payload
    /// - `Ok(None)`: the peer closed the connection between frames
    /// - `Err`: the peer vanished mid-frame, the frame was oversized, or I/O failed
    pub async fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mut length_buf = [0u8; 4];

        match self.stream.read_exact(&mut length_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let length = u32::from_be_bytes(length_buf) as usize;
        if length > MAX_FRAME_SIZE {
            error!(
                "❌ Frame too large: {} bytes (max: {} bytes)",
                length, MAX_FRAME_SIZE
            );
            return Err(PollError::TransportFailure(format!(
                "frame of {} bytes exceeds limit",
                length
            )));
        }

        let mut data = vec![0u8; length];
        self.stream.read_exact(&mut data).await?;
        Ok(Some(data))
    }

    /// Read one frame and decode it as `T`.
    ///
    /// A frame that does not decode is a [`PollError::MalformedRequest`]; the
    /// stream itself stays usable.
    pub async fn read_message<T>(&mut self) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.read_frame().await? {
            Some(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|_| PollError::MalformedRequest),
            None => Ok(None),
        }
    }

    /// Write one raw frame and flush it.
    pub async fn write_frame(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > MAX_FRAME_SIZE {
            return Err(PollError::TransportFailure(format!(
                "outgoing frame of {} bytes exceeds limit",
                data.len()
            )));
        }

        let length = data.len() as u32;
        self.stream.write_all(&length.to_be_bytes()).await?;
        self.stream.write_all(data).await?;
        self.stream.flush().await?;

        Ok(())
    }

    /// Serialize `message` to JSON and write it as one frame.
    pub async fn write_message<T>(&mut self, message: &T) -> Result<()>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec(message)
            .map_err(|e| PollError::TransportFailure(format!("encode failed: {}", e)))?;
        self.write_frame(&data).await
    }
}
