//! Length-prefixed framing for RRI messages.
//!
//! Every message on the wire is a 4-byte big-endian length followed by
//! that many bytes of UTF-8 text:
//!
//! ```text
//! +----------------+---------------------------+
//! | length (4 BE)  | payload (key: value lines) |
//! +----------------+---------------------------+
//! ```

use crate::error::FrameError;
use crate::{FRAME_HEADER_SIZE, MAX_PAYLOAD_SIZE};
use bytes::{BufMut, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Encodes a text payload into a frame.
///
/// The protocol maximum is not enforced here; peers reject oversized frames
/// on read. Only payloads whose length cannot be expressed in the 4-byte
/// prefix fail.
pub fn encode_frame(payload: &str) -> Result<BytesMut, FrameError> {
    let len = length_prefix(payload.len())?;
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.put_u32(len);
    buf.put_slice(payload.as_bytes());
    Ok(buf)
}

fn length_prefix(size: usize) -> Result<u32, FrameError> {
    u32::try_from(size).map_err(|_| FrameError::LengthOverflow { size })
}

/// Encodes `payload` and writes the whole frame to `stream`.
pub async fn write_frame<W>(stream: &mut W, payload: &str) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload)?;
    stream.write_all(&frame).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads exactly `n` bytes, however the stream chooses to chunk them.
///
/// Returns `UnexpectedEof` if the stream ends first. There is no timeout;
/// callers wanting one wrap the surrounding exchange.
pub async fn read_exact<R>(stream: &mut R, n: usize) -> io::Result<BytesMut>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::zeroed(n);
    let mut filled = 0;

    while filled < n {
        match stream.read(&mut buf[filled..]).await {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("stream closed after {} of {} bytes", filled, n),
                ));
            }
            Ok(read) => filled += read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(buf)
}

/// Reads one frame and returns its payload as text.
///
/// The declared length is validated before the payload is read, so a bogus
/// prefix never causes a large allocation.
pub async fn read_frame<R>(stream: &mut R) -> Result<String, FrameError>
where
    R: AsyncRead + Unpin,
{
    let header = read_exact(stream, FRAME_HEADER_SIZE)
        .await
        .map_err(|e| closed_or_io(e, FRAME_HEADER_SIZE))?;
    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);

    if len == 0 {
        return Err(FrameError::Empty);
    }
    if len > MAX_PAYLOAD_SIZE {
        return Err(FrameError::TooLarge {
            size: len,
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let len = len as usize;
    let payload = read_exact(stream, len)
        .await
        .map_err(|e| closed_or_io(e, len))?;

    String::from_utf8(payload.to_vec()).map_err(|_| FrameError::InvalidUtf8)
}

fn closed_or_io(err: io::Error, expected: usize) -> FrameError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        FrameError::ConnectionClosed { expected }
    } else {
        FrameError::Io(err)
    }
}
