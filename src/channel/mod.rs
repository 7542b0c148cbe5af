//! TCP session channels.
//!
//! A session owns two independent streams: control (console → vehicle) and
//! telemetry (vehicle → console). Each stream carries back-to-back fixed-size
//! frames with no header or delimiter, so a reader only ever asks for exactly
//! one frame's worth of bytes.
//!
//! The loops in [`control`] and [`telemetry`] return `Ok` only when their
//! cancellation token fires. Any transport failure or short read comes back as
//! an `Err`, which the supervisor treats as the end of the session.

pub mod control;
pub mod telemetry;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::types::FrameKind;
use crate::{LinkError, Result};

/// Read exactly one frame of `N` bytes.
///
/// End of stream before `N` bytes, including a clean close with nothing
/// buffered, is a [`LinkError::FrameLengthMismatch`] carrying the byte count
/// that did arrive.
pub async fn read_frame<R, const N: usize>(reader: &mut R, kind: FrameKind) -> Result<[u8; N]>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; N];
    let mut filled = 0;

    while filled < N {
        let n = reader
            .read(&mut buf[filled..])
            .await
            .map_err(|e| LinkError::transport(format!("{kind} receive"), e))?;
        if n == 0 {
            return Err(LinkError::frame_length_mismatch(kind, filled));
        }
        filled += n;
    }

    trace!(%kind, bytes = N, "Frame received");
    Ok(buf)
}

/// Write one encoded frame in full.
pub async fn write_frame<W>(writer: &mut W, kind: FrameKind, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(bytes)
        .await
        .map_err(|e| LinkError::transport(format!("{kind} send"), e))?;
    writer.flush().await.map_err(|e| LinkError::transport(format!("{kind} flush"), e))?;
    trace!(%kind, bytes = bytes.len(), "Frame sent");
    Ok(())
}
