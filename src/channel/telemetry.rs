//! Telemetry channel loops

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{read_frame, write_frame};
use crate::Result;
use crate::codec::{decode_telemetry, encode_telemetry};
use crate::mailbox::Mailbox;
use crate::types::{FrameKind, TelemetryFrame};

/// Vehicle side: send the latest sensor sample once per `period`.
///
/// The same sample is resent if the sensors have not produced a new one.
pub async fn run_telemetry_sender<W>(
    mut writer: W,
    latest: Mailbox<TelemetryFrame>,
    period: Duration,
    cancel: CancellationToken,
) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sent = 0u64;

    debug!(?period, "Telemetry sender started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let bytes = encode_telemetry(&latest.latest());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = write_frame(&mut writer, FrameKind::Telemetry, &bytes) => result?,
        }
        sent += 1;
        trace!(sent, "Telemetry frame sent");
    }

    debug!(sent, "Telemetry sender stopped");
    Ok(sent)
}

/// Console side: decode incoming samples into `sink`, overwriting the previous one.
pub async fn run_telemetry_receiver<R>(
    mut reader: R,
    sink: Mailbox<Option<TelemetryFrame>>,
    cancel: CancellationToken,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut received = 0u64;

    debug!("Telemetry receiver started");

    loop {
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            bytes = read_frame::<_, { TelemetryFrame::WIRE_SIZE }>(&mut reader, FrameKind::Telemetry) => bytes?,
        };

        let frame = decode_telemetry(&bytes)?;
        sink.post(Some(frame));
        received += 1;
        trace!(received, speed = frame.speed, voltage = frame.voltage, "Telemetry frame received");
    }

    debug!(received, "Telemetry receiver stopped");
    Ok(received)
}
