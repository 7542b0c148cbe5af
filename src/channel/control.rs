//! Control channel loops

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{read_frame, write_frame};
use crate::Result;
use crate::codec::{decode_control, encode_control};
use crate::mailbox::Mailbox;
use crate::provider::{Actuator, InputProvider};
use crate::types::{ControlFrame, FrameKind};

/// Console side: sample the input and send one frame per `period`.
///
/// There is no acknowledgement; the next frame supersedes a lost one.
/// Returns the number of frames sent once `cancel` fires.
pub async fn run_control_sender<W, I>(
    mut writer: W,
    input: &I,
    period: Duration,
    cancel: CancellationToken,
) -> Result<u64>
where
    W: AsyncWrite + Unpin,
    I: InputProvider + ?Sized,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sent = 0u64;

    debug!(?period, "Control sender started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let frame = ControlFrame::from_input(&input.current());
        let bytes = encode_control(&frame);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = write_frame(&mut writer, FrameKind::Control, &bytes) => result?,
        }

        sent += 1;
        trace!(
            sent,
            gear = frame.gear,
            steering = frame.steering,
            throttle = frame.throttle,
            brake = frame.brake,
            "Control frame sent"
        );
    }

    debug!(sent, "Control sender stopped");
    Ok(sent)
}

/// Vehicle side: decode every incoming frame, store it and drive the actuator.
///
/// Returns the number of frames applied once `cancel` fires.
pub async fn run_control_receiver<R, A>(
    mut reader: R,
    latest: Mailbox<ControlFrame>,
    actuator: &A,
    cancel: CancellationToken,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    A: Actuator + ?Sized,
{
    let mut received = 0u64;

    debug!("Control receiver started");

    loop {
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            bytes = read_frame::<_, { ControlFrame::WIRE_SIZE }>(&mut reader, FrameKind::Control) => bytes?,
        };

        let frame = decode_control(&bytes)?;
        latest.post(frame);
        actuator.apply(&frame);

        received += 1;
        trace!(received, ?frame, "Control frame applied");
    }

    debug!(received, "Control receiver stopped");
    Ok(received)
}
