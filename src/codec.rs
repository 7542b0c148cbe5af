//! Fixed-width binary codec for control and telemetry frames.
//!
//! Both frames have a fixed size and no header. Every multi-byte field is
//! little-endian on both peers.
//!
//! ```text
//! Control (5 bytes)
//! ┌──────┬──────────┬──────────┬───────┬───────────┐
//! │ i8   │ i8       │ u8       │ u8    │ u8        │
//! │ gear │ steering │ throttle │ brake │ functions │
//! └──────┴──────────┴──────────┴───────┴───────────┘
//!
//! Telemetry (28 bytes)
//! ┌───────┬──────┬──────┬──────┬─────────┬─────────┬──────────┐
//! │ f32   │ f32  │ f32  │ f32  │ f32     │ f32     │ i32      │
//! │ speed │ accX │ accY │ accZ │ voltage │ current │ wifi dBm │
//! └───────┴──────┴──────┴──────┴─────────┴─────────┴──────────┘
//! ```
//!
//! Decoding input of any other length fails with
//! [`LinkError::FrameLengthMismatch`]; channel readers treat that as a broken transport.

use crate::types::{ControlFrame, FrameKind, FunctionBits, TelemetryFrame};
use crate::{LinkError, Result};

/// Encode a control frame, saturating pedal values to `0..=100`.
pub fn encode_control(frame: &ControlFrame) -> [u8; ControlFrame::WIRE_SIZE] {
    [
        frame.gear as u8,
        frame.steering as u8,
        frame.throttle.min(ControlFrame::PEDAL_MAX),
        frame.brake.min(ControlFrame::PEDAL_MAX),
        frame.function_bits.value(),
    ]
}

/// Decode exactly [`ControlFrame::WIRE_SIZE`] bytes.
pub fn decode_control(bytes: &[u8]) -> Result<ControlFrame> {
    let bytes: &[u8; ControlFrame::WIRE_SIZE] = bytes
        .try_into()
        .map_err(|_| LinkError::frame_length_mismatch(FrameKind::Control, bytes.len()))?;

    Ok(ControlFrame {
        gear: bytes[0] as i8,
        steering: bytes[1] as i8,
        throttle: bytes[2],
        brake: bytes[3],
        function_bits: FunctionBits::new(bytes[4]),
    })
}

/// Encode a telemetry frame.
pub fn encode_telemetry(frame: &TelemetryFrame) -> [u8; TelemetryFrame::WIRE_SIZE] {
    let mut out = [0u8; TelemetryFrame::WIRE_SIZE];
    let floats = [
        frame.speed,
        frame.acceleration_x,
        frame.acceleration_y,
        frame.acceleration_z,
        frame.voltage,
        frame.current,
    ];
    for (slot, value) in out.chunks_exact_mut(4).zip(floats) {
        slot.copy_from_slice(&value.to_le_bytes());
    }
    out[24..28].copy_from_slice(&frame.wifi_signal_strength.to_le_bytes());
    out
}

/// Decode exactly [`TelemetryFrame::WIRE_SIZE`] bytes.
pub fn decode_telemetry(bytes: &[u8]) -> Result<TelemetryFrame> {
    if bytes.len() != TelemetryFrame::WIRE_SIZE {
        return Err(LinkError::frame_length_mismatch(FrameKind::Telemetry, bytes.len()));
    }

    let word = |index: usize| -> [u8; 4] {
        let start = index * 4;
        [bytes[start], bytes[start + 1], bytes[start + 2], bytes[start + 3]]
    };

    Ok(TelemetryFrame {
        speed: f32::from_le_bytes(word(0)),
        acceleration_x: f32::from_le_bytes(word(1)),
        acceleration_y: f32::from_le_bytes(word(2)),
        acceleration_z: f32::from_le_bytes(word(3)),
        voltage: f32::from_le_bytes(word(4)),
        current: f32::from_le_bytes(word(5)),
        wifi_signal_strength: i32::from_le_bytes(word(6)),
    })
}
