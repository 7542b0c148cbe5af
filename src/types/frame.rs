//! Fixed-size frame definitions shared by the codec and the channels

use serde::{Deserialize, Serialize};

use super::bitfield::FunctionBits;

/// Which of the two session channels a frame or socket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FrameKind {
    /// Console → Vehicle, 5 bytes.
    Control,
    /// Vehicle → Console, 28 bytes.
    Telemetry,
}

impl FrameKind {
    /// Exact number of bytes one frame occupies on the wire.
    pub const fn wire_size(self) -> usize {
        match self {
            FrameKind::Control => ControlFrame::WIRE_SIZE,
            FrameKind::Telemetry => TelemetryFrame::WIRE_SIZE,
        }
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Control => f.write_str("control"),
            FrameKind::Telemetry => f.write_str("telemetry"),
        }
    }
}

/// Logical control input as produced by input acquisition.
///
/// Axes are normalized: steering in `[-1, 1]`, throttle and brake in `[0, 1]`.
/// Values outside those ranges are saturated when converted to a [`ControlFrame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ControlInput {
    /// Selected gear, -1 (reverse) to 5; 0 is neutral.
    pub gear: i8,
    pub steering: f32,
    pub throttle: f32,
    pub brake: f32,
    pub functions: FunctionBits,
}

/// One control sample as it travels on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ControlFrame {
    /// Selected gear, -1 (reverse) to 5.
    pub gear: i8,
    /// Steering scaled to -128..=127, where 127 is full right.
    pub steering: i8,
    /// Throttle percentage, 0..=100.
    pub throttle: u8,
    /// Brake percentage, 0..=100.
    pub brake: u8,
    /// Lights, horn and reserved switches.
    pub function_bits: FunctionBits,
}

impl ControlFrame {
    /// Encoded size in bytes.
    pub const WIRE_SIZE: usize = 5;

    /// Highest accepted pedal percentage.
    pub const PEDAL_MAX: u8 = 100;

    /// Convert a logical input into wire units, saturating out-of-range axes.
    pub fn from_input(input: &ControlInput) -> Self {
        Self {
            gear: input.gear,
            steering: scale_saturating(input.steering, 127.0, -128.0, 127.0) as i8,
            throttle: scale_saturating(input.throttle, 100.0, 0.0, 100.0) as u8,
            brake: scale_saturating(input.brake, 100.0, 0.0, 100.0) as u8,
            function_bits: input.functions,
        }
    }

    /// Frame with every actuator at rest: neutral gear, centred steering, no pedals.
    pub fn neutral() -> Self {
        Self::default()
    }
}

impl From<ControlInput> for ControlFrame {
    fn from(input: ControlInput) -> Self {
        ControlFrame::from_input(&input)
    }
}

// NaN maps to zero.
fn scale_saturating(value: f32, scale: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    (value * scale).round().clamp(min, max)
}

/// One telemetry sample as it travels on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TelemetryFrame {
    /// Ground speed reported by the wheel encoder.
    pub speed: f32,
    /// Acceleration along the vehicle axes, in g.
    pub acceleration_x: f32,
    pub acceleration_y: f32,
    pub acceleration_z: f32,
    /// Battery bus voltage in volts.
    pub voltage: f32,
    /// Battery current in amperes.
    pub current: f32,
    /// Wi-Fi signal level in dBm.
    pub wifi_signal_strength: i32,
}

impl TelemetryFrame {
    /// Encoded size in bytes.
    pub const WIRE_SIZE: usize = 28;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wire_sizes_match_frame_kinds() {
        assert_eq!(FrameKind::Control.wire_size(), 5);
        assert_eq!(FrameKind::Telemetry.wire_size(), 28);
    }

    #[test]
    fn input_scaling_rounds_to_nearest() {
        let input = ControlInput {
            gear: 2,
            steering: 0.5,
            throttle: 0.8,
            brake: 0.0,
            functions: FunctionBits::NONE.with_lights(true),
        };
        let frame = ControlFrame::from_input(&input);
        assert_eq!(frame.gear, 2);
        assert_eq!(frame.steering, 64);
        assert_eq!(frame.throttle, 80);
        assert_eq!(frame.brake, 0);
        assert_eq!(frame.function_bits.value(), 1);
    }

    #[test]
    fn input_scaling_saturates() {
        let input = ControlInput { steering: 2.0, throttle: 1.5, brake: -0.3, ..Default::default() };
        let frame = ControlFrame::from_input(&input);
        assert_eq!(frame.steering, 127);
        assert_eq!(frame.throttle, 100);
        assert_eq!(frame.brake, 0);

        let frame = ControlFrame::from_input(&ControlInput { steering: -2.0, ..Default::default() });
        assert_eq!(frame.steering, -128);
    }

    #[test]
    fn nan_axes_become_zero() {
        let input = ControlInput { steering: f32::NAN, throttle: f32::NAN, ..Default::default() };
        let frame = ControlFrame::from_input(&input);
        assert_eq!(frame.steering, 0);
        assert_eq!(frame.throttle, 0);
    }

    proptest! {
        #[test]
        fn scaled_pedals_stay_in_range(throttle in -10.0f32..10.0, brake in -10.0f32..10.0) {
            let frame = ControlFrame::from_input(&ControlInput { throttle, brake, ..Default::default() });
            prop_assert!(frame.throttle <= ControlFrame::PEDAL_MAX);
            prop_assert!(frame.brake <= ControlFrame::PEDAL_MAX);
        }

        #[test]
        fn steering_sign_is_preserved(steering in -1.0f32..1.0) {
            let frame = ControlFrame::from_input(&ControlInput { steering, ..Default::default() });
            if steering > 0.01 {
                prop_assert!(frame.steering > 0);
            } else if steering < -0.01 {
                prop_assert!(frame.steering < 0);
            }
        }
    }
}
