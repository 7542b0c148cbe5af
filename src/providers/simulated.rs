//! Deterministic stand-ins for vehicle hardware

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

use crate::Result;
use crate::provider::{Actuator, SensorProvider};
use crate::types::{ControlFrame, TelemetryFrame};

/// Fully charged 2S pack.
const PACK_FULL_VOLTS: f32 = 8.4;
/// Cut-off voltage of a 2S pack.
const PACK_EMPTY_VOLTS: f32 = 6.4;

/// [`SensorProvider`] that produces a repeatable drive cycle.
///
/// Speed ramps up and down over 100 samples, the pack voltage drains slowly
/// from 8.4V to 6.4V, and the signal level stays fixed. Sample `n` is always
/// the same frame.
#[derive(Debug, Clone)]
pub struct SimulatedSensors {
    step: u64,
    drain_per_sample: f32,
    wifi_signal_strength: i32,
}

impl SimulatedSensors {
    pub fn new() -> Self {
        Self { step: 0, drain_per_sample: 0.001, wifi_signal_strength: -52 }
    }

    pub fn with_signal_strength(mut self, dbm: i32) -> Self {
        self.wifi_signal_strength = dbm;
        self
    }

    /// Frame for sample number `step`.
    pub fn frame_at(&self, step: u64) -> TelemetryFrame {
        let phase = (step % 100) as f32;
        let speed = if phase < 50.0 { phase * 0.2 } else { (100.0 - phase) * 0.2 };
        let voltage = (PACK_FULL_VOLTS - step as f32 * self.drain_per_sample).max(PACK_EMPTY_VOLTS);

        TelemetryFrame {
            speed,
            acceleration_x: if phase < 50.0 { 0.1 } else { -0.1 },
            acceleration_y: 0.0,
            acceleration_z: 1.0,
            voltage,
            current: 0.4 + speed * 0.05,
            wifi_signal_strength: self.wifi_signal_strength,
        }
    }
}

impl Default for SimulatedSensors {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SensorProvider for SimulatedSensors {
    async fn sample(&mut self) -> Result<TelemetryFrame> {
        let frame = self.frame_at(self.step);
        self.step += 1;
        trace!(step = self.step, speed = frame.speed, "Simulated sample");
        Ok(frame)
    }
}

/// [`Actuator`] that records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    frames: Mutex<Vec<ControlFrame>>,
    safe_states: AtomicUsize,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every frame applied so far, oldest first.
    pub fn frames(&self) -> Vec<ControlFrame> {
        self.lock().clone()
    }

    pub fn last_frame(&self) -> Option<ControlFrame> {
        self.lock().last().copied()
    }

    pub fn frame_count(&self) -> usize {
        self.lock().len()
    }

    /// Number of `enter_safe_state` calls.
    pub fn safe_state_count(&self) -> usize {
        self.safe_states.load(Ordering::Acquire)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ControlFrame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Actuator for RecordingActuator {
    fn apply(&self, frame: &ControlFrame) {
        self.lock().push(*frame);
    }

    fn enter_safe_state(&self) {
        self.safe_states.fetch_add(1, Ordering::AcqRel);
    }
}
