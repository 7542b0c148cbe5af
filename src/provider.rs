//! Collaborator traits at the edges of a session
//!
//! The link never reads a joystick, drives a motor or talks to a sensor bus
//! itself. Those jobs belong to the application, which plugs them in through
//! the three traits below. Reference implementations live in
//! [`providers`](crate::providers).

use crate::Result;
use crate::types::{ControlFrame, ControlInput, TelemetryFrame};

/// Source of the operator's current control intent (console side).
///
/// Called once per control interval from the control sender task, so it must
/// return promptly and never block on I/O.
pub trait InputProvider: Send + Sync + 'static {
    /// Snapshot of the current logical input.
    fn current(&self) -> ControlInput;
}

/// Sink for received control frames (vehicle side).
pub trait Actuator: Send + Sync + 'static {
    /// Apply one control frame to the drive hardware.
    ///
    /// Called for every frame the control receiver decodes; frames arrive at
    /// the console's control cadence (100ms by default), so the call must
    /// finish well within that budget.
    fn apply(&self, frame: &ControlFrame);

    /// Stop the vehicle: zero throttle, full brake or whatever "safe" means
    /// for the hardware.
    ///
    /// Invoked whenever a session ends and when the vehicle supervisor stops.
    fn enter_safe_state(&self);
}

/// Source of telemetry samples (vehicle side).
///
/// Owned by the sensor poller task, which calls [`sample`](Self::sample)
/// every sensor interval and posts the result to the telemetry mailbox.
#[async_trait::async_trait]
pub trait SensorProvider: Send + 'static {
    /// Read one telemetry sample.
    ///
    /// Returns:
    /// - `Ok(frame)` - fresh sample, replaces the previous one
    /// - `Err(e)` - read failed; the poller logs it and keeps the last sample
    async fn sample(&mut self) -> Result<TelemetryFrame>;
}

impl<T: InputProvider + ?Sized> InputProvider for std::sync::Arc<T> {
    fn current(&self) -> ControlInput {
        (**self).current()
    }
}

impl<T: Actuator + ?Sized> Actuator for std::sync::Arc<T> {
    fn apply(&self, frame: &ControlFrame) {
        (**self).apply(frame)
    }

    fn enter_safe_state(&self) {
        (**self).enter_safe_state()
    }
}
