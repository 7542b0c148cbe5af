//! Session phase and role identifiers

use serde::{Deserialize, Serialize};

/// Which side of the link a supervisor runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Role {
    /// Operator side: listens for announcements, sends control, receives telemetry.
    Console,
    /// Vehicle side: announces itself, receives control, sends telemetry.
    Vehicle,
}

/// Lifecycle phase of a session supervisor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum SessionPhase {
    /// No discovery running and no channels open.
    #[default]
    Idle,
    /// Beacon (vehicle) or listener (console) active.
    Discovering,
    /// Vehicle only: at least one channel accepted, waiting for the other.
    AwaitingPeer,
    /// Both channels open and frames flowing.
    Connected,
}

impl SessionPhase {
    /// Whether any session channel can be open in this phase.
    pub fn has_open_channels(self) -> bool {
        matches!(self, SessionPhase::AwaitingPeer | SessionPhase::Connected)
    }
}
