//! Reference collaborators for demos and tests

pub mod shared;
pub mod simulated;

pub use shared::SharedInput;
pub use simulated::{RecordingActuator, SimulatedSensors};
