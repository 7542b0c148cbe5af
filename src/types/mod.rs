//! Core value types exchanged between the console and the vehicle.
//!
//! ## Architecture
//!
//! - [`ControlFrame`] and [`TelemetryFrame`] are the two fixed-size wire records
//! - [`ControlInput`] is the logical input tuple that saturates into a [`ControlFrame`]
//! - [`FunctionBits`] names the switches packed into the last control byte
//! - [`VehicleRecord`] identifies a discovered vehicle by `(address, control_port)`
//! - [`SessionPhase`] and [`Role`] describe where a supervisor is in its lifecycle
//!
//! ## Usage Example
//!
//! ```rust
//! use roverlink::types::{ControlFrame, ControlInput, FunctionBits};
//!
//! let input = ControlInput {
//!     gear: 2,
//!     steering: 0.5,
//!     throttle: 0.8,
//!     brake: 0.0,
//!     functions: FunctionBits::NONE.with_lights(true),
//! };
//! let frame = ControlFrame::from_input(&input);
//! assert_eq!((frame.steering, frame.throttle), (64, 80));
//! ```

mod bitfield;
mod frame;
mod session;
mod update_rate;
mod vehicle;

pub use bitfield::{FunctionBits, function_bit};
pub use frame::{ControlFrame, ControlInput, FrameKind, TelemetryFrame};
pub use session::{Role, SessionPhase};
pub use update_rate::UpdateRate;
pub use vehicle::VehicleRecord;
