//! LAN link between a remote-controlled vehicle and its operator console.
//!
//! Roverlink covers everything between "the vehicle is powered on" and "frames
//! are flowing": UDP discovery, session supervision with automatic recovery,
//! and the fixed-size binary frames of the control and telemetry channels.
//!
//! # Features
//!
//! - **Discovery**: the vehicle broadcasts a JSON announcement until a console attaches
//! - **Two channels**: 5-byte control frames out, 28-byte telemetry frames back, over TCP
//! - **Self-healing**: any channel failure ends the session and both sides rediscover
//! - **Safe by default**: the vehicle actuator is put into its safe state whenever a session ends
//!
//! # Quick Start
//!
//! ## Console
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use roverlink::{LinkConfig, Roverlink, SharedInput, UpdateRate};
//!
//! #[tokio::main]
//! async fn main() -> roverlink::Result<()> {
//!     let input = SharedInput::new();
//!     let console = Roverlink::console(LinkConfig::default(), input.clone())?;
//!
//!     // Wait for the UI to show the list, then pick the first vehicle.
//!     tokio::time::sleep(std::time::Duration::from_secs(6)).await;
//!     console.select_index(0)?;
//!
//!     input.set_axes(0.0, 0.3, 0.0);
//!     let mut telemetry = Box::pin(console.subscribe_telemetry(UpdateRate::Max(5)));
//!     while let Some(frame) = telemetry.next().await {
//!         println!("{:.1} km/h, {:.2} V", frame.speed, frame.voltage);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Vehicle
//!
//! ```rust,no_run
//! use roverlink::{LinkConfig, RecordingActuator, Roverlink, SimulatedSensors};
//!
//! #[tokio::main]
//! async fn main() -> roverlink::Result<()> {
//!     let config = LinkConfig::load("vehicle.yaml")?;
//!     let vehicle = Roverlink::vehicle(config, SimulatedSensors::new(), RecordingActuator::new()).await?;
//!     println!("Announcing control on {}", vehicle.control_addr());
//!     tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
//!     vehicle.stop().await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod codec;
pub mod config;
mod error;
pub mod mailbox;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Discovery and session machinery
pub mod channel;
pub mod connection;
pub mod discovery;
pub mod supervisor;

// Collaborators and stream helpers
pub mod provider;
pub mod providers;
pub mod stream;

// Core exports
pub use config::LinkConfig;
pub use error::*;
pub use types::*;

// Main API exports
pub use connection::{Console, Vehicle};
pub use discovery::{Announcement, KnownVehicles};
pub use mailbox::Mailbox;
pub use provider::{Actuator, InputProvider, SensorProvider};
pub use providers::{RecordingActuator, SharedInput, SimulatedSensors};
pub use supervisor::{SessionEvent, SessionState};

/// Unified entry point for both ends of the link.
///
/// # Examples
///
/// ## Console
/// ```rust,no_run
/// use roverlink::{LinkConfig, Roverlink, SharedInput};
///
/// #[tokio::main]
/// async fn main() -> roverlink::Result<()> {
///     let console = Roverlink::console(LinkConfig::default(), SharedInput::new())?;
///     // Use console...
///     Ok(())
/// }
/// ```
///
/// ## Vehicle
/// ```rust,no_run
/// use roverlink::{LinkConfig, RecordingActuator, Roverlink, SimulatedSensors};
///
/// #[tokio::main]
/// async fn main() -> roverlink::Result<()> {
///     let vehicle = Roverlink::vehicle(
///         LinkConfig::default(),
///         SimulatedSensors::new(),
///         RecordingActuator::new(),
///     )
///     .await?;
///     // Use vehicle...
///     Ok(())
/// }
/// ```
pub struct Roverlink;

impl Roverlink {
    /// Start an operator console.
    ///
    /// Spawns the console supervisor on the current tokio runtime. It starts
    /// listening for announcements immediately; call
    /// [`Console::select`] or [`Console::select_index`] to connect.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Configuration`] if `config` fails validation.
    pub fn console<I>(config: LinkConfig, input: I) -> Result<Console>
    where
        I: InputProvider,
    {
        Console::start(config, input)
    }

    /// Start a vehicle.
    ///
    /// Binds the control and telemetry listeners, starts polling `sensors`
    /// and begins announcing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `config` fails validation
    /// - either channel port cannot be bound
    pub async fn vehicle<S, A>(config: LinkConfig, sensors: S, actuator: A) -> Result<Vehicle>
    where
        S: SensorProvider,
        A: Actuator,
    {
        Vehicle::start(config, sensors, actuator).await
    }
}
