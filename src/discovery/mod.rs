//! UDP discovery.
//!
//! The vehicle runs a [`DiscoveryBeacon`] that broadcasts a JSON
//! [`Announcement`] every beacon interval until a console attaches. The console
//! runs a [`DiscoveryListener`] that turns valid announcements into
//! [`VehicleRecord`](crate::types::VehicleRecord)s and collects them in
//! [`KnownVehicles`]. Malformed datagrams are logged and dropped; discovery
//! never fails a session.

mod announcement;
mod beacon;
mod listener;
mod registry;

pub use announcement::Announcement;
pub use beacon::DiscoveryBeacon;
pub use listener::{DiscoveryListener, listen, observe};
pub use registry::{KnownVehicles, MAX_KNOWN_VEHICLES};

/// Receive buffer size; larger announcements are truncated and fail to parse.
pub const MAX_DATAGRAM_SIZE: usize = 1024;
