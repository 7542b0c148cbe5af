//! Identity of a discovered vehicle

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, SocketAddr};

/// A vehicle found during discovery.
///
/// Two records are the same vehicle when `(address, control_port)` match; the
/// name and telemetry port do not take part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct VehicleRecord {
    /// Display name from the announcement.
    pub name: String,
    /// Source address of the announcement datagram.
    #[cfg_attr(feature = "tauri", specta(type = String))]
    pub address: IpAddr,
    pub control_port: u16,
    pub telemetry_port: u16,
}

impl VehicleRecord {
    pub fn new(
        name: impl Into<String>,
        address: IpAddr,
        control_port: u16,
        telemetry_port: u16,
    ) -> Self {
        Self { name: name.into(), address, control_port, telemetry_port }
    }

    /// Address of the vehicle's control listener.
    pub fn control_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.control_port)
    }

    /// Address of the vehicle's telemetry listener.
    pub fn telemetry_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.telemetry_port)
    }
}

impl PartialEq for VehicleRecord {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.control_port == other.control_port
    }
}

impl Eq for VehicleRecord {}

impl Hash for VehicleRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
        self.control_port.hash(state);
    }
}

impl std::fmt::Display for VehicleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{}/{})", self.name, self.address, self.control_port, self.telemetry_port)
    }
}
