//! Link configuration
//!
//! Configuration is plain YAML. Every field has a default, so an empty document
//! is a valid configuration:
//!
//! ```yaml
//! discovery:
//!   port: 50000
//!   bind_address: 0.0.0.0
//!   broadcast_address: 255.255.255.255
//!   beacon_interval_ms: 5000
//!   receive_timeout_ms: 2000
//! control:
//!   port: 12345
//!   interval_ms: 100
//! telemetry:
//!   port: 12346
//!   interval_ms: 100
//! vehicle:
//!   name: RaspberryPiControlServer
//!   sensor_interval_ms: 100
//! console:
//!   connect_timeout_ms: 3000
//! ```
//!
//! A control or telemetry port of `0` asks the OS for an ephemeral port; the
//! vehicle announces whatever port it actually bound.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::discovery::{Announcement, MAX_DATAGRAM_SIZE};
use crate::{LinkError, Result};

/// Longest accepted vehicle name, in bytes.
pub const MAX_VEHICLE_NAME_LEN: usize = 256;

/// Complete configuration for either side of the link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub discovery: DiscoveryConfig,
    pub control: ControlConfig,
    pub telemetry: TelemetryConfig,
    pub vehicle: VehicleConfig,
    pub console: ConsoleConfig,
}

/// UDP discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Well-known UDP port the beacon sends to and the listener binds.
    pub port: u16,
    /// Local address for every socket the link binds.
    pub bind_address: IpAddr,
    /// Destination of beacon announcements.
    pub broadcast_address: IpAddr,
    pub beacon_interval_ms: u64,
    /// Upper bound on one listener receive before it checks for cancellation.
    pub receive_timeout_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: 50000,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            broadcast_address: IpAddr::V4(Ipv4Addr::BROADCAST),
            beacon_interval_ms: 5000,
            receive_timeout_ms: 2000,
        }
    }
}

/// Control channel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub port: u16,
    /// Console send cadence.
    pub interval_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { port: 12345, interval_ms: 100 }
    }
}

/// Telemetry channel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub port: u16,
    /// Vehicle send cadence.
    pub interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { port: 12346, interval_ms: 100 }
    }
}

/// Vehicle-only settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Name put in every announcement.
    pub name: String,
    pub sensor_interval_ms: u64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self { name: "RaspberryPiControlServer".to_string(), sensor_interval_ms: 100 }
    }
}

/// Console-only settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub connect_timeout_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { connect_timeout_ms: 3000 }
    }
}

impl LinkConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: LinkConfig = if yaml.trim().is_empty() {
            LinkConfig::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load, parse and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| LinkError::config_file(path.to_path_buf(), e))?;
        debug!(path = %path.display(), bytes = yaml.len(), "Loaded link configuration");
        Self::from_yaml(&yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check every value the supervisors rely on.
    pub fn validate(&self) -> Result<()> {
        if self.discovery.port == 0 {
            return Err(LinkError::configuration("discovery port must not be 0"));
        }
        if self.control.port != 0 && self.control.port == self.telemetry.port {
            return Err(LinkError::configuration(format!(
                "control and telemetry ports must differ (both {})",
                self.control.port
            )));
        }

        let intervals = [
            ("discovery.beacon_interval_ms", self.discovery.beacon_interval_ms),
            ("discovery.receive_timeout_ms", self.discovery.receive_timeout_ms),
            ("control.interval_ms", self.control.interval_ms),
            ("telemetry.interval_ms", self.telemetry.interval_ms),
            ("vehicle.sensor_interval_ms", self.vehicle.sensor_interval_ms),
            ("console.connect_timeout_ms", self.console.connect_timeout_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(LinkError::configuration(format!("{name} must be greater than 0")));
            }
        }

        let name = &self.vehicle.name;
        if name.trim().is_empty() {
            return Err(LinkError::configuration("vehicle name must not be empty"));
        }
        if name.len() > MAX_VEHICLE_NAME_LEN {
            return Err(LinkError::configuration(format!(
                "vehicle name is {} bytes, limit is {}",
                name.len(),
                MAX_VEHICLE_NAME_LEN
            )));
        }

        // Worst case: five-digit ports.
        let probe = Announcement::new(name.clone(), u16::MAX, u16::MAX).encode()?;
        if probe.len() > MAX_DATAGRAM_SIZE {
            return Err(LinkError::configuration(format!(
                "announcement would be {} bytes, datagram limit is {}",
                probe.len(),
                MAX_DATAGRAM_SIZE
            )));
        }

        Ok(())
    }

    /// Where the beacon sends announcements.
    pub fn broadcast_target(&self) -> SocketAddr {
        SocketAddr::new(self.discovery.broadcast_address, self.discovery.port)
    }

    /// Where the console listener binds.
    pub fn discovery_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.discovery.bind_address, self.discovery.port)
    }

    pub fn beacon_interval(&self) -> Duration {
        Duration::from_millis(self.discovery.beacon_interval_ms)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery.receive_timeout_ms)
    }

    pub fn control_interval(&self) -> Duration {
        Duration::from_millis(self.control.interval_ms)
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry.interval_ms)
    }

    pub fn sensor_interval(&self) -> Duration {
        Duration::from_millis(self.vehicle.sensor_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.console.connect_timeout_ms)
    }
}
