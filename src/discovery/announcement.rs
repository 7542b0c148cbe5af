//! Presence announcement payload

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::types::VehicleRecord;
use crate::{LinkError, Result};

/// JSON body of a discovery datagram.
///
/// ```json
/// {"name": "Car1", "control_port": 12345, "telemetry_port": 12346}
/// ```
///
/// All three fields are required and no others are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Announcement {
    pub name: String,
    pub control_port: u16,
    pub telemetry_port: u16,
}

impl Announcement {
    pub fn new(name: impl Into<String>, control_port: u16, telemetry_port: u16) -> Self {
        Self { name: name.into(), control_port, telemetry_port }
    }

    /// Serialize to the datagram payload.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| LinkError::configuration(e.to_string()))
    }

    /// Parse and validate a datagram payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        // Objects only; serde would otherwise accept a positional array.
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(payload)?;
        let announcement: Announcement = serde_json::from_value(serde_json::Value::Object(object))?;

        if announcement.control_port == 0 {
            return Err(LinkError::discovery_parse("control_port must not be 0"));
        }
        if announcement.telemetry_port == 0 {
            return Err(LinkError::discovery_parse("telemetry_port must not be 0"));
        }

        Ok(announcement)
    }

    /// Build the record for a vehicle that sent this announcement from `sender`.
    pub fn into_record(self, sender: IpAddr) -> VehicleRecord {
        VehicleRecord::new(self.name, sender, self.control_port, self.telemetry_port)
    }
}
