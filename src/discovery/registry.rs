//! De-duplicated set of vehicles seen during one discovery cycle

use tracing::warn;

use crate::types::VehicleRecord;

/// Upper bound on vehicles remembered in one discovery cycle.
pub const MAX_KNOWN_VEHICLES: usize = 64;

/// Vehicles known to the console, in the order they were first announced.
///
/// Membership is by [`VehicleRecord`] equality, i.e. `(address, control_port)`.
/// The first announcement for a vehicle wins: a later one with the same key but
/// a different name or telemetry port is ignored until the set is cleared.
/// Once [`MAX_KNOWN_VEHICLES`] records are held, new vehicles are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownVehicles {
    records: Vec<VehicleRecord>,
}

impl KnownVehicles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless an equal one is already present.
    ///
    /// Returns true when the set changed.
    pub fn insert(&mut self, record: VehicleRecord) -> bool {
        if self.records.contains(&record) {
            return false;
        }
        if self.records.len() >= MAX_KNOWN_VEHICLES {
            warn!(vehicle = %record, limit = MAX_KNOWN_VEHICLES, "Known vehicle set full, ignoring");
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn contains(&self, record: &VehicleRecord) -> bool {
        self.records.contains(record)
    }

    pub fn get(&self, index: usize) -> Option<&VehicleRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VehicleRecord> {
        self.records.iter()
    }

    pub fn to_vec(&self) -> Vec<VehicleRecord> {
        self.records.clone()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    const CAR_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50));

    #[test]
    fn duplicate_key_keeps_first_seen_fields() {
        let mut known = KnownVehicles::new();
        assert!(known.insert(VehicleRecord::new("Car1", CAR_IP, 12345, 12346)));
        assert!(!known.insert(VehicleRecord::new("Renamed", CAR_IP, 12345, 12999)));

        assert_eq!(known.len(), 1);
        let record = known.get(0).unwrap();
        assert_eq!(record.name, "Car1");
        assert_eq!(record.telemetry_port, 12346);
    }

    #[test]
    fn same_name_different_port_is_distinct() {
        let mut known = KnownVehicles::new();
        known.insert(VehicleRecord::new("Car1", CAR_IP, 12345, 12346));
        known.insert(VehicleRecord::new("Car1", CAR_IP, 22345, 22346));
        assert_eq!(known.len(), 2);
    }

    #[test]
    fn stops_growing_at_the_limit() {
        let mut known = KnownVehicles::new();
        for port in 0..MAX_KNOWN_VEHICLES as u16 {
            assert!(known.insert(VehicleRecord::new("Car", CAR_IP, 20000 + port, 30000)));
        }
        assert!(!known.insert(VehicleRecord::new("Late", CAR_IP, 19999, 30000)));
        assert_eq!(known.len(), MAX_KNOWN_VEHICLES);
        assert!(known.iter().all(|r| r.name == "Car"));

        known.clear();
        assert!(known.insert(VehicleRecord::new("Late", CAR_IP, 19999, 30000)));
    }

    #[test]
    fn preserves_discovery_order() {
        let mut known = KnownVehicles::new();
        for (i, last) in [30u8, 10, 20].into_iter().enumerate() {
            let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, last));
            known.insert(VehicleRecord::new(format!("Car{i}"), ip, 12345, 12346));
        }
        let names: Vec<_> = known.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Car0", "Car1", "Car2"]);

        known.clear();
        assert!(known.is_empty());
    }
}
