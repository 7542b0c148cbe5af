//! Test utilities for loopback sessions
//!
//! Every end-to-end test runs both peers on 127.0.0.1 with a private discovery
//! port, ephemeral channel ports and short intervals, so tests can run in
//! parallel without touching the real broadcast domain.

#![cfg(any(test, feature = "benchmark"))]

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::Duration;
use tokio::sync::watch;

use crate::LinkConfig;
use crate::supervisor::SessionState;
use crate::types::TelemetryFrame;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Default upper bound for waiting on an asynchronous state change.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Ask the OS for a UDP port that is free right now.
pub fn free_udp_port() -> std::io::Result<u16> {
    let socket = UdpSocket::bind((LOCALHOST, 0))?;
    Ok(socket.local_addr()?.port())
}

/// Configuration for a loopback session on `discovery_port`.
pub fn loopback_config(discovery_port: u16) -> LinkConfig {
    let mut config = LinkConfig::default();
    config.discovery.port = discovery_port;
    config.discovery.bind_address = LOCALHOST;
    config.discovery.broadcast_address = LOCALHOST;
    config.discovery.beacon_interval_ms = 50;
    config.discovery.receive_timeout_ms = 50;
    config.control.port = 0;
    config.control.interval_ms = 10;
    config.telemetry.port = 0;
    config.telemetry.interval_ms = 10;
    config.vehicle.name = "TestCar".to_string();
    config.vehicle.sensor_interval_ms = 10;
    config.console.connect_timeout_ms = 500;
    config
}

/// Telemetry sample with distinct values in every field.
pub fn sample_telemetry() -> TelemetryFrame {
    TelemetryFrame {
        speed: 3.5,
        acceleration_x: 0.12,
        acceleration_y: -0.05,
        acceleration_z: 0.98,
        voltage: 7.9,
        current: 1.25,
        wifi_signal_strength: -48,
    }
}

/// Wait until `state` satisfies `predicate`, panicking with `what` on timeout.
pub async fn wait_for_state<F>(
    state: &mut watch::Receiver<SessionState>,
    what: &str,
    mut predicate: F,
) -> SessionState
where
    F: FnMut(&SessionState) -> bool,
{
    let outcome = tokio::time::timeout(WAIT_TIMEOUT, state.wait_for(|s| predicate(s)))
        .await
        .map(|waited| waited.map(|current| current.clone()));

    match outcome {
        Ok(Ok(current)) => current,
        Ok(Err(_)) => panic!("supervisor exited while waiting for {what}"),
        Err(_) => panic!("timed out waiting for {what}; last state: {:?}", *state.borrow()),
    }
}

/// Poll `condition` every few milliseconds until it holds.
pub async fn wait_until<F>(what: &str, mut condition: F)
where
    F: FnMut() -> bool,
{
    let poll = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    if tokio::time::timeout(WAIT_TIMEOUT, poll).await.is_err() {
        panic!("timed out waiting for {what}");
    }
}
