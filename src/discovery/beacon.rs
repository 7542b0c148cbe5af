//! Vehicle-side presence beacon

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::Announcement;
use crate::LinkConfig;

/// Periodically broadcasts an [`Announcement`] until a console attaches.
///
/// Sending is fire-and-forget: the beacon never reads from its socket and a
/// failed send is only logged.
#[derive(Debug, Clone)]
pub struct DiscoveryBeacon {
    announcement: Announcement,
    bind_address: IpAddr,
    target: SocketAddr,
    interval: Duration,
}

impl DiscoveryBeacon {
    pub fn new(
        announcement: Announcement,
        bind_address: IpAddr,
        target: SocketAddr,
        interval: Duration,
    ) -> Self {
        Self { announcement, bind_address, target, interval }
    }

    /// Beacon announcing the ports the vehicle actually bound.
    pub fn from_config(config: &LinkConfig, control_port: u16, telemetry_port: u16) -> Self {
        Self::new(
            Announcement::new(config.vehicle.name.clone(), control_port, telemetry_port),
            config.discovery.bind_address,
            config.broadcast_target(),
            config.beacon_interval(),
        )
    }

    pub fn announcement(&self) -> &Announcement {
        &self.announcement
    }

    /// Announce immediately, then once per interval, until `attached` is cancelled.
    ///
    /// Returns the number of announcements sent.
    pub async fn run(self, attached: CancellationToken) -> u64 {
        let payload = match self.announcement.encode() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Beacon cannot encode announcement: {}", e);
                return 0;
            }
        };

        let socket = match UdpSocket::bind(SocketAddr::new(self.bind_address, 0)).await {
            Ok(socket) => socket,
            Err(e) => {
                error!(error = %e, "Beacon socket bind failed");
                return 0;
            }
        };
        if let Err(e) = socket.set_broadcast(true) {
            warn!(error = %e, "Could not enable SO_BROADCAST on beacon socket");
        }

        info!(
            name = %self.announcement.name,
            control_port = self.announcement.control_port,
            telemetry_port = self.announcement.telemetry_port,
            target = %self.target,
            "Beacon started"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sent = 0u64;

        loop {
            tokio::select! {
                _ = attached.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match socket.send_to(&payload, self.target).await {
                Ok(_) => {
                    sent += 1;
                    trace!(sent, "Broadcasting vehicle presence");
                }
                Err(e) => {
                    warn!(error = %e, target = %self.target, "Beacon send failed");
                }
            }
        }

        debug!(sent, "Beacon stopped, peer attached");
        sent
    }
}
