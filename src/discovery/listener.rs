//! Console-side announcement listener

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::{Announcement, KnownVehicles, MAX_DATAGRAM_SIZE};
use crate::{LinkError, Result};

/// Receives announcements and feeds the known-vehicle set.
///
/// Every receive is bounded by `receive_timeout` so an idle listener still
/// notices cancellation. Nothing that arrives on the socket can stop the loop.
#[derive(Debug)]
pub struct DiscoveryListener {
    socket: UdpSocket,
    receive_timeout: Duration,
}

impl DiscoveryListener {
    /// Bind the discovery port with `SO_BROADCAST` enabled.
    pub async fn bind(addr: SocketAddr, receive_timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| LinkError::transport(format!("discovery bind {addr}"), e))?;
        socket
            .set_broadcast(true)
            .map_err(|e| LinkError::transport("discovery SO_BROADCAST", e))?;
        Ok(Self { socket, receive_timeout })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(|e| LinkError::transport("discovery local_addr", e))
    }

    /// Receive until cancelled. Returns the number of valid announcements seen.
    pub async fn run(self, known: watch::Sender<KnownVehicles>, cancel: CancellationToken) -> u64 {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let mut accepted = 0u64;

        info!(addr = ?self.socket.local_addr().ok(), "Listening for vehicle announcements");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                received = tokio::time::timeout(self.receive_timeout, self.socket.recv_from(&mut buf)) => received,
            };

            match received {
                Ok(Ok((len, sender))) => {
                    trace!(len, %sender, "Discovery datagram received");
                    match observe(&known, &buf[..len], sender) {
                        Ok(inserted) => {
                            accepted += 1;
                            if inserted {
                                debug!(%sender, "New vehicle discovered");
                            }
                        }
                        Err(e) => warn!(%sender, "{}", e),
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Discovery receive error");
                }
                Err(_) => {
                    trace!("Discovery receive timed out, checking liveness");
                }
            }
        }

        debug!(accepted, "Discovery listener stopped");
        accepted
    }
}

/// Parse one datagram and insert the resulting record.
///
/// Returns whether the known set changed; a payload that fails validation is
/// reported as [`LinkError::DiscoveryParse`] and leaves the set untouched.
pub fn observe(
    known: &watch::Sender<KnownVehicles>,
    payload: &[u8],
    sender: SocketAddr,
) -> Result<bool> {
    let record = Announcement::parse(payload)?.into_record(sender.ip());
    Ok(known.send_if_modified(|set| set.insert(record)))
}

/// Bind and run a listener, retrying the bind until cancelled.
///
/// Discovery failures never leave this function.
pub async fn listen(
    addr: SocketAddr,
    receive_timeout: Duration,
    known: watch::Sender<KnownVehicles>,
    cancel: CancellationToken,
) -> u64 {
    loop {
        match DiscoveryListener::bind(addr, receive_timeout).await {
            Ok(listener) => return listener.run(known, cancel).await,
            Err(e) => {
                warn!("{}; retrying in {:?}", e, receive_timeout);
                tokio::select! {
                    _ = cancel.cancelled() => return 0,
                    _ = tokio::time::sleep(receive_timeout) => {}
                }
            }
        }
    }
}
