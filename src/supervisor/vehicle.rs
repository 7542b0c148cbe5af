//! Vehicle-side supervisor and sensor poller tasks

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::state::{AcceptedChannels, SessionEvent, SessionState};
use super::{ChannelTasks, apply_event, collect_session_result, finish_session};
use crate::channel::control::run_control_receiver;
use crate::channel::telemetry::run_telemetry_sender;
use crate::discovery::DiscoveryBeacon;
use crate::mailbox::Mailbox;
use crate::provider::{Actuator, SensorProvider};
use crate::types::{ControlFrame, FrameKind, TelemetryFrame};
use crate::LinkConfig;

/// Pause after a failed accept before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Owns the channel listeners, the beacon and the session channel tasks.
pub(crate) struct VehicleSupervisor {
    pub config: LinkConfig,
    pub control_listener: TcpListener,
    pub telemetry_listener: TcpListener,
    pub control_port: u16,
    pub telemetry_port: u16,
    pub actuator: Arc<dyn Actuator>,
    pub latest_control: Mailbox<ControlFrame>,
    pub telemetry: Mailbox<TelemetryFrame>,
    pub state: watch::Sender<SessionState>,
    pub cancel: CancellationToken,
}

impl VehicleSupervisor {
    pub async fn run(self) {
        info!(
            name = %self.config.vehicle.name,
            control_port = self.control_port,
            telemetry_port = self.telemetry_port,
            "Vehicle supervisor started"
        );

        while !self.cancel.is_cancelled() {
            apply_event(&self.state, SessionEvent::Start);
            self.run_cycle().await;
        }

        self.actuator.enter_safe_state();
        apply_event(&self.state, SessionEvent::Stop);
        info!(cycles = self.state.borrow().cycle(), "Vehicle supervisor stopped");
    }

    async fn run_cycle(&self) {
        let attached = self.cancel.child_token();
        let beacon = tokio::spawn(
            DiscoveryBeacon::from_config(&self.config, self.control_port, self.telemetry_port)
                .run(attached.clone()),
        );

        // Each channel runs from the moment it is accepted, so a half-open
        // peer that disconnects ends the session like any other failure.
        let session = self.cancel.child_token();
        let mut tasks = ChannelTasks::new();
        let mut open = AcceptedChannels::default();
        let mut half_open_exit = None;

        while !open.both() {
            let (kind, accepted) = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                exit = tasks.join_next(), if !tasks.is_empty() => {
                    half_open_exit = exit;
                    break;
                }
                accepted = accept(&self.control_listener, FrameKind::Control), if !open.control => {
                    (FrameKind::Control, accepted)
                }
                accepted = accept(&self.telemetry_listener, FrameKind::Telemetry), if !open.telemetry => {
                    (FrameKind::Telemetry, accepted)
                }
            };

            let Some((stream, remote)) = accepted else { continue };

            attached.cancel();
            apply_event(&self.state, SessionEvent::ChannelAccepted { channel: kind, remote });
            match kind {
                FrameKind::Control => open.control = true,
                FrameKind::Telemetry => open.telemetry = true,
            }
            self.spawn_channel(&mut tasks, kind, stream, session.clone());
        }

        attached.cancel();
        match beacon.await {
            Ok(sent) => trace!(sent, "Beacon joined"),
            Err(e) => error!("Beacon task failed: {}", e),
        }

        let error = if half_open_exit.is_some() {
            let error = finish_session(&mut tasks, &session, half_open_exit).await;
            warn!(?open, "Half-open peer went away before the session started");
            error
        } else if open.both() {
            info!(operator = ?self.state.borrow().operator(), "Console attached");
            collect_session_result(&mut tasks, &session).await
        } else {
            // Cancelled while discovering or half-open.
            finish_session(&mut tasks, &session, None).await;
            if self.state.borrow().phase().has_open_channels() {
                apply_event(&self.state, SessionEvent::SessionEnded { error: None });
            }
            return;
        };

        self.actuator.enter_safe_state();
        match &error {
            Some(e) => warn!("Session ended, vehicle in safe state: {}", e),
            None => debug!("Session cancelled, vehicle in safe state"),
        }
        apply_event(&self.state, SessionEvent::SessionEnded { error: error.map(Arc::new) });
    }

    /// Start the task serving one accepted channel.
    fn spawn_channel(
        &self,
        tasks: &mut ChannelTasks,
        kind: FrameKind,
        stream: TcpStream,
        token: CancellationToken,
    ) {
        match kind {
            FrameKind::Control => {
                let actuator = Arc::clone(&self.actuator);
                let latest = self.latest_control.clone();
                tasks.spawn(async move {
                    let result = run_control_receiver(stream, latest, &*actuator, token).await;
                    (FrameKind::Control, result)
                });
            }
            FrameKind::Telemetry => {
                let source = self.telemetry.clone();
                let period = self.config.telemetry_interval();
                tasks.spawn(async move {
                    let result = run_telemetry_sender(stream, source, period, token).await;
                    (FrameKind::Telemetry, result)
                });
            }
        }
    }
}

/// Accept one connection. Errors are logged and reported as `None`.
async fn accept(listener: &TcpListener, kind: FrameKind) -> Option<(TcpStream, SocketAddr)> {
    match listener.accept().await {
        Ok((stream, remote)) => {
            if let Err(e) = stream.set_nodelay(true) {
                debug!(error = %e, "Could not set TCP_NODELAY");
            }
            debug!(%kind, %remote, "Channel accepted");
            Some((stream, remote))
        }
        Err(e) => {
            warn!(%kind, error = %e, "Accept failed");
            tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
            None
        }
    }
}

/// Sample sensors into `telemetry` every `period` until cancelled.
///
/// A failed sample is logged and the previous one stays in the mailbox.
pub(crate) async fn run_sensor_poller<S>(
    mut sensors: S,
    telemetry: Mailbox<TelemetryFrame>,
    period: Duration,
    cancel: CancellationToken,
) where
    S: SensorProvider,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut samples = 0u64;
    let mut failures = 0u64;

    debug!(?period, "Sensor poller started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = sensors.sample() => result,
        };

        match result {
            Ok(frame) => {
                samples += 1;
                telemetry.post(frame);
            }
            Err(e) => {
                failures += 1;
                warn!(failures, "Sensor read failed, keeping previous sample: {}", e);
            }
        }
    }

    debug!(samples, failures, "Sensor poller stopped");
}
