//! Console-side supervisor task

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::state::{SessionEvent, SessionState};
use super::{apply_event, collect_session_result};
use crate::channel::control::run_control_sender;
use crate::channel::telemetry::run_telemetry_receiver;
use crate::discovery::{self, KnownVehicles};
use crate::mailbox::Mailbox;
use crate::provider::InputProvider;
use crate::types::{FrameKind, TelemetryFrame, VehicleRecord};
use crate::{LinkConfig, LinkError, Result};

/// Owns every console-side task: listener, connect attempts and session channels.
pub(crate) struct ConsoleSupervisor {
    pub config: LinkConfig,
    pub input: Arc<dyn InputProvider>,
    pub state: watch::Sender<SessionState>,
    pub vehicles: watch::Sender<KnownVehicles>,
    pub selections: mpsc::UnboundedReceiver<VehicleRecord>,
    pub telemetry: Mailbox<Option<TelemetryFrame>>,
    pub cancel: CancellationToken,
}

impl ConsoleSupervisor {
    pub async fn run(mut self) {
        info!("Console supervisor started");

        while !self.cancel.is_cancelled() {
            apply_event(&self.state, SessionEvent::Start);
            self.run_cycle().await;
        }

        apply_event(&self.state, SessionEvent::Stop);
        info!(cycles = self.state.borrow().cycle(), "Console supervisor stopped");
    }

    /// One pass of discover, select, connect and run.
    async fn run_cycle(&mut self) {
        // Selections made while the previous session was up are stale.
        let mut stale = 0;
        while self.selections.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            debug!(stale, "Discarded selections from previous cycle");
        }

        let listener_cancel = self.cancel.child_token();
        let listener = tokio::spawn(discovery::listen(
            self.config.discovery_bind_addr(),
            self.config.receive_timeout(),
            self.vehicles.clone(),
            listener_cancel.clone(),
        ));

        let connected = self.await_connection().await;

        listener_cancel.cancel();
        if let Err(e) = listener.await {
            error!("Discovery listener task failed: {}", e);
        }

        let Some((peer, control, telemetry)) = connected else {
            return;
        };

        self.vehicles.send_if_modified(|known| {
            let changed = !known.is_empty();
            known.clear();
            changed
        });
        self.telemetry.post(None);

        info!(vehicle = %peer, "Connected");
        apply_event(&self.state, SessionEvent::Connected { peer });

        let error = self.run_session(control, telemetry).await;
        if let Some(e) = &error {
            warn!("Session ended: {}", e);
        }
        apply_event(&self.state, SessionEvent::SessionEnded { error: error.map(Arc::new) });
    }

    /// Wait for selections until one connects. `None` when cancelled.
    async fn await_connection(&mut self) -> Option<(VehicleRecord, TcpStream, TcpStream)> {
        loop {
            let record = tokio::select! {
                _ = self.cancel.cancelled() => return None,
                selection = self.selections.recv() => match selection {
                    Some(record) => record,
                    None => {
                        debug!("Console handle dropped");
                        self.cancel.cancel();
                        return None;
                    }
                },
            };

            info!(vehicle = %record, "Connecting");
            let timeout = self.config.connect_timeout();
            let attempt = async {
                let control = connect(record.control_addr(), FrameKind::Control, timeout).await?;
                let telemetry =
                    connect(record.telemetry_addr(), FrameKind::Telemetry, timeout).await?;
                Ok::<_, LinkError>((control, telemetry))
            };

            let result = tokio::select! {
                _ = self.cancel.cancelled() => return None,
                result = attempt => result,
            };

            match result {
                Ok((control, telemetry)) => return Some((record, control, telemetry)),
                Err(e) => {
                    warn!(vehicle = %record, "Connect failed: {}", e);
                    apply_event(&self.state, SessionEvent::ConnectFailed { error: Arc::new(e) });
                }
            }
        }
    }

    /// Run control sender and telemetry receiver until one of them stops.
    async fn run_session(&self, control: TcpStream, telemetry: TcpStream) -> Option<LinkError> {
        let session = self.cancel.child_token();
        let mut tasks = JoinSet::new();

        let input = Arc::clone(&self.input);
        let period = self.config.control_interval();
        let token = session.clone();
        tasks.spawn(async move {
            let result = run_control_sender(control, &*input, period, token).await;
            (FrameKind::Control, result)
        });

        let sink = self.telemetry.clone();
        let token = session.clone();
        tasks.spawn(async move {
            let result = run_telemetry_receiver(telemetry, sink, token).await;
            (FrameKind::Telemetry, result)
        });

        collect_session_result(&mut tasks, &session).await
    }
}

/// Open one channel, bounded by `timeout`.
async fn connect(addr: SocketAddr, kind: FrameKind, timeout: Duration) -> Result<TcpStream> {
    let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(LinkError::transport_to(&format!("{kind} connect"), addr, e)),
        Err(_) => {
            return Err(LinkError::Timeout {
                operation: format!("{kind} connect to {addr}"),
                duration: timeout,
            });
        }
    };
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "Could not set TCP_NODELAY");
    }
    debug!(%kind, %addr, "Channel connected");
    Ok(stream)
}
