//! Operator console handle

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::discovery::KnownVehicles;
use crate::mailbox::Mailbox;
use crate::provider::InputProvider;
use crate::stream::ThrottleExt;
use crate::supervisor::SessionState;
use crate::supervisor::console::ConsoleSupervisor;
use crate::types::{Role, TelemetryFrame, UpdateRate, VehicleRecord};
use crate::{LinkConfig, LinkError, Result};

/// Running console supervisor.
///
/// Listens for vehicle announcements, connects to the vehicle the operator
/// selects, streams control input to it and collects its telemetry. When the
/// session drops, the console goes back to discovery on its own.
///
/// Dropping the handle cancels every task; [`stop`](Self::stop) also waits
/// for them to finish.
pub struct Console {
    state: watch::Receiver<SessionState>,
    vehicles: watch::Receiver<KnownVehicles>,
    selections: mpsc::UnboundedSender<VehicleRecord>,
    telemetry: Mailbox<Option<TelemetryFrame>>,
    telemetry_hz: f64,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Console {
    /// Validate `config` and spawn the supervisor on the current runtime.
    pub fn start<I>(config: LinkConfig, input: I) -> Result<Self>
    where
        I: InputProvider,
    {
        config.validate()?;

        let (state_tx, state) = watch::channel(SessionState::new(Role::Console));
        let (vehicles_tx, vehicles) = watch::channel(KnownVehicles::new());
        let (selections, selections_rx) = mpsc::unbounded_channel();
        let telemetry = Mailbox::new(None);
        let cancel = CancellationToken::new();
        let telemetry_hz = UpdateRate::source_hz(config.telemetry_interval());

        info!(discovery = %config.discovery_bind_addr(), "Starting console");

        let supervisor = ConsoleSupervisor {
            config,
            input: Arc::new(input),
            state: state_tx,
            vehicles: vehicles_tx,
            selections: selections_rx,
            telemetry: telemetry.clone(),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(supervisor.run());

        Ok(Self { state, vehicles, selections, telemetry, telemetry_hz, cancel, task: Some(task) })
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver for session state changes.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Session state, starting with the current value and then every change.
    pub fn state_updates(&self) -> impl Stream<Item = SessionState> + 'static {
        WatchStream::new(self.state.clone())
    }

    /// Vehicles discovered in the current cycle, in announcement order.
    pub fn vehicles(&self) -> Vec<VehicleRecord> {
        self.vehicles.borrow().to_vec()
    }

    /// Known-vehicle list, starting with the current value and then every change.
    pub fn vehicle_updates(&self) -> impl Stream<Item = Vec<VehicleRecord>> + 'static {
        WatchStream::new(self.vehicles.clone()).map(|known| known.to_vec())
    }

    /// Ask the supervisor to connect to `vehicle`.
    ///
    /// Takes effect while discovering; a selection made during a session is
    /// discarded when the next cycle starts.
    pub fn select(&self, vehicle: VehicleRecord) -> Result<()> {
        debug!(vehicle = %vehicle, "Vehicle selected");
        self.selections.send(vehicle).map_err(|_| LinkError::SupervisorStopped)
    }

    /// Select the `index`-th discovered vehicle.
    pub fn select_index(&self, index: usize) -> Result<VehicleRecord> {
        let vehicle = self
            .vehicles
            .borrow()
            .get(index)
            .cloned()
            .ok_or(LinkError::NoSuchVehicle { index })?;
        self.select(vehicle.clone())?;
        Ok(vehicle)
    }

    /// Latest telemetry sample of the current session, if one has arrived.
    pub fn telemetry(&self) -> Option<TelemetryFrame> {
        self.telemetry.latest()
    }

    /// Telemetry samples as they arrive, at most `rate` per second.
    ///
    /// Only samples received after the call are yielded. When throttled, the
    /// newest sample in each period wins.
    pub fn subscribe_telemetry(
        &self,
        rate: UpdateRate,
    ) -> impl Stream<Item = TelemetryFrame> + Send + 'static {
        let frames = WatchStream::from_changes(self.telemetry.subscribe())
            .filter_map(|frame| async move { frame });

        match rate.throttle_interval(self.telemetry_hz) {
            None => frames.boxed(),
            Some(period) => frames.throttle(period).boxed(),
        }
    }

    /// Cancel every task, wait for them and return the final state.
    pub async fn stop(mut self) -> SessionState {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Console supervisor task failed: {}", e);
            }
        }
        info!("Console stopped");
        self.state()
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        debug!("Dropping console");
        self.cancel.cancel();
    }
}
