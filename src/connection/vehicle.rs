//! Vehicle handle

use futures::Stream;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::mailbox::Mailbox;
use crate::provider::{Actuator, SensorProvider};
use crate::supervisor::SessionState;
use crate::supervisor::vehicle::{VehicleSupervisor, run_sensor_poller};
use crate::types::{ControlFrame, Role, TelemetryFrame};
use crate::{LinkConfig, LinkError, Result};

/// Running vehicle supervisor.
///
/// Owns the control and telemetry listeners for its whole lifetime and
/// announces them until a console attaches. Received control frames go to the
/// [`Actuator`]; sensor samples are polled in the background and streamed
/// back. The actuator is put into its safe state whenever a session ends.
pub struct Vehicle {
    state: watch::Receiver<SessionState>,
    latest_control: Mailbox<ControlFrame>,
    telemetry: Mailbox<TelemetryFrame>,
    control_addr: SocketAddr,
    telemetry_addr: SocketAddr,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Vehicle {
    /// Validate `config`, bind both channel listeners and spawn the supervisor.
    ///
    /// A bind failure is returned here rather than retried.
    pub async fn start<S, A>(config: LinkConfig, sensors: S, actuator: A) -> Result<Self>
    where
        S: SensorProvider,
        A: Actuator,
    {
        config.validate()?;

        let bind = config.discovery.bind_address;
        let control_listener = TcpListener::bind((bind, config.control.port))
            .await
            .map_err(|e| LinkError::transport(format!("control bind {bind}:{}", config.control.port), e))?;
        let telemetry_listener = TcpListener::bind((bind, config.telemetry.port))
            .await
            .map_err(|e| {
                LinkError::transport(format!("telemetry bind {bind}:{}", config.telemetry.port), e)
            })?;

        let control_addr = control_listener
            .local_addr()
            .map_err(|e| LinkError::transport("control local_addr", e))?;
        let telemetry_addr = telemetry_listener
            .local_addr()
            .map_err(|e| LinkError::transport("telemetry local_addr", e))?;

        info!(%control_addr, %telemetry_addr, name = %config.vehicle.name, "Starting vehicle");

        let (state_tx, state) = watch::channel(SessionState::new(Role::Vehicle));
        let latest_control = Mailbox::new(ControlFrame::neutral());
        let telemetry = Mailbox::new(TelemetryFrame::default());
        let cancel = CancellationToken::new();

        let poller = tokio::spawn(run_sensor_poller(
            sensors,
            telemetry.clone(),
            config.sensor_interval(),
            cancel.clone(),
        ));

        let supervisor = VehicleSupervisor {
            config,
            control_listener,
            telemetry_listener,
            control_port: control_addr.port(),
            telemetry_port: telemetry_addr.port(),
            actuator: Arc::new(actuator),
            latest_control: latest_control.clone(),
            telemetry: telemetry.clone(),
            state: state_tx,
            cancel: cancel.clone(),
        };
        let supervisor = tokio::spawn(supervisor.run());

        Ok(Self {
            state,
            latest_control,
            telemetry,
            control_addr,
            telemetry_addr,
            cancel,
            tasks: vec![supervisor, poller],
        })
    }

    /// Bound control listener address; its port is the one announced.
    pub fn control_addr(&self) -> SocketAddr {
        self.control_addr
    }

    pub fn telemetry_addr(&self) -> SocketAddr {
        self.telemetry_addr
    }

    /// Most recent control frame received; neutral before the first one.
    pub fn latest_control(&self) -> ControlFrame {
        self.latest_control.latest()
    }

    /// Control frames as they are received.
    pub fn control_updates(&self) -> impl Stream<Item = ControlFrame> + 'static {
        WatchStream::from_changes(self.latest_control.subscribe())
    }

    /// Sample the telemetry sender will transmit next.
    pub fn latest_telemetry(&self) -> TelemetryFrame {
        self.telemetry.latest()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn state_updates(&self) -> impl Stream<Item = SessionState> + 'static {
        WatchStream::new(self.state.clone())
    }

    /// Cancel every task, wait for them and return the final state.
    ///
    /// The actuator is left in its safe state.
    pub async fn stop(mut self) -> SessionState {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!("Vehicle task failed: {}", e);
            }
        }
        info!("Vehicle stopped");
        self.state()
    }
}

impl Drop for Vehicle {
    fn drop(&mut self) {
        debug!("Dropping vehicle");
        self.cancel.cancel();
    }
}
