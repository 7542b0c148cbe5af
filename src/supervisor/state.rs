//! Session state reducer

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::types::{FrameKind, Role, SessionPhase, VehicleRecord};
use crate::{LinkError, Result};

/// Something that happened to a supervisor.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Begin a discovery cycle.
    Start,
    /// Console: both channels to `peer` are open.
    Connected { peer: VehicleRecord },
    /// Console: connecting to the selected vehicle failed; keep discovering.
    ConnectFailed { error: Arc<LinkError> },
    /// Vehicle: a console connected to one of the channel listeners.
    ChannelAccepted { channel: FrameKind, remote: SocketAddr },
    /// The session's channels are closed. `error` is the failure that ended it,
    /// or `None` when it was cancelled.
    SessionEnded { error: Option<Arc<LinkError>> },
    /// Terminal shutdown.
    Stop,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Start => "Start",
            SessionEvent::Connected { .. } => "Connected",
            SessionEvent::ConnectFailed { .. } => "ConnectFailed",
            SessionEvent::ChannelAccepted { .. } => "ChannelAccepted",
            SessionEvent::SessionEnded { .. } => "SessionEnded",
            SessionEvent::Stop => "Stop",
        }
    }
}

/// Which vehicle-side channels have an accepted connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptedChannels {
    pub control: bool,
    pub telemetry: bool,
}

impl AcceptedChannels {
    fn get(self, channel: FrameKind) -> bool {
        match channel {
            FrameKind::Control => self.control,
            FrameKind::Telemetry => self.telemetry,
        }
    }

    fn set(&mut self, channel: FrameKind) {
        match channel {
            FrameKind::Control => self.control = true,
            FrameKind::Telemetry => self.telemetry = true,
        }
    }

    pub fn both(self) -> bool {
        self.control && self.telemetry
    }
}

/// Observable state of one supervisor.
///
/// Only [`apply`](Self::apply) changes it, and a rejected event leaves it
/// exactly as it was.
#[derive(Debug, Clone)]
pub struct SessionState {
    role: Role,
    phase: SessionPhase,
    peer: Option<VehicleRecord>,
    operator: Option<IpAddr>,
    accepted: AcceptedChannels,
    last_error: Option<Arc<LinkError>>,
    cycle: u64,
    stopped: bool,
}

impl SessionState {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            phase: SessionPhase::Idle,
            peer: None,
            operator: None,
            accepted: AcceptedChannels::default(),
            last_error: None,
            cycle: 0,
            stopped: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Console: the vehicle of the current (or most recent) session.
    pub fn peer(&self) -> Option<&VehicleRecord> {
        self.peer.as_ref()
    }

    /// Vehicle: address of the console that opened the first channel.
    pub fn operator(&self) -> Option<IpAddr> {
        self.operator
    }

    pub fn accepted(&self) -> AcceptedChannels {
        self.accepted
    }

    /// Error that ended the previous session or failed the last connect.
    pub fn last_error(&self) -> Option<&LinkError> {
        self.last_error.as_deref()
    }

    /// Number of discovery cycles started.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_connected(&self) -> bool {
        self.phase == SessionPhase::Connected
    }

    /// Fold one event into the state.
    pub fn apply(&mut self, event: SessionEvent) -> Result<()> {
        let reject = |from: SessionPhase| LinkError::InvalidTransition { from, event: event.name() };

        if self.stopped {
            return Err(reject(self.phase));
        }

        match (&event, self.phase) {
            (SessionEvent::Start, SessionPhase::Idle) => {
                self.phase = SessionPhase::Discovering;
                self.cycle += 1;
                self.peer = None;
                self.operator = None;
                self.accepted = AcceptedChannels::default();
            }
            (SessionEvent::Connected { peer }, SessionPhase::Discovering)
                if self.role == Role::Console =>
            {
                self.phase = SessionPhase::Connected;
                self.peer = Some(peer.clone());
            }
            (SessionEvent::ConnectFailed { error }, SessionPhase::Discovering)
                if self.role == Role::Console =>
            {
                self.last_error = Some(Arc::clone(error));
            }
            (
                SessionEvent::ChannelAccepted { channel, remote },
                SessionPhase::Discovering | SessionPhase::AwaitingPeer,
            ) if self.role == Role::Vehicle && !self.accepted.get(*channel) => {
                self.accepted.set(*channel);
                if self.operator.is_none() {
                    self.operator = Some(remote.ip());
                }
                self.phase = if self.accepted.both() {
                    SessionPhase::Connected
                } else {
                    SessionPhase::AwaitingPeer
                };
            }
            (
                SessionEvent::SessionEnded { error },
                SessionPhase::Connected | SessionPhase::AwaitingPeer,
            ) => {
                self.phase = SessionPhase::Idle;
                self.accepted = AcceptedChannels::default();
                self.last_error = error.clone();
            }
            (SessionEvent::Stop, _) => {
                self.phase = SessionPhase::Idle;
                self.accepted = AcceptedChannels::default();
                self.stopped = true;
            }
            (_, from) => return Err(reject(from)),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn car() -> VehicleRecord {
        VehicleRecord::new("Car1", IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50)), 12345, 12346)
    }

    fn remote() -> SocketAddr {
        "192.168.1.10:51000".parse().unwrap()
    }

    fn transport_error() -> Arc<LinkError> {
        Arc::new(LinkError::transport(
            "telemetry receive",
            std::io::Error::from(std::io::ErrorKind::ConnectionReset),
        ))
    }

    fn accepted(channel: FrameKind) -> SessionEvent {
        SessionEvent::ChannelAccepted { channel, remote: remote() }
    }

    #[test]
    fn console_cycle() {
        let mut state = SessionState::new(Role::Console);
        state.apply(SessionEvent::Start).unwrap();
        assert_eq!(state.phase(), SessionPhase::Discovering);
        assert_eq!(state.cycle(), 1);

        state.apply(SessionEvent::ConnectFailed { error: transport_error() }).unwrap();
        assert_eq!(state.phase(), SessionPhase::Discovering);
        assert!(state.last_error().is_some());

        state.apply(SessionEvent::Connected { peer: car() }).unwrap();
        assert!(state.is_connected());
        assert_eq!(state.peer(), Some(&car()));

        state.apply(SessionEvent::SessionEnded { error: Some(transport_error()) }).unwrap();
        assert_eq!(state.phase(), SessionPhase::Idle);
        assert!(matches!(state.last_error(), Some(LinkError::Transport { .. })));

        state.apply(SessionEvent::Start).unwrap();
        assert_eq!(state.cycle(), 2);
        assert_eq!(state.peer(), None);
    }

    #[test]
    fn vehicle_needs_both_channels() {
        let mut state = SessionState::new(Role::Vehicle);
        state.apply(SessionEvent::Start).unwrap();

        state.apply(accepted(FrameKind::Telemetry)).unwrap();
        assert_eq!(state.phase(), SessionPhase::AwaitingPeer);
        assert_eq!(state.operator(), Some(remote().ip()));

        let err = state.apply(accepted(FrameKind::Telemetry)).unwrap_err();
        assert!(matches!(err, LinkError::InvalidTransition { from: SessionPhase::AwaitingPeer, .. }));
        assert_eq!(state.phase(), SessionPhase::AwaitingPeer);

        state.apply(accepted(FrameKind::Control)).unwrap();
        assert!(state.is_connected());
        assert!(state.accepted().both());

        state.apply(SessionEvent::SessionEnded { error: None }).unwrap();
        assert_eq!(state.phase(), SessionPhase::Idle);
        assert!(!state.accepted().control);
    }

    #[test]
    fn half_open_session_can_end() {
        let mut state = SessionState::new(Role::Vehicle);
        state.apply(SessionEvent::Start).unwrap();
        state.apply(accepted(FrameKind::Control)).unwrap();
        state.apply(SessionEvent::SessionEnded { error: Some(transport_error()) }).unwrap();
        assert_eq!(state.phase(), SessionPhase::Idle);
    }

    #[test]
    fn role_specific_events_are_rejected_on_the_other_side() {
        let mut console = SessionState::new(Role::Console);
        console.apply(SessionEvent::Start).unwrap();
        assert!(console.apply(accepted(FrameKind::Control)).is_err());

        let mut vehicle = SessionState::new(Role::Vehicle);
        vehicle.apply(SessionEvent::Start).unwrap();
        assert!(vehicle.apply(SessionEvent::Connected { peer: car() }).is_err());
        assert!(vehicle.apply(SessionEvent::ConnectFailed { error: transport_error() }).is_err());
    }

    #[test]
    fn rejected_events_leave_state_untouched() {
        let table: Vec<(SessionPhase, SessionEvent)> = vec![
            (SessionPhase::Idle, SessionEvent::Connected { peer: car() }),
            (SessionPhase::Idle, SessionEvent::SessionEnded { error: None }),
            (SessionPhase::Idle, SessionEvent::ConnectFailed { error: transport_error() }),
            (SessionPhase::Discovering, SessionEvent::Start),
            (SessionPhase::Discovering, SessionEvent::SessionEnded { error: None }),
            (SessionPhase::Connected, SessionEvent::Start),
            (SessionPhase::Connected, SessionEvent::Connected { peer: car() }),
            (SessionPhase::Connected, SessionEvent::ConnectFailed { error: transport_error() }),
        ];

        for (phase, event) in table {
            let mut state = SessionState::new(Role::Console);
            if phase != SessionPhase::Idle {
                state.apply(SessionEvent::Start).unwrap();
            }
            if phase == SessionPhase::Connected {
                state.apply(SessionEvent::Connected { peer: car() }).unwrap();
            }
            let before = format!("{state:?}");
            let name = event.name();

            match state.apply(event) {
                Err(LinkError::InvalidTransition { from, event }) => {
                    assert_eq!(from, phase);
                    assert_eq!(event, name);
                }
                other => panic!("{name} from {phase:?} gave {other:?}"),
            }
            assert_eq!(format!("{state:?}"), before, "{name} from {phase:?} changed the state");
        }
    }

    #[test]
    fn stop_is_terminal() {
        let mut state = SessionState::new(Role::Console);
        state.apply(SessionEvent::Start).unwrap();
        state.apply(SessionEvent::Connected { peer: car() }).unwrap();
        state.apply(SessionEvent::Stop).unwrap();

        assert_eq!(state.phase(), SessionPhase::Idle);
        assert!(state.is_stopped());
        assert!(state.apply(SessionEvent::Start).is_err());
        assert!(state.apply(SessionEvent::Stop).is_err());
    }
}
