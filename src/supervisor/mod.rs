//! Session supervisors.
//!
//! Each side of the link runs one supervisor task that loops through
//! discovery cycles:
//!
//! ```text
//! Idle ──Start──▶ Discovering ──(Vehicle: first accept)──▶ AwaitingPeer
//!   ▲                  │                                        │
//!   │              Connected ◀──────(second accept)─────────────┘
//!   └──SessionEnded────┘
//! ```
//!
//! Every change goes through [`SessionState::apply`] and is published on a
//! watch channel. A session's channel tasks run in a `JoinSet` under a child
//! cancellation token: the first task to return ends the session, the token
//! is cancelled and the set is drained before the next cycle starts. The
//! vehicle starts each channel task as soon as that channel is accepted, so a
//! half-open session also ends when its only peer disconnects.

pub(crate) mod console;
pub mod state;
pub(crate) mod vehicle;

pub use state::{AcceptedChannels, SessionEvent, SessionState};

use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

use crate::types::FrameKind;
use crate::{LinkError, Result};

/// Apply `event` and publish the result. A rejected event is logged and dropped.
pub(crate) fn apply_event(state: &watch::Sender<SessionState>, event: SessionEvent) {
    state.send_if_modified(|current| match current.apply(event) {
        Ok(()) => {
            trace!(phase = ?current.phase(), cycle = current.cycle(), "Session state changed");
            true
        }
        Err(e) => {
            error!("{}", e);
            false
        }
    });
}

/// Channel tasks of one session, each reporting which channel it served.
pub(crate) type ChannelTasks = JoinSet<(FrameKind, Result<u64>)>;

type ChannelExit = std::result::Result<(FrameKind, Result<u64>), JoinError>;

/// Wait for the first channel task to finish, cancel the rest and drain the set.
///
/// Returns the first failure; `None` when every task stopped on cancellation.
pub(crate) async fn collect_session_result(
    tasks: &mut ChannelTasks,
    session: &CancellationToken,
) -> Option<LinkError> {
    let first = tasks.join_next().await;
    finish_session(tasks, session, first).await
}

/// Cancel the session and drain `tasks`. `first` is a result already taken
/// from the set, if any.
pub(crate) async fn finish_session(
    tasks: &mut ChannelTasks,
    session: &CancellationToken,
    first: Option<ChannelExit>,
) -> Option<LinkError> {
    let mut failure = first.and_then(take_failure);
    session.cancel();

    while let Some(joined) = tasks.join_next().await {
        let error = take_failure(joined);
        if failure.is_none() {
            failure = error;
        }
    }

    failure
}

fn take_failure(joined: ChannelExit) -> Option<LinkError> {
    match joined {
        Ok((kind, Ok(frames))) => {
            trace!(%kind, frames, "Channel task stopped");
            None
        }
        Ok((kind, Err(e))) => {
            error!(%kind, "Channel failed: {}", e);
            Some(e)
        }
        Err(e) => {
            error!("Channel task aborted: {}", e);
            None
        }
    }
}
