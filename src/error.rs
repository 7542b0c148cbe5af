//! Error types for the discovery, channel and session layers.
//!
//! Every fallible operation in the crate returns [`LinkError`]. Variants are grouped
//! by how the session supervisor reacts to them:
//!
//! ## Error Categories
//!
//! - **Discovery Errors**: malformed announcements, absorbed by the listener
//! - **Channel Errors**: wrong frame length, socket failures and timeouts, which end the session
//! - **Configuration Errors**: invalid ports, addresses or intervals, surfaced at start-up
//! - **Supervisor Errors**: rejected state transitions and use of a stopped handle
//!
//! ## Classification
//!
//! ```rust
//! use roverlink::{FrameKind, LinkError};
//!
//! let error = LinkError::frame_length_mismatch(FrameKind::Telemetry, 12);
//! assert!(error.is_session_ending());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```
//!
//! ## Helper Constructors
//!
//! ```rust
//! use roverlink::LinkError;
//!
//! let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
//! let transport = LinkError::transport("telemetry receive", io_err);
//! let config = LinkError::configuration("control and telemetry ports must differ");
//! let parse = LinkError::discovery_parse("missing field `control_port`");
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::{FrameKind, SessionPhase};

/// Result type alias for link operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Main error type for link operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    #[error("Discarded discovery announcement: {details}")]
    DiscoveryParse { details: String },

    #[error("{frame} frame length mismatch: expected {expected} bytes, got {actual}")]
    FrameLengthMismatch { frame: FrameKind, expected: usize, actual: usize },

    #[error("Transport failure during {operation}")]
    Transport {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} timed out after {duration:?}")]
    Timeout { operation: String, duration: Duration },

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("Configuration file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration parse error: {details}")]
    ConfigParse { details: String },

    #[error("Invalid session transition from {from:?} on {event}")]
    InvalidTransition { from: SessionPhase, event: &'static str },

    #[error("No discovered vehicle at index {index}")]
    NoSuchVehicle { index: usize },

    #[error("Session supervisor has stopped")]
    SupervisorStopped,
}

impl LinkError {
    /// Returns whether this error terminates the current session.
    ///
    /// Session-ending errors close both channels and send the supervisor back to discovery.
    pub fn is_session_ending(&self) -> bool {
        matches!(
            self,
            LinkError::FrameLengthMismatch { .. }
                | LinkError::Transport { .. }
                | LinkError::Timeout { .. }
        )
    }

    /// Returns whether a later attempt at the same operation can succeed.
    ///
    /// Nothing retries in place; this only tells callers whether selecting the
    /// vehicle again (or waiting for the next cycle) is worthwhile.
    pub fn is_retryable(&self) -> bool {
        match self {
            LinkError::DiscoveryParse { .. } => true,
            LinkError::FrameLengthMismatch { .. } => true,
            LinkError::Transport { .. } => true,
            LinkError::Timeout { .. } => true,
            LinkError::NoSuchVehicle { .. } => true,
            LinkError::Configuration { .. } => false,
            LinkError::ConfigFile { .. } => false,
            LinkError::ConfigParse { .. } => false,
            LinkError::InvalidTransition { .. } => false,
            LinkError::SupervisorStopped => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LinkError::DiscoveryParse { .. } => vec![
                "Check that every device on the broadcast domain speaks the same announcement format",
                "Verify the vehicle firmware version",
            ],
            LinkError::FrameLengthMismatch { .. } => vec![
                "Check that both peers run the same protocol version",
                "Wait for discovery to find the vehicle again",
            ],
            LinkError::Transport { .. } => vec![
                "Check that the vehicle is powered and on the same network",
                "Check Wi-Fi signal strength",
                "Wait for discovery to find the vehicle again",
            ],
            LinkError::Timeout { .. } => vec![
                "Check that the advertised ports are reachable",
                "Check for a firewall between console and vehicle",
                "Increase the connect timeout",
            ],
            LinkError::Configuration { .. } => vec![
                "Fix the offending value in the configuration file",
                "Use distinct control and telemetry ports",
            ],
            LinkError::ConfigFile { .. } => vec![
                "Check the configuration file exists and is readable",
                "Check file permissions",
            ],
            LinkError::ConfigParse { .. } => vec![
                "Check the configuration file is valid YAML",
                "Compare field names against the documented defaults",
            ],
            LinkError::InvalidTransition { .. } => vec![
                "Report this as a supervisor bug",
                "Restart the supervisor",
            ],
            LinkError::NoSuchVehicle { .. } => vec![
                "Refresh the discovered vehicle list",
                "Wait for the next beacon interval",
            ],
            LinkError::SupervisorStopped => vec![
                "Start a new supervisor",
                "Avoid using a handle after calling stop()",
            ],
        }
    }

    /// Helper constructor for discovery parse errors.
    pub fn discovery_parse(details: impl Into<String>) -> Self {
        LinkError::DiscoveryParse { details: details.into() }
    }

    /// Helper constructor for a fixed-size frame read or decode of the wrong length.
    pub fn frame_length_mismatch(frame: FrameKind, actual: usize) -> Self {
        LinkError::FrameLengthMismatch { frame, expected: frame.wire_size(), actual }
    }

    /// Helper constructor for socket-level failures.
    pub fn transport(operation: impl Into<String>, source: std::io::Error) -> Self {
        LinkError::Transport { operation: operation.into(), source }
    }

    /// Helper constructor for socket failures tied to a remote address.
    pub fn transport_to(operation: &str, addr: SocketAddr, source: std::io::Error) -> Self {
        LinkError::Transport { operation: format!("{operation} ({addr})"), source }
    }

    /// Helper constructor for configuration errors.
    pub fn configuration(reason: impl Into<String>) -> Self {
        LinkError::Configuration { reason: reason.into() }
    }

    /// Helper constructor for configuration file errors with path context.
    pub fn config_file(path: PathBuf, source: std::io::Error) -> Self {
        LinkError::ConfigFile { path, source }
    }
}

impl From<serde_yaml_ng::Error> for LinkError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        LinkError::ConfigParse { details: err.to_string() }
    }
}

impl From<serde_json::Error> for LinkError {
    fn from(err: serde_json::Error) -> Self {
        LinkError::DiscoveryParse { details: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn messages_carry_their_context(
            operation in "[a-z ]{1,24}",
            reason in ".*",
            actual in 0usize..64usize,
            index in 0usize..1000usize,
            duration_ms in 1u64..60000u64
          ) {
            let transport = LinkError::transport(
              operation.clone(),
              std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe"),
            );
            prop_assert!(transport.to_string().contains(&operation));

            let config = LinkError::configuration(reason.clone());
            prop_assert!(config.to_string().contains(&reason));

            let mismatch = LinkError::frame_length_mismatch(FrameKind::Control, actual);
            let msg = mismatch.to_string();
            prop_assert!(msg.contains(&actual.to_string()));
            prop_assert!(msg.contains("expected 5"));

            let missing = LinkError::NoSuchVehicle { index };
            prop_assert!(missing.to_string().contains(&index.to_string()));

            let timeout = LinkError::Timeout {
              operation: operation.clone(),
              duration: Duration::from_millis(duration_ms),
            };
            prop_assert!(!timeout.to_string().is_empty());
          }

          #[test]
          fn only_channel_errors_end_sessions(details in ".*", actual in 0usize..64usize) {
            prop_assert!(!LinkError::discovery_parse(details.clone()).is_session_ending());
            prop_assert!(!LinkError::configuration(details.clone()).is_session_ending());
            prop_assert!(LinkError::frame_length_mismatch(FrameKind::Telemetry, actual).is_session_ending());
            prop_assert!(LinkError::transport(
              details,
              std::io::Error::from(std::io::ErrorKind::ConnectionReset),
            ).is_session_ending());
          }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<LinkError>();

        let error = LinkError::configuration("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn transport_errors_keep_their_source() {
        let err = LinkError::transport(
            "control send",
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe"),
        );
        let source = std::error::Error::source(&err).expect("transport errors carry a source");
        assert_eq!(source.to_string(), "broken pipe");
    }

    #[test]
    fn frame_length_mismatch_uses_wire_size() {
        match LinkError::frame_length_mismatch(FrameKind::Telemetry, 27) {
            LinkError::FrameLengthMismatch { expected, actual, .. } => {
                assert_eq!(expected, 28);
                assert_eq!(actual, 27);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn recovery_methods_work() {
        let transport =
            LinkError::transport("accept", std::io::Error::from(std::io::ErrorKind::Other));
        let config = LinkError::configuration("port 0");

        assert!(transport.is_retryable());
        assert!(!config.is_retryable());
        assert!(!LinkError::SupervisorStopped.is_retryable());

        for suggestion in transport.recovery_suggestions() {
            assert!(suggestion.len() > 5);
        }
        assert!(!config.recovery_suggestions().is_empty());
    }

    #[test]
    fn from_conversions_work() {
        let yaml_err = serde_yaml_ng::from_str::<u16>("[not, a, port]").unwrap_err();
        assert!(matches!(LinkError::from(yaml_err), LinkError::ConfigParse { .. }));

        let json_err = serde_json::from_str::<u16>("{").unwrap_err();
        assert!(matches!(LinkError::from(json_err), LinkError::DiscoveryParse { .. }));
    }
}
