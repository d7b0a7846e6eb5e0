use std::path::PathBuf;

use run_tracker_lib::SessionState;
use thiserror::Error;

use crate::location::{LocationError, PermissionKind, PermissionStatus};

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("{0:?} location permission not granted ({1:?})")]
    PermissionDenied(PermissionKind, PermissionStatus),
    #[error("failed to get initial position: {0}")]
    InitialFix(LocationError),
    #[error("failed to start location updates: {0}")]
    Subscription(LocationError),
    #[error("cannot {action} a session that is {state:?}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },
    #[error("session task has ended")]
    SessionClosed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
