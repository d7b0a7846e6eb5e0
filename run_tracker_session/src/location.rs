use async_trait::async_trait;
use run_tracker_lib::RawFix;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::SubscriptionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Foreground,
    Background,
}

/// Error reported by the platform location subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct LocationError(pub String);

impl LocationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One delivery from a location subscription. A platform may batch several
/// fixes into one event, and may report an error alongside or instead of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixEvent {
    pub fixes: Vec<RawFix>,
    pub error: Option<String>,
}

impl FixEvent {
    pub fn single(fix: RawFix) -> Self {
        Self {
            fixes: vec![fix],
            error: None,
        }
    }

    pub fn batch(fixes: Vec<RawFix>) -> Self {
        Self { fixes, error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            fixes: Vec::new(),
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Receiving end of a location subscription.
#[derive(Debug)]
pub struct FixSubscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<FixEvent>,
}

impl FixSubscription {
    pub fn new(id: SubscriptionId, receiver: mpsc::Receiver<FixEvent>) -> Self {
        Self { id, receiver }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<FixEvent> {
        self.receiver.recv().await
    }

    /// Refuses further events. Events already queued are discarded with the subscription.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

/// The platform side of tracking: permissions, one-shot positions and
/// background location updates.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn request_foreground_permission(&self) -> PermissionStatus;

    async fn request_background_permission(&self) -> PermissionStatus;

    async fn current_fix(&self) -> Result<RawFix, LocationError>;

    async fn subscribe(&self, config: &SubscriptionConfig) -> Result<FixSubscription, LocationError>;

    async fn unsubscribe(&self, id: SubscriptionId);
}
