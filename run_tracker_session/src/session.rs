use std::sync::Arc;

use run_tracker_lib::{
    Coordinate, FixValidator, PathAccumulator, PathSnapshot, PositionFix, RejectionReason, SessionState,
};
use serde::Serialize;

use crate::{
    config::TrackingConfig,
    location::{FixEvent, FixSubscription, LocationProvider, PermissionKind},
    TrackingError,
};

/// What the rendering layer gets to see of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub path: PathSnapshot,
    pub state: SessionState,
    /// Position captured when tracking started, used to center the map.
    pub map_center: Option<Coordinate>,
}

impl TrackSnapshot {
    pub fn total_distance_meters(&self) -> f64 {
        self.path.total_distance_meters()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestOutcome {
    Appended { segment_meters: f64 },
    Rejected(RejectionReason),
    DeliveryError,
    EmptyEvent,
    Ignored(SessionState),
}

pub struct TrackingSession {
    provider: Arc<dyn LocationProvider>,
    config: TrackingConfig,
    validator: FixValidator,
    state: SessionState,
    path: PathAccumulator,
    map_center: Option<PositionFix>,
    subscription: Option<FixSubscription>,
    stream_ended: bool,
}

impl TrackingSession {
    pub fn new(provider: Arc<dyn LocationProvider>, config: TrackingConfig) -> Self {
        Self {
            provider,
            validator: FixValidator::new(config.validator),
            config,
            state: SessionState::Idle,
            path: PathAccumulator::new(),
            map_center: None,
            subscription: None,
            stream_ended: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            path: self.path.snapshot(),
            state: self.state,
            map_center: self.map_center.map(|fix| fix.coordinate()),
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(self.state.can_transition_to(next), "{:?} -> {:?}", self.state, next);
        tracing::info!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Asks for permissions, captures the initial position and subscribes to
    /// location updates. May be retried after a failed subscription.
    pub async fn start(&mut self) -> Result<(), TrackingError> {
        match self.state {
            SessionState::Idle => self.transition(SessionState::AwaitingPermission),
            SessionState::AwaitingPermission => tracing::info!("Retrying session start"),
            state => return Err(TrackingError::InvalidState { action: "start", state }),
        }

        let foreground = self.provider.request_foreground_permission().await;
        if !foreground.is_granted() {
            tracing::warn!("Foreground location permission not granted: {:?}", foreground);
            self.transition(SessionState::Idle);
            return Err(TrackingError::PermissionDenied(PermissionKind::Foreground, foreground));
        }

        let background = self.provider.request_background_permission().await;
        if !background.is_granted() {
            tracing::warn!("Background location permission not granted: {:?}", background);
            self.transition(SessionState::Idle);
            return Err(TrackingError::PermissionDenied(PermissionKind::Background, background));
        }

        let initial = self.provider.current_fix().await.map_err(|err| {
            tracing::error!("Failed to get initial position: {err}");
            TrackingError::InitialFix(err)
        })?;

        let map_center = match self.validator.validate_raw(initial) {
            Ok(fix) => Some(fix),
            Err(reason) => {
                tracing::warn!("Initial position rejected, map center unknown: {reason}");
                None
            }
        };

        let subscription = self.provider.subscribe(&self.config.subscription).await.map_err(|err| {
            tracing::error!("Failed to start location updates: {err}");
            TrackingError::Subscription(err)
        })?;

        tracing::info!("Subscribed to location updates with {:?}", subscription.id());

        self.path = PathAccumulator::new();
        self.map_center = map_center;
        self.subscription = Some(subscription);
        self.stream_ended = false;
        self.transition(SessionState::Tracking);

        Ok(())
    }

    pub(crate) fn accepts_events(&self) -> bool {
        self.state == SessionState::Tracking && self.subscription.is_some() && !self.stream_ended
    }

    /// Waits for the next delivery. `None` once the session is not tracking or
    /// the provider has closed the stream.
    pub async fn next_event(&mut self) -> Option<FixEvent> {
        if !self.accepts_events() {
            return None;
        }

        let event = self.subscription.as_mut()?.recv().await;
        if event.is_none() {
            tracing::warn!("Location update stream closed by provider");
            self.stream_ended = true;
        }
        event
    }

    pub fn handle_event(&mut self, event: FixEvent) -> IngestOutcome {
        if self.state != SessionState::Tracking {
            tracing::warn!("Dropping location update received while {:?}", self.state);
            return IngestOutcome::Ignored(self.state);
        }

        if let Some(error) = &event.error {
            tracing::warn!("Error updating location: {error}");
            return IngestOutcome::DeliveryError;
        }

        let batch_size = event.fixes.len();
        // Only the first fix of a batch is used
        let Some(raw) = event.fixes.into_iter().next() else {
            tracing::debug!("Location update without fixes");
            return IngestOutcome::EmptyEvent;
        };
        if batch_size > 1 {
            tracing::debug!("Dropping {} batched fixes", batch_size - 1);
        }

        match self.validator.validate_raw(raw) {
            Ok(fix) => {
                let segment_meters = self.path.append(fix);
                tracing::debug!(
                    latitude = fix.latitude,
                    longitude = fix.longitude,
                    segment_meters,
                    total_meters = self.path.total_distance_meters(),
                    "Appended fix {}",
                    self.path.len()
                );
                IngestOutcome::Appended { segment_meters }
            }
            Err(reason) => {
                tracing::warn!("Dropping invalid fix {:?}: {reason}", raw);
                IngestOutcome::Rejected(reason)
            }
        }
    }

    /// Unsubscribes from location updates, then ends the session.
    pub async fn stop(&mut self) -> Result<TrackSnapshot, TrackingError> {
        if self.state != SessionState::Tracking {
            return Err(TrackingError::InvalidState { action: "stop", state: self.state });
        }

        // The subscription is only dropped once the provider confirmed, so a
        // cancelled stop leaves it in place for the next attempt
        if let Some(subscription) = self.subscription.as_mut() {
            subscription.close();
            let id = subscription.id();
            self.provider.unsubscribe(id).await;
            self.subscription = None;
        }

        self.transition(SessionState::Stopped);

        tracing::info!(
            "Session ended with {} fixes over {:.1} m",
            self.path.len(),
            self.path.total_distance_meters()
        );

        Ok(self.snapshot())
    }
}
