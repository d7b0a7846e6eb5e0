use run_tracker_lib::SessionState;
use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    session::{IngestOutcome, TrackSnapshot, TrackingSession},
    TrackingError,
};

enum SessionCommand {
    Stop(oneshot::Sender<Result<TrackSnapshot, TrackingError>>),
}

/// Handle to a session running in its own task. Snapshots are published
/// after every appended fix; the session stops when `stop` is called or the
/// last handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<TrackSnapshot>,
}

impl SessionHandle {
    pub fn snapshot(&self) -> TrackSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Waits until a new snapshot is published.
    pub async fn changed(&mut self) -> Result<TrackSnapshot, TrackingError> {
        self.snapshots.changed().await.map_err(|_| TrackingError::SessionClosed)?;
        Ok(self.snapshots.borrow_and_update().clone())
    }

    /// Stops the session and returns its final snapshot. No fix is ingested
    /// after this returns.
    pub async fn stop(&self) -> Result<TrackSnapshot, TrackingError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::Stop(reply))
            .await
            .map_err(|_| TrackingError::SessionClosed)?;

        response.await.map_err(|_| TrackingError::SessionClosed)?
    }
}

impl TrackingSession {
    /// Moves a tracking session into a background task.
    pub fn spawn(self) -> Result<SessionHandle, TrackingError> {
        if self.state() != SessionState::Tracking {
            return Err(TrackingError::InvalidState {
                action: "spawn",
                state: self.state(),
            });
        }

        let (commands, command_receiver) = mpsc::channel(8);
        let (snapshot_sender, snapshots) = watch::channel(self.snapshot());

        tokio::spawn(run(self, command_receiver, snapshot_sender));

        Ok(SessionHandle { commands, snapshots })
    }
}

async fn run(
    mut session: TrackingSession,
    mut commands: mpsc::Receiver<SessionCommand>,
    snapshots: watch::Sender<TrackSnapshot>,
) {
    loop {
        tokio::select! {
            // Stop requests win over queued fixes
            biased;

            command = commands.recv() => {
                let reply = match command {
                    Some(SessionCommand::Stop(reply)) => Some(reply),
                    None => {
                        tracing::info!("All session handles dropped, stopping");
                        None
                    }
                };

                let result = session.stop().await;
                if let Ok(snapshot) = &result {
                    snapshots.send_replace(snapshot.clone());
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
                break;
            }

            event = session.next_event(), if session.accepts_events() => {
                let Some(event) = event else {
                    continue;
                };
                if let IngestOutcome::Appended { .. } = session.handle_event(event) {
                    snapshots.send_replace(session.snapshot());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use run_tracker_lib::RawFix;

    use super::*;
    use crate::{scripted_provider::ScriptedProvider, FixEvent, TrackingConfig};

    async fn tracking(provider: &Arc<ScriptedProvider>) -> TrackingSession {
        let mut session = TrackingSession::new(provider.clone(), TrackingConfig::default());
        session.start().await.unwrap();
        session
    }

    fn event(latitude: f64, longitude: f64) -> FixEvent {
        FixEvent::single(RawFix::new(latitude, longitude, 5., 0))
    }

    #[tokio::test]
    async fn spawn_requires_tracking() {
        let provider = Arc::new(ScriptedProvider::granting());
        let session = TrackingSession::new(provider.clone(), TrackingConfig::default());

        assert!(matches!(
            session.spawn(),
            Err(TrackingError::InvalidState { action: "spawn", state: SessionState::Idle })
        ));
    }

    #[tokio::test]
    async fn publishes_snapshots() {
        let provider = Arc::new(ScriptedProvider::granting());
        let mut handle = tracking(&provider).await.spawn().unwrap();
        let sender = provider.sender().await;

        assert_eq!(handle.snapshot().state, SessionState::Tracking);
        assert!(handle.snapshot().path.is_empty());

        sender.send(event(0., 0.)).await.unwrap();
        let first = handle.changed().await.unwrap();
        assert_eq!(first.path.len(), 1);

        // Rejected and failed deliveries publish nothing, the next valid fix does
        sender.send(event(f64::NAN, f64::NAN)).await.unwrap();
        sender.send(FixEvent::error("temporarily unavailable")).await.unwrap();
        sender.send(event(0., 0.001)).await.unwrap();
        let second = handle.changed().await.unwrap();

        assert_eq!(second.path.len(), 2);
        assert!((second.total_distance_meters() - 111.19).abs() < 1.1119);
    }

    #[tokio::test]
    async fn stop_returns_final_snapshot() {
        let provider = Arc::new(ScriptedProvider::granting());
        let mut handle = tracking(&provider).await.spawn().unwrap();
        let sender = provider.sender().await;

        sender.send(event(0., 0.)).await.unwrap();
        handle.changed().await.unwrap();

        let stopped = handle.stop().await.unwrap();
        assert_eq!(stopped.state, SessionState::Stopped);
        assert_eq!(stopped.path.len(), 1);
        assert_eq!(handle.snapshot(), stopped);
        assert_eq!(provider.unsubscribed().await.len(), 1);
    }

    #[tokio::test]
    async fn nothing_changes_after_stop() {
        let provider = Arc::new(ScriptedProvider::granting());
        let handle = tracking(&provider).await.spawn().unwrap();
        let sender = provider.sender().await;

        // In flight when the stop arrives
        sender.send(event(0., 0.)).await.unwrap();
        sender.send(event(0., 0.001)).await.unwrap();
        let stopped = handle.stop().await.unwrap();

        assert!(sender.send(event(0., 0.002)).await.is_err());
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(handle.snapshot(), stopped);
        assert_eq!(handle.snapshot().state, SessionState::Stopped);
    }

    #[tokio::test]
    async fn stopping_twice_reports_closed_session() {
        let provider = Arc::new(ScriptedProvider::granting());
        let handle = tracking(&provider).await.spawn().unwrap();
        let other = handle.clone();

        handle.stop().await.unwrap();

        assert!(matches!(other.stop().await, Err(TrackingError::SessionClosed)));
    }

    #[tokio::test]
    async fn dropping_handles_stops_the_session() {
        let provider = Arc::new(ScriptedProvider::granting());
        let handle = tracking(&provider).await.spawn().unwrap();
        let mut watcher = handle.snapshots.clone();

        drop(handle);

        watcher.changed().await.unwrap();
        assert_eq!(watcher.borrow().state, SessionState::Stopped);
        assert_eq!(provider.unsubscribed().await.len(), 1);
    }

    #[tokio::test]
    async fn closed_stream_waits_for_stop() {
        let provider = Arc::new(ScriptedProvider::granting());
        let handle = tracking(&provider).await.spawn().unwrap();

        provider.drop_sender().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(handle.snapshot().state, SessionState::Tracking);
        let stopped = handle.stop().await.unwrap();
        assert_eq!(stopped.state, SessionState::Stopped);
    }
}
