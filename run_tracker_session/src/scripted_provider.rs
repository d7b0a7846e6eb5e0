use std::{
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use run_tracker_lib::RawFix;
use tokio::sync::{mpsc, Mutex};

use crate::{
    FixEvent, FixSubscription, LocationError, LocationProvider, PermissionStatus, SubscriptionConfig,
    SubscriptionId,
};

/// Location provider for tests. Answers permission requests as configured and
/// hands the test the sending half of the latest subscription.
pub(crate) struct ScriptedProvider {
    pub foreground: PermissionStatus,
    pub background: PermissionStatus,
    pub current_fix: Result<RawFix, LocationError>,
    pub failing_subscriptions: AtomicUsize,
    pub background_requests: AtomicUsize,
    pub subscribe_calls: AtomicUsize,
    pub next_id: AtomicU64,
    pub sender: Mutex<Option<mpsc::Sender<FixEvent>>>,
    pub unsubscribed: Mutex<Vec<SubscriptionId>>,
    pub unsubscribe_delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn granting() -> Self {
        Self {
            foreground: PermissionStatus::Granted,
            background: PermissionStatus::Granted,
            current_fix: Ok(RawFix::new(56.175188, 10.196123, 5., 0)),
            failing_subscriptions: AtomicUsize::new(0),
            background_requests: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            sender: Mutex::new(None),
            unsubscribed: Mutex::new(Vec::new()),
            unsubscribe_delay: None,
        }
    }

    pub fn with_failing_subscriptions(self, count: usize) -> Self {
        self.failing_subscriptions.store(count, Ordering::SeqCst);
        self
    }

    pub fn background_requests(&self) -> usize {
        self.background_requests.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub async fn sender(&self) -> mpsc::Sender<FixEvent> {
        self.sender.lock().await.clone().expect("no active subscription")
    }

    pub async fn drop_sender(&self) {
        self.sender.lock().await.take();
    }

    pub async fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.unsubscribed.lock().await.clone()
    }
}

#[async_trait]
impl LocationProvider for ScriptedProvider {
    async fn request_foreground_permission(&self) -> PermissionStatus {
        self.foreground
    }

    async fn request_background_permission(&self) -> PermissionStatus {
        self.background_requests.fetch_add(1, Ordering::SeqCst);
        self.background
    }

    async fn current_fix(&self) -> Result<RawFix, LocationError> {
        self.current_fix.clone()
    }

    async fn subscribe(&self, config: &SubscriptionConfig) -> Result<FixSubscription, LocationError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self.failing_subscriptions.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_subscriptions.store(failing - 1, Ordering::SeqCst);
            return Err(LocationError::new("background location rejected"));
        }

        let (sender, receiver) = mpsc::channel(config.event_buffer);
        *self.sender.lock().await = Some(sender);

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        Ok(FixSubscription::new(id, receiver))
    }

    async fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(delay) = self.unsubscribe_delay {
            tokio::time::sleep(delay).await;
        }
        self.unsubscribed.lock().await.push(id);
        self.sender.lock().await.take();
    }
}
