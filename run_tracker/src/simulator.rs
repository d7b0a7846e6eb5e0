use std::{collections::HashSet, f64::consts::TAU, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use run_tracker_lib::{distance::haversine_distance, Coordinate, RawFix};
use run_tracker_session::{
    FixEvent, FixSubscription, LocationError, LocationProvider, PermissionStatus, SubscriptionConfig,
    SubscriptionId,
};
use tokio::sync::{mpsc, Mutex};

const METERS_PER_DEGREE: f64 = 111_320.;

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub start: Coordinate,
    pub step_meters: f64,
    pub accuracy_meters: f64,
    /// Chance per event of delivering a fix without usable coordinates.
    pub invalid_rate: f64,
    /// Chance per event of delivering an error instead of a fix.
    pub error_rate: f64,
    pub grant_background: bool,
    pub seed: u64,
}

/// Location provider that walks randomly away from a start coordinate.
pub struct SimulatedProvider {
    config: SimulatorConfig,
    active: Arc<Mutex<HashSet<SubscriptionId>>>,
    next_id: Mutex<u64>,
}

impl SimulatedProvider {
    pub fn new(mut config: SimulatorConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(config.invalid_rate.is_finite(), "invalid rate must be a number, got {}", config.invalid_rate);
        anyhow::ensure!(config.error_rate.is_finite(), "error rate must be a number, got {}", config.error_rate);

        config.invalid_rate = config.invalid_rate.clamp(0., 1.);
        config.error_rate = config.error_rate.clamp(0., 1.);

        Ok(Self {
            config,
            active: Arc::new(Mutex::new(HashSet::new())),
            next_id: Mutex::new(0),
        })
    }
}

#[async_trait]
impl LocationProvider for SimulatedProvider {
    async fn request_foreground_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request_background_permission(&self) -> PermissionStatus {
        if self.config.grant_background {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn current_fix(&self) -> Result<RawFix, LocationError> {
        Ok(RawFix::new(
            self.config.start.latitude,
            self.config.start.longitude,
            self.config.accuracy_meters,
            Utc::now().timestamp_millis(),
        ))
    }

    async fn subscribe(&self, config: &SubscriptionConfig) -> Result<FixSubscription, LocationError> {
        if config.event_buffer == 0 {
            return Err(LocationError::new("event buffer must hold at least one event"));
        }

        let id = {
            let mut next_id = self.next_id.lock().await;
            *next_id += 1;
            SubscriptionId(*next_id)
        };
        self.active.lock().await.insert(id);

        tracing::info!(
            "Starting {:?} updates every {} ms: {} - {}",
            config.accuracy,
            config.time_interval_ms,
            config.notification.title,
            config.notification.body
        );

        let (sender, receiver) = mpsc::channel(config.event_buffer);
        tokio::spawn(walk(
            id,
            self.config.clone(),
            config.clone(),
            self.active.clone(),
            sender,
        ));

        Ok(FixSubscription::new(id, receiver))
    }

    async fn unsubscribe(&self, id: SubscriptionId) {
        if self.active.lock().await.remove(&id) {
            tracing::info!("Stopped location updates for {:?}", id);
        }
    }
}

async fn walk(
    id: SubscriptionId,
    simulator: SimulatorConfig,
    subscription: SubscriptionConfig,
    active: Arc<Mutex<HashSet<SubscriptionId>>>,
    sender: mpsc::Sender<FixEvent>,
) {
    let mut rng = StdRng::seed_from_u64(simulator.seed);
    let mut ticker = tokio::time::interval(Duration::from_millis(subscription.time_interval_ms.max(1)));

    let mut position = simulator.start;
    let mut last_reported = simulator.start;
    let mut heading = rng.random_range(0.0..TAU);

    loop {
        ticker.tick().await;
        if !active.lock().await.contains(&id) {
            break;
        }

        heading += rng.random_range(-0.4..0.4);
        position = step(position, heading, simulator.step_meters);

        let moved = haversine_distance(
            (last_reported.latitude, last_reported.longitude),
            (position.latitude, position.longitude),
        );
        if moved < subscription.distance_interval_meters {
            continue;
        }

        let event = if rng.random_bool(simulator.error_rate) {
            FixEvent::error("Simulated receiver dropout")
        } else if rng.random_bool(simulator.invalid_rate) {
            FixEvent::single(RawFix {
                latitude: Some(f64::NAN),
                longitude: Some(f64::NAN),
                ..Default::default()
            })
        } else {
            last_reported = position;
            FixEvent::single(RawFix::new(
                position.latitude,
                position.longitude,
                simulator.accuracy_meters,
                Utc::now().timestamp_millis(),
            ))
        };

        if sender.send(event).await.is_err() {
            break;
        }
    }

    tracing::debug!("Simulated updates for {:?} ended", id);
}

fn step(from: Coordinate, heading: f64, meters: f64) -> Coordinate {
    let north = meters * heading.cos();
    let east = meters * heading.sin();

    let latitude = (from.latitude + north / METERS_PER_DEGREE).clamp(-90., 90.);
    let longitude = from.longitude + east / (METERS_PER_DEGREE * from.latitude.to_radians().cos().max(1e-6));

    Coordinate {
        latitude,
        // Wrap back into [-180, 180)
        longitude: (longitude + 180.).rem_euclid(360.) - 180.,
    }
}
