use std::path::Path;

use run_tracker_lib::ValidatorConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyProfile {
    Lowest,
    Low,
    Balanced,
    High,
    Highest,
    #[default]
    BestForNavigation,
}

/// Text of the persistent notification shown while tracking in the background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub title: String,
    pub body: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "Tracking your location".into(),
            body: "We are tracking your location in the background".into(),
        }
    }
}

/// What is requested from the platform when subscribing to location updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    pub accuracy: AccuracyProfile,
    pub time_interval_ms: u64,
    pub distance_interval_meters: f64,
    pub deferred_updates_interval_ms: u64,
    pub deferred_updates_distance_meters: f64,
    pub notification: NotificationConfig,
    /// Depth of the channel fix events are delivered through.
    pub event_buffer: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            accuracy: AccuracyProfile::BestForNavigation,
            time_interval_ms: 1000,
            distance_interval_meters: 0.,
            deferred_updates_interval_ms: 1000,
            deferred_updates_distance_meters: 0.,
            notification: NotificationConfig::default(),
            event_buffer: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub validator: ValidatorConfig,
    pub subscription: SubscriptionConfig,
}

impl TrackingConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads a JSON config file. Keys left out keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let config = TrackingConfig::default();
        assert_eq!(config.validator.max_accuracy_meters, None);
        assert_eq!(config.subscription.accuracy, AccuracyProfile::BestForNavigation);
        assert_eq!(config.subscription.time_interval_ms, 1000);
        assert_eq!(config.subscription.distance_interval_meters, 0.);
        assert_eq!(config.subscription.event_buffer, 100);
        assert_eq!(config.subscription.notification.title, "Tracking your location");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = TrackingConfig::from_json_str(
            r#"{
                "validator": { "max_accuracy_meters": 25.0 },
                "subscription": { "accuracy": "Balanced", "notification": { "title": "Running" } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.validator.max_accuracy_meters, Some(25.));
        assert_eq!(config.subscription.accuracy, AccuracyProfile::Balanced);
        assert_eq!(config.subscription.time_interval_ms, 1000);
        assert_eq!(config.subscription.notification.title, "Running");
        assert_eq!(config.subscription.notification.body, NotificationConfig::default().body);
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "subscription": {{ "time_interval_ms": 250 }} }}"#).unwrap();

        let config = TrackingConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.subscription.time_interval_ms, 250);
    }

    #[test]
    fn missing_file() {
        let err = TrackingConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = TrackingConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
