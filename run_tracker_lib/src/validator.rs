use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::position_fix::{PositionFix, RawFix};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RejectionReason {
    #[error("fix has no coordinates")]
    MissingCoordinate,
    #[error("fix coordinates are not finite")]
    NonFiniteCoordinate,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("fix carries a null or zero accuracy")]
    SentinelAccuracy,
    #[error("accuracy {accuracy} m exceeds the {max} m limit")]
    AccuracyTooLow { accuracy: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Fixes with a larger accuracy radius are rejected. `None` accepts whatever the platform delivers.
    pub max_accuracy_meters: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FixValidator {
    config: ValidatorConfig,
}

impl FixValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn validate(&self, fix: PositionFix) -> Result<PositionFix, RejectionReason> {
        if !fix.latitude.is_finite() || !fix.longitude.is_finite() {
            return Err(RejectionReason::NonFiniteCoordinate);
        }
        if !(-90.0..=90.0).contains(&fix.latitude) {
            return Err(RejectionReason::LatitudeOutOfRange(fix.latitude));
        }
        if !(-180.0..=180.0).contains(&fix.longitude) {
            return Err(RejectionReason::LongitudeOutOfRange(fix.longitude));
        }

        // Some platforms emit zero-accuracy fixes that never came from a receiver
        if !fix.accuracy_meters.is_finite() || fix.accuracy_meters <= 0.0 {
            return Err(RejectionReason::SentinelAccuracy);
        }
        if let Some(max) = self.config.max_accuracy_meters {
            if fix.accuracy_meters > max {
                return Err(RejectionReason::AccuracyTooLow {
                    accuracy: fix.accuracy_meters,
                    max,
                });
            }
        }

        Ok(fix)
    }

    /// Resolves a payload from the location subsystem into a checked fix.
    pub fn validate_raw(&self, raw: RawFix) -> Result<PositionFix, RejectionReason> {
        let (Some(latitude), Some(longitude)) = (raw.latitude, raw.longitude) else {
            return Err(RejectionReason::MissingCoordinate);
        };
        let Some(accuracy_meters) = raw.accuracy_meters else {
            return Err(RejectionReason::SentinelAccuracy);
        };

        self.validate(PositionFix::new(
            latitude,
            longitude,
            accuracy_meters,
            raw.timestamp_ms.unwrap_or(0),
        ))
    }
}
