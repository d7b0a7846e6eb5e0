use std::sync::Arc;

use geo_types::LineString;
use serde::{Deserialize, Serialize};

use crate::{
    distance::distance_meters,
    position_fix::{Coordinate, PositionFix},
};

/// Append-only path of accepted fixes with its running distance.
///
/// The distance of every appended fix is measured against the fix directly
/// before it, so the total is the sum of consecutive segments. Fixes are kept
/// behind an `Arc`, snapshots share that storage and an append only copies it
/// while some snapshot is still alive.
#[derive(Debug, Clone, Default)]
pub struct PathAccumulator {
    fixes: Arc<Vec<PositionFix>>,
    total_distance_meters: f64,
}

impl PathAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the fix and returns the length of the new segment in meters.
    pub fn append(&mut self, fix: PositionFix) -> f64 {
        let segment = match self.fixes.last() {
            Some(last) => distance_meters(last, &fix).max(0.),
            None => 0.,
        };

        Arc::make_mut(&mut self.fixes).push(fix);
        self.total_distance_meters += segment;

        segment
    }

    pub fn snapshot(&self) -> PathSnapshot {
        PathSnapshot {
            fixes: self.fixes.clone(),
            total_distance_meters: self.total_distance_meters,
        }
    }

    pub fn last(&self) -> Option<&PositionFix> {
        self.fixes.last()
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn total_distance_meters(&self) -> f64 {
        self.total_distance_meters
    }
}

/// Immutable view of a path, captured together with its distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSnapshot {
    fixes: Arc<Vec<PositionFix>>,
    total_distance_meters: f64,
}

impl PathSnapshot {
    pub fn fixes(&self) -> &[PositionFix] {
        &self.fixes
    }

    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.fixes.iter().map(PositionFix::coordinate)
    }

    /// The path as a polyline, x = longitude and y = latitude.
    pub fn line_string(&self) -> LineString {
        self.fixes.iter().map(|fix| (fix.longitude, fix.latitude)).collect()
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn total_distance_meters(&self) -> f64 {
        self.total_distance_meters
    }
}
