//! Locating a live fix on the route.
//!
//! The bus is assumed to travel the straight line between its current stop and
//! the next one. Progress along that leg is the ratio of the distance already
//! covered to the leg length, and the stop counts as reached once the fix is
//! within the advancement threshold of the next stop.

use geo_types::Point;
use tracing::debug;

use crate::{
    distance::{checked_distance, is_valid_position},
    stop::Stop,
};

/// Absolute floor of the advancement threshold, in meters.
pub const ADVANCE_FLOOR_M: f64 = 5.0;
/// Share of the leg length that also counts as having reached the next stop.
pub const ADVANCE_FRACTION: f64 = 0.1;

pub fn advance_threshold(leg_length: f64) -> f64 {
    ADVANCE_FLOOR_M.max(leg_length * ADVANCE_FRACTION)
}

/// Where a fix placed the bus, measured on the leg it was travelling when the fix arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegProgress {
    pub leg_index: usize,
    pub progress: f64,
    pub distance_to_next: f64,
    pub leg_length: f64,
    pub advanced: bool,
}

impl LegProgress {
    /// Rows travelled from the first stop, fractional part included.
    pub fn rows(&self) -> f64 {
        self.leg_index as f64 + self.progress
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressState {
    current_stop_index: usize,
    progress: f64,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_stop_index(&self) -> usize {
        self.current_stop_index
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Rows travelled according to the latest accepted fix.
    pub fn rows(&self) -> f64 {
        self.current_stop_index as f64 + self.progress
    }

    /// Places `fix` on the current leg and advances to the next stop once it is reached.
    ///
    /// Returns `None` and leaves the state untouched when there is no leg left to
    /// travel, a coordinate is missing or invalid, or the leg has zero length.
    pub fn apply_fix(&mut self, stops: &[Stop], fix: Point) -> Option<LegProgress> {
        let index = self.current_stop_index;
        if stops.len() < 2 || index >= stops.len() - 1 {
            return None;
        }
        if !is_valid_position(fix) {
            debug!("Ignoring fix with invalid coordinates {:?}", fix);
            return None;
        }

        let current = stops[index].position();
        let next = stops[index + 1].position();

        let Some(leg_length) = checked_distance(current, next) else {
            debug!("Leg {} has a stop without coordinates", index);
            return None;
        };
        if leg_length == 0.0 {
            debug!("Leg {} has zero length", index);
            return None;
        }

        // Both are Some here, the leg distance was computed from them.
        let distance_from_current = checked_distance(Some(fix), current)?;
        let distance_to_next = checked_distance(Some(fix), next)?;

        let progress = (distance_from_current / leg_length).clamp(0.0, 1.0);
        let advanced = distance_to_next < advance_threshold(leg_length);

        if advanced {
            self.current_stop_index = (index + 1).min(stops.len() - 1);
            self.progress = 0.0;
            debug!("Reached stop {}", self.current_stop_index);
        } else {
            self.progress = progress;
        }

        Some(LegProgress {
            leg_index: index,
            progress,
            distance_to_next,
            leg_length,
            advanced,
        })
    }
}
