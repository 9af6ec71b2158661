use std::time::{Duration, Instant};

/// Height of one stop row in the schedule, in display units.
pub const DEFAULT_ROW_HEIGHT: f64 = 100.0;
/// Length of every marker transition, no matter how far the marker moves.
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerState {
    /// No valid fix yet. The marker rests on the first row.
    Uninitialized,
    Tracking(Transition),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: f64,
    pub to: f64,
    pub started: Instant,
}

/// Eases the bus marker between positions derived from `(stop index + progress)`.
#[derive(Debug, Clone)]
pub struct MarkerAnimator {
    row_height: f64,
    duration: Duration,
    state: MarkerState,
}

impl Default for MarkerAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_HEIGHT, DEFAULT_TRANSITION)
    }
}

impl MarkerAnimator {
    pub fn new(row_height: f64, duration: Duration) -> Self {
        Self {
            row_height,
            duration,
            state: MarkerState::Uninitialized,
        }
    }

    pub fn state(&self) -> MarkerState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, MarkerState::Tracking(_))
    }

    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    /// Starts a transition towards `rows` travelled, beginning wherever the marker is drawn right now.
    pub fn move_to_rows(&mut self, rows: f64, now: Instant) {
        let to = rows * self.row_height;
        let from = self.position_at(now);
        self.state = MarkerState::Tracking(Transition { from, to, started: now });
    }

    /// Where the marker should be drawn at `now`.
    pub fn position_at(&self, now: Instant) -> f64 {
        match self.state {
            MarkerState::Uninitialized => 0.0,
            MarkerState::Tracking(transition) => {
                let t = self.fraction(transition.started, now);
                transition.from + (transition.to - transition.from) * ease_in_out(t)
            }
        }
    }

    /// The position the marker is heading for.
    pub fn target(&self) -> Option<f64> {
        match self.state {
            MarkerState::Uninitialized => None,
            MarkerState::Tracking(transition) => Some(transition.to),
        }
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        match self.state {
            MarkerState::Uninitialized => true,
            MarkerState::Tracking(transition) => self.fraction(transition.started, now) >= 1.0,
        }
    }

    fn fraction(&self, started: Instant, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Cubic ease-in-out on `[0, 1]`.
fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn starts_uninitialized_on_first_row() {
        let marker = MarkerAnimator::default();
        let now = Instant::now();

        assert!(!marker.is_tracking());
        assert_eq!(marker.position_at(now), 0.0);
        assert_eq!(marker.target(), None);
    }

    #[test]
    fn eases_to_target_over_fixed_duration() {
        let mut marker = MarkerAnimator::default();
        let start = Instant::now();
        marker.move_to_rows(2.5, start);

        assert!(marker.is_tracking());
        assert_eq!(marker.target(), Some(250.0));
        assert_eq!(marker.position_at(start), 0.0);
        assert_abs_diff_eq!(marker.position_at(start + Duration::from_millis(500)), 125.0, epsilon = 1e-9);
        assert_eq!(marker.position_at(start + Duration::from_secs(1)), 250.0);
        assert_eq!(marker.position_at(start + Duration::from_secs(5)), 250.0);
        assert!(marker.is_settled(start + Duration::from_secs(1)));
    }

    #[test]
    fn duration_does_not_depend_on_distance() {
        let start = Instant::now();
        let mut short = MarkerAnimator::default();
        let mut long = MarkerAnimator::default();
        short.move_to_rows(0.1, start);
        long.move_to_rows(40.0, start);

        let almost = start + Duration::from_millis(999);
        assert!(!short.is_settled(almost));
        assert!(!long.is_settled(almost));
        assert!(short.is_settled(start + DEFAULT_TRANSITION));
        assert!(long.is_settled(start + DEFAULT_TRANSITION));
    }

    #[test]
    fn retarget_starts_from_drawn_position() {
        let mut marker = MarkerAnimator::default();
        let start = Instant::now();
        marker.move_to_rows(2.0, start);

        let midway = start + Duration::from_millis(500);
        let drawn = marker.position_at(midway);
        marker.move_to_rows(3.0, midway);

        assert_abs_diff_eq!(marker.position_at(midway), drawn, epsilon = 1e-9);
        assert_eq!(marker.position_at(midway + DEFAULT_TRANSITION), 300.0);
    }

    #[test]
    fn easing_is_monotonic() {
        let mut previous = 0.0;
        for step in 0..=100 {
            let value = ease_in_out(step as f64 / 100.0);
            assert!(value >= previous);
            previous = value;
        }
        assert_eq!(ease_in_out(1.0), 1.0);
    }
}
