use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::wire::Vector2;

const MAX_SAMPLES: usize = 20;

/// Bounded ring of recent `(position, timestamp)` samples per player, used
/// to rewind a target's position to the attacker's reported timestamp for
/// lag-compensated hit detection (spec 3, 4.8).
#[derive(Debug, Default)]
pub struct PositionHistory {
    samples: VecDeque<(Vector2, Instant)>,
}

impl PositionHistory {
    pub fn record(&mut self, position: Vector2, at: Instant) {
        if self.samples.len() >= MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back((position, at));
    }

    /// Interpolates between the two samples bracketing `at`, or falls back
    /// to the newest sample if `at` is outside the recorded window.
    pub fn position_at(&self, at: Instant) -> Option<Vector2> {
        if self.samples.is_empty() {
            return None;
        }

        if at >= self.samples.back().unwrap().1 {
            return Some(self.samples.back().unwrap().0);
        }
        if at <= self.samples.front().unwrap().1 {
            return Some(self.samples.front().unwrap().0);
        }

        for pair in self.samples.iter().collect::<Vec<_>>().windows(2) {
            let (pos_a, t_a) = *pair[0];
            let (pos_b, t_b) = *pair[1];
            if t_a <= at && at <= t_b {
                let span = t_b.duration_since(t_a).as_secs_f32();
                let frac = if span <= f32::EPSILON {
                    0.0
                } else {
                    at.duration_since(t_a).as_secs_f32() / span
                };
                return Some(pos_a + (pos_b - pos_a) * frac);
            }
        }

        Some(self.samples.back().unwrap().0)
    }

    /// Rewound position for lag compensation: interpolates to
    /// `now - latency` when `latency` is within the allowed cap, otherwise
    /// returns the current (newest) position (spec 4.8).
    pub fn rewind(&self, now: Instant, latency: Duration, cap: Duration) -> Option<Vector2> {
        if latency > cap {
            return self.samples.back().map(|(pos, _)| *pos);
        }
        self.position_at(now.checked_sub(latency).unwrap_or(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_bracketing_samples() {
        let mut history = PositionHistory::default();
        let t0 = Instant::now();
        history.record(Vector2(0.0, 0.0), t0);
        history.record(Vector2(10.0, 0.0), t0 + Duration::from_millis(100));

        let mid = history
            .position_at(t0 + Duration::from_millis(50))
            .unwrap();
        assert!((mid.0 - 5.0).abs() < 0.5);
    }

    #[test]
    fn falls_back_to_latest_outside_window() {
        let mut history = PositionHistory::default();
        let t0 = Instant::now();
        history.record(Vector2(0.0, 0.0), t0);
        history.record(Vector2(10.0, 0.0), t0 + Duration::from_millis(100));

        let at = t0 + Duration::from_secs(5);
        assert_eq!(history.position_at(at), Some(Vector2(10.0, 0.0)));
    }

    #[test]
    fn rewind_ignores_latency_beyond_cap() {
        let mut history = PositionHistory::default();
        let t0 = Instant::now();
        history.record(Vector2(0.0, 0.0), t0);
        history.record(Vector2(10.0, 0.0), t0 + Duration::from_millis(100));

        let now = t0 + Duration::from_millis(100);
        let rewound = history
            .rewind(now, Duration::from_millis(500), Duration::from_millis(200))
            .unwrap();
        assert_eq!(rewound, Vector2(10.0, 0.0));
    }
}
