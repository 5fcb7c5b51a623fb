#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Score accumulator fed by distance travelled, tricks, and grinds.

use celo_riders_core::Score;

/// Points awarded per world unit travelled.
const DISTANCE_POINTS_PER_UNIT: f64 = 0.1;
/// Points awarded per tick spent grinding.
const GRIND_TICK_POINTS: f64 = 1.0;

/// Accumulates raw points for a single run.
///
/// Distance is credited fractionally, so the accumulator keeps sub-point
/// precision internally and only exposes whole points through [`points`].
///
/// [`points`]: ScoreAccumulator::points
#[derive(Clone, Debug, Default)]
pub struct ScoreAccumulator {
    value: f64,
}

impl ScoreAccumulator {
    /// Creates an accumulator at zero points.
    #[must_use]
    pub const fn new() -> Self {
        Self { value: 0.0 }
    }

    /// Credits points for distance travelled. Negative or non-finite distances are ignored.
    pub fn add_distance(&mut self, distance: f32) {
        if !distance.is_finite() || distance <= 0.0 {
            tracing::debug!(distance, "ignoring non-positive distance");
            return;
        }
        self.value += f64::from(distance) * DISTANCE_POINTS_PER_UNIT;
    }

    /// Credits the points awarded for a trick or an enemy defeat.
    pub fn add_trick(&mut self, points: u64) {
        self.value += points as f64;
    }

    /// Credits the constant bonus for one tick spent grinding.
    pub fn add_grind_tick(&mut self) {
        self.value += GRIND_TICK_POINTS;
    }

    /// Resets the accumulator to zero points.
    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    /// Whole points accumulated so far.
    #[must_use]
    pub fn points(&self) -> Score {
        Score::new(self.value.floor() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_credited_at_a_tenth_of_a_point() {
        let mut score = ScoreAccumulator::new();
        score.add_distance(100.0);
        assert_eq!(score.points(), Score::new(10));
    }

    #[test]
    fn fractional_distance_accumulates_before_flooring() {
        let mut score = ScoreAccumulator::new();
        for _ in 0..4 {
            score.add_distance(3.0);
        }
        assert_eq!(score.points(), Score::new(1));
    }

    #[test]
    fn grinds_and_tricks_add_whole_points() {
        let mut score = ScoreAccumulator::new();
        score.add_grind_tick();
        score.add_grind_tick();
        score.add_trick(50);
        assert_eq!(score.points(), Score::new(52));
    }

    #[test]
    fn negative_distance_is_ignored() {
        let mut score = ScoreAccumulator::new();
        score.add_distance(-40.0);
        score.add_distance(f32::NAN);
        assert_eq!(score.points(), Score::ZERO);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut score = ScoreAccumulator::new();
        score.add_trick(75);
        score.reset();
        assert_eq!(score.points(), Score::ZERO);
    }
}
