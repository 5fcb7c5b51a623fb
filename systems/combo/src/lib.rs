#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combo tracker that turns bursts of airborne tricks and kills into bonus stars.
//!
//! The tracker is a three-state machine. The first airborne event opens a
//! pending attempt, the third activates the combo with a bonus of three stars,
//! and every further event adds two more. Landing resolves the attempt: an
//! active combo pays out the stars collected during it plus the bonus, while a
//! pending attempt is discarded without a reward or an event.
//!
//! Events registered while grounded are ignored outright. Internal faults
//! never escape: the tracker logs them and falls back to the inactive state,
//! dropping the attempt rather than corrupting the rest of the run.

use celo_riders_core::{ComboSnapshot, ComboStatus, Event, ObstacleKind, Score, Stars};
use thiserror::Error;

/// Airborne events required before a combo activates.
pub const ACTIVATION_THRESHOLD: u32 = 3;
/// Bonus stars granted when a combo activates.
pub const ACTIVATION_BONUS: u32 = 3;
/// Bonus stars added by every airborne event after activation.
pub const BONUS_PER_EVENT: u32 = 2;

/// Internal faults that force the tracker back to the inactive state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ComboError {
    /// A combo counter exceeded its numeric range.
    #[error("combo {counter} counter overflowed")]
    CounterOverflow {
        /// Name of the counter that overflowed.
        counter: &'static str,
    },
}

/// Tracks combo attempts for a single rider.
#[derive(Clone, Debug, Default)]
pub struct ComboTracker {
    state: ComboSnapshot,
}

impl ComboTracker {
    /// Creates a tracker with no attempt in progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a trick. Ignored while the rider is grounded.
    pub fn register_trick(
        &mut self,
        current_score: Score,
        grounded: bool,
        obstacle: Option<ObstacleKind>,
        out: &mut Vec<Event>,
    ) {
        if grounded {
            tracing::debug!("trick ignored, rider is grounded");
            return;
        }

        if let Some(obstacle) = obstacle {
            self.state.trick_obstacles.push(obstacle);
        }

        self.register_air_event(current_score, out);
        tracing::debug!(
            air_events = self.state.air_event_count,
            obstacles = self.state.trick_obstacles.len(),
            "trick registered"
        );
    }

    /// Records an enemy defeat. Ignored while the rider is grounded.
    pub fn register_enemy_kill(
        &mut self,
        current_score: Score,
        grounded: bool,
        out: &mut Vec<Event>,
    ) {
        if grounded {
            tracing::debug!("enemy kill ignored, rider is grounded");
            return;
        }

        self.register_air_event(current_score, out);
        tracing::debug!(
            air_events = self.state.air_event_count,
            "enemy kill registered"
        );
    }

    /// Consumes the rider's grounded transition for the current tick.
    ///
    /// Must be called once per tick. A transition from airborne to grounded
    /// resolves the attempt and returns the stars it earned; otherwise an
    /// active combo reports its running score delta and zero is returned.
    pub fn update_air_state(
        &mut self,
        current_score: Score,
        was_grounded: bool,
        grounded: bool,
        out: &mut Vec<Event>,
    ) -> Stars {
        if !was_grounded && grounded {
            return self.handle_landing(current_score, out);
        }

        if self.state.status == ComboStatus::Active {
            let score_points = self.score_since_start(current_score);
            self.state.score_points = score_points;
            out.push(Event::ComboUpdated {
                multiplier: self.state.multiplier,
                score_points,
            });
        }

        Stars::ZERO
    }

    /// Adds stars picked up while an attempt is pending or active.
    pub fn add_stars_to_combo(&mut self, stars: Stars) {
        if !self.has_combo() {
            return;
        }

        match self.state.stars_collected.checked_add(stars) {
            Some(total) => {
                self.state.stars_collected = total;
                tracing::debug!(added = stars.get(), total = total.get(), "stars added to combo");
            }
            None => self.recover(ComboError::CounterOverflow { counter: "star" }),
        }
    }

    /// Returns an immutable snapshot of the tracker's state.
    #[must_use]
    pub fn combo_state(&self) -> ComboSnapshot {
        self.state.clone()
    }

    /// Reports whether a combo is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.status == ComboStatus::Active
    }

    /// Reports whether an attempt is pending activation.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.status == ComboStatus::Pending
    }

    /// Reports whether any attempt is in progress.
    #[must_use]
    pub fn has_combo(&self) -> bool {
        self.state.status != ComboStatus::Inactive
    }

    /// Obstacles cleared during the current trick, in order.
    #[must_use]
    pub fn trick_obstacles(&self) -> &[ObstacleKind] {
        &self.state.trick_obstacles
    }

    /// Forgets the obstacles of the current trick once they have been announced.
    pub fn clear_trick_obstacles(&mut self) {
        self.state.trick_obstacles.clear();
    }

    fn register_air_event(&mut self, current_score: Score, out: &mut Vec<Event>) {
        if let Err(error) = self.advance(current_score, out) {
            self.recover(error);
        }
    }

    fn advance(&mut self, current_score: Score, out: &mut Vec<Event>) -> Result<(), ComboError> {
        match self.state.status {
            ComboStatus::Inactive => {
                self.state.status = ComboStatus::Pending;
                self.state.start_score = current_score;
                self.state.air_event_count = 1;
                tracing::debug!(start_score = current_score.get(), "combo attempt started");
            }
            ComboStatus::Pending => {
                self.state.air_event_count = increment(self.state.air_event_count, 1, "event")?;
                if self.state.air_event_count >= ACTIVATION_THRESHOLD {
                    self.state.status = ComboStatus::Active;
                    self.state.multiplier = ACTIVATION_BONUS;
                    tracing::info!(bonus = ACTIVATION_BONUS, "combo activated");
                    out.push(Event::ComboActivated {
                        multiplier: self.state.multiplier,
                    });
                }
            }
            ComboStatus::Active => {
                let score_points = self.score_since_start(current_score);
                self.state.air_event_count = increment(self.state.air_event_count, 1, "event")?;
                self.state.multiplier = increment(self.state.multiplier, BONUS_PER_EVENT, "bonus")?;
                self.state.score_points = score_points;
                tracing::debug!(bonus = self.state.multiplier, "combo extended");
                out.push(Event::ComboUpdated {
                    multiplier: self.state.multiplier,
                    score_points,
                });
            }
        }
        Ok(())
    }

    fn handle_landing(&mut self, current_score: Score, out: &mut Vec<Event>) -> Stars {
        let stars = match self.state.status {
            ComboStatus::Inactive => return Stars::ZERO,
            ComboStatus::Pending => {
                tracing::debug!(
                    air_events = self.state.air_event_count,
                    "landing discarded pending combo"
                );
                Stars::ZERO
            }
            ComboStatus::Active => match self.settle(current_score) {
                Ok((score_points, stars_earned)) => {
                    tracing::info!(
                        score_points,
                        collected = self.state.stars_collected.get(),
                        bonus = self.state.multiplier,
                        stars_earned = stars_earned.get(),
                        "combo completed"
                    );
                    out.push(Event::ComboEnded {
                        multiplier: self.state.multiplier,
                        score_points,
                        stars_earned,
                    });
                    stars_earned
                }
                Err(error) => {
                    tracing::warn!(%error, "combo dropped on landing");
                    Stars::ZERO
                }
            },
        };

        self.reset();
        stars
    }

    fn settle(&self, current_score: Score) -> Result<(u64, Stars), ComboError> {
        let score_points = self.score_since_start(current_score);
        let stars_earned = self
            .state
            .stars_collected
            .checked_add(Stars::new(self.state.multiplier))
            .ok_or(ComboError::CounterOverflow { counter: "star" })?;
        Ok((score_points, stars_earned))
    }

    /// Points gained since the attempt began, or zero if the score went down.
    fn score_since_start(&self, current_score: Score) -> u64 {
        current_score
            .checked_since(self.state.start_score)
            .unwrap_or(0)
    }

    fn recover(&mut self, error: ComboError) {
        tracing::warn!(%error, "combo tracker reset after internal fault");
        self.reset();
    }

    fn reset(&mut self) {
        self.state = ComboSnapshot::default();
    }
}

fn increment(value: u32, by: u32, counter: &'static str) -> Result<u32, ComboError> {
    value
        .checked_add(by)
        .ok_or(ComboError::CounterOverflow { counter })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflowing_bonus_resets_the_tracker() {
        let mut tracker = ComboTracker::new();
        tracker.state = ComboSnapshot {
            status: ComboStatus::Active,
            air_event_count: 3,
            multiplier: u32::MAX,
            ..ComboSnapshot::default()
        };
        let mut events = Vec::new();

        tracker.register_trick(Score::new(10), false, None, &mut events);

        assert!(events.is_empty());
        assert_eq!(tracker.combo_state(), ComboSnapshot::default());
    }

    #[test]
    fn overflowing_star_total_resets_the_tracker() {
        let mut tracker = ComboTracker::new();
        tracker.state = ComboSnapshot {
            status: ComboStatus::Pending,
            air_event_count: 1,
            stars_collected: Stars::new(u32::MAX),
            ..ComboSnapshot::default()
        };

        tracker.add_stars_to_combo(Stars::new(1));

        assert!(!tracker.has_combo());
    }
}
