#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave progression system gating difficulty, unlocks, and speed.
//!
//! A run moves through exactly three waves. The external challenge tracker
//! signals once all challenges of the active wave are satisfied; the manager
//! then raises the speed multiplier, advances to the next wave, and, after the
//! final wave, announces victory. Progression is monotonic: waves are never
//! skipped or revisited within a run.

use std::time::Duration;

use celo_riders_core::{EnemyKind, Event, ObstacleKind, PowerUpKind, SpeedMultiplier, WaveNumber};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speed bonus applied whenever all challenges of a wave are completed.
pub const CHALLENGE_SPEED_BONUS: f32 = 0.15;
/// Additional speed bonus carried into the next wave.
pub const WAVE_ADVANCE_SPEED_BONUS: f32 = 0.1;
/// Challenges each wave requires unless the table says otherwise.
pub const DEFAULT_CHALLENGES_PER_WAVE: u32 = 3;
/// Length of the wave announcement: intro, hold, and fade.
pub const WAVE_TRANSITION: Duration = Duration::from_millis(500 + 1_500 + 500);

const WAVE_COUNT: usize = WaveNumber::FINAL.get() as usize;

/// Content unlocked while a wave is active.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveUnlocks {
    /// Obstacles that may be spawned.
    #[serde(default)]
    pub obstacles: Vec<ObstacleKind>,
    /// Power-ups that may be spawned.
    #[serde(default)]
    pub power_ups: Vec<PowerUpKind>,
    /// Enemies that may be spawned.
    #[serde(default)]
    pub enemies: Vec<EnemyKind>,
    /// Challenges that must be completed to clear the wave.
    #[serde(default = "default_total_challenges")]
    pub total_challenges: u32,
}

fn default_total_challenges() -> u32 {
    DEFAULT_CHALLENGES_PER_WAVE
}

/// Reasons a wave table is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WaveTableError {
    /// The table does not describe exactly three waves.
    #[error("wave table must describe 3 waves, found {found}")]
    WrongWaveCount {
        /// Number of waves described by the table.
        found: usize,
    },
    /// A wave dropped content unlocked by the previous wave.
    #[error("wave {wave} no longer unlocks `{identifier}` from the previous wave")]
    UnlockRevoked {
        /// Wave that dropped the identifier.
        wave: WaveNumber,
        /// Identifier that was dropped.
        identifier: &'static str,
    },
    /// A wave requires no challenges and could never be cleared by the challenge tracker.
    #[error("wave {wave} requires no challenges")]
    NoChallenges {
        /// Wave without challenges.
        wave: WaveNumber,
    },
}

/// Per-wave unlock table, indexed by [`WaveNumber`].
///
/// Every wave's sets must be supersets of the previous wave's. The check runs
/// once when the table is built; lookups trust it afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WaveUnlocks>", into = "Vec<WaveUnlocks>")]
pub struct WaveTable {
    waves: Vec<WaveUnlocks>,
}

impl WaveTable {
    /// Builds a table from one entry per wave, validating monotonic unlocks.
    pub fn from_waves(waves: Vec<WaveUnlocks>) -> Result<Self, WaveTableError> {
        if waves.len() != WAVE_COUNT {
            return Err(WaveTableError::WrongWaveCount { found: waves.len() });
        }

        let mut previous: Option<&WaveUnlocks> = None;
        for (index, unlocks) in waves.iter().enumerate() {
            let wave = wave_at(index);
            if unlocks.total_challenges == 0 {
                return Err(WaveTableError::NoChallenges { wave });
            }
            if let Some(previous) = previous {
                check_superset(
                    wave,
                    &previous.obstacles,
                    &unlocks.obstacles,
                    ObstacleKind::as_str,
                )?;
                check_superset(
                    wave,
                    &previous.power_ups,
                    &unlocks.power_ups,
                    PowerUpKind::as_str,
                )?;
                check_superset(wave, &previous.enemies, &unlocks.enemies, EnemyKind::as_str)?;
            }
            previous = Some(unlocks);
        }

        Ok(Self { waves })
    }

    /// Table used by the shipped game.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            waves: vec![
                WaveUnlocks {
                    obstacles: vec![ObstacleKind::Trash],
                    power_ups: Vec::new(),
                    enemies: vec![EnemyKind::Robot],
                    total_challenges: DEFAULT_CHALLENGES_PER_WAVE,
                },
                WaveUnlocks {
                    obstacles: vec![ObstacleKind::Trash, ObstacleKind::Cone],
                    power_ups: vec![PowerUpKind::FireTaco],
                    enemies: vec![EnemyKind::Robot, EnemyKind::Eyeball, EnemyKind::Robot2],
                    total_challenges: DEFAULT_CHALLENGES_PER_WAVE,
                },
                WaveUnlocks {
                    obstacles: vec![ObstacleKind::Trash, ObstacleKind::Cone, ObstacleKind::Skulls],
                    power_ups: vec![
                        PowerUpKind::FireTaco,
                        PowerUpKind::MetalSkateboard,
                        PowerUpKind::CrystalMagnet,
                    ],
                    enemies: vec![
                        EnemyKind::Robot,
                        EnemyKind::Eyeball,
                        EnemyKind::Robot2,
                        EnemyKind::Robot3,
                    ],
                    total_challenges: DEFAULT_CHALLENGES_PER_WAVE,
                },
            ],
        }
    }

    /// Unlocks configured for the provided wave.
    #[must_use]
    pub fn unlocks(&self, wave: WaveNumber) -> &WaveUnlocks {
        &self.waves[usize::from(wave.get() - 1)]
    }

    /// Iterator over every wave and its unlocks in order.
    pub fn iter(&self) -> impl Iterator<Item = (WaveNumber, &WaveUnlocks)> {
        self.waves
            .iter()
            .enumerate()
            .map(|(index, unlocks)| (wave_at(index), unlocks))
    }
}

impl Default for WaveTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<WaveUnlocks>> for WaveTable {
    type Error = WaveTableError;

    fn try_from(waves: Vec<WaveUnlocks>) -> Result<Self, Self::Error> {
        Self::from_waves(waves)
    }
}

impl From<WaveTable> for Vec<WaveUnlocks> {
    fn from(table: WaveTable) -> Self {
        table.waves
    }
}

fn wave_at(index: usize) -> WaveNumber {
    u8::try_from(index + 1)
        .ok()
        .and_then(WaveNumber::new)
        .unwrap_or(WaveNumber::FINAL)
}

fn check_superset<T, F>(
    wave: WaveNumber,
    previous: &[T],
    current: &[T],
    identifier: F,
) -> Result<(), WaveTableError>
where
    T: Copy + PartialEq,
    F: Fn(T) -> &'static str,
{
    match previous.iter().find(|kind| !current.contains(*kind)) {
        Some(kind) => Err(WaveTableError::UnlockRevoked {
            wave,
            identifier: identifier(*kind),
        }),
        None => Ok(()),
    }
}

/// Text announcing a newly reached wave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaveAnnouncement {
    /// Large banner text.
    pub banner: String,
    /// Secondary line shown under the banner, if any.
    pub tagline: Option<&'static str>,
}

impl WaveAnnouncement {
    /// Announcement shown when `wave` begins.
    #[must_use]
    pub fn for_wave(wave: WaveNumber) -> Self {
        let banner = if wave.is_final() {
            "FINAL WAVE".to_owned()
        } else {
            format!("WAVE {wave}")
        };
        let tagline = match wave.get() {
            2 => Some("GET READY FOR CARNAGE"),
            3 => Some("SURVIVE TO WIN!"),
            _ => None,
        };
        Self { banner, tagline }
    }
}

/// Snapshot of the active wave and its derived configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveConfig {
    /// Active wave.
    pub wave_number: WaveNumber,
    /// Content unlocked by the active wave.
    pub unlocks: WaveUnlocks,
    /// Current speed multiplier.
    pub speed_multiplier: SpeedMultiplier,
    /// Challenges completed in the active wave.
    pub challenges_completed: u32,
    /// Challenges required by the active wave.
    pub total_challenges: u32,
    /// Whether a wave announcement is running or the run is decided.
    pub is_transitioning: bool,
    /// Whether the final wave was cleared.
    pub is_complete: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transition {
    Idle,
    Announcing { remaining: Duration },
    Held,
}

/// Tracks wave progression and the speed multiplier for a single run.
#[derive(Clone, Debug)]
pub struct WaveManager {
    table: WaveTable,
    current: WaveNumber,
    speed: SpeedMultiplier,
    challenges_completed: u32,
    transition: Transition,
    victory: bool,
}

impl Default for WaveManager {
    fn default() -> Self {
        Self::new(WaveTable::standard())
    }
}

impl WaveManager {
    /// Creates a manager at wave one using the provided unlock table.
    #[must_use]
    pub fn new(table: WaveTable) -> Self {
        Self {
            table,
            current: WaveNumber::FIRST,
            speed: SpeedMultiplier::BASELINE,
            challenges_completed: 0,
            transition: Transition::Idle,
            victory: false,
        }
    }

    /// Restores wave one and baseline speed.
    pub fn reset(&mut self) {
        self.current = WaveNumber::FIRST;
        self.speed = SpeedMultiplier::BASELINE;
        self.challenges_completed = 0;
        self.transition = Transition::Idle;
        self.victory = false;
    }

    /// Counts down an in-progress wave announcement.
    ///
    /// Returns immediately unless a transition is running. Victory and
    /// end-game transitions are held for the rest of the session.
    pub fn update(&mut self, dt: Duration) {
        let Transition::Announcing { remaining } = self.transition else {
            return;
        };

        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.transition = Transition::Idle;
            tracing::debug!(wave = self.current.get(), "wave transition finished");
        } else {
            self.transition = Transition::Announcing { remaining };
        }
    }

    /// Signals that every challenge of the active wave has been satisfied.
    ///
    /// This is an all-or-nothing trigger rather than a per-challenge counter:
    /// the speed bonus is applied and the wave advances immediately. Calls
    /// after victory or after the game ended are ignored.
    pub fn complete_challenge(&mut self, out: &mut Vec<Event>) {
        if self.victory || self.transition == Transition::Held {
            tracing::debug!("challenge completion ignored, run already decided");
            return;
        }

        tracing::info!(
            wave = self.current.get(),
            speed = self.speed.get(),
            "all challenges complete"
        );
        self.challenges_completed = self.table.unlocks(self.current).total_challenges;
        self.speed = self.speed.boosted(CHALLENGE_SPEED_BONUS);
        out.push(Event::SpeedChanged {
            multiplier: self.speed,
        });

        self.advance_wave(out);
    }

    /// Forces the end of the run and slows back down to baseline speed.
    pub fn trigger_end_game(&mut self, out: &mut Vec<Event>) {
        if self.transition == Transition::Held && !self.victory {
            return;
        }

        self.transition = Transition::Held;
        self.speed = SpeedMultiplier::BASELINE;
        out.push(Event::SpeedChanged {
            multiplier: self.speed,
        });
        tracing::info!(wave = self.current.get(), "end game triggered");
    }

    fn advance_wave(&mut self, out: &mut Vec<Event>) {
        let Some(next) = self.current.next() else {
            self.transition = Transition::Held;
            self.victory = true;
            tracing::info!("final wave cleared");
            out.push(Event::Victory);
            return;
        };

        self.current = next;
        self.challenges_completed = 0;
        self.speed = self.speed.boosted(WAVE_ADVANCE_SPEED_BONUS);
        self.transition = Transition::Announcing {
            remaining: WAVE_TRANSITION,
        };
        tracing::info!(wave = next.get(), speed = self.speed.get(), "wave advanced");
        out.push(Event::WaveChanged { wave: next });
        out.push(Event::SpeedChanged {
            multiplier: self.speed,
        });
    }

    /// Active wave.
    #[must_use]
    pub fn current_wave(&self) -> WaveNumber {
        self.current
    }

    /// Multiplier the physics and spawn layers should scale against.
    #[must_use]
    pub fn speed_multiplier(&self) -> SpeedMultiplier {
        self.speed
    }

    /// Challenges completed in the active wave.
    #[must_use]
    pub fn challenges_completed(&self) -> u32 {
        self.challenges_completed
    }

    /// Whether a wave announcement is running or the run is decided.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.transition != Transition::Idle
    }

    /// Whether the final wave was cleared.
    #[must_use]
    pub fn is_wave_complete(&self) -> bool {
        self.victory
    }

    /// Reports whether the obstacle may spawn in the active wave.
    #[must_use]
    pub fn is_obstacle_unlocked(&self, kind: ObstacleKind) -> bool {
        self.active_unlocks().obstacles.contains(&kind)
    }

    /// Reports whether the power-up may spawn in the active wave.
    #[must_use]
    pub fn is_power_up_unlocked(&self, kind: PowerUpKind) -> bool {
        self.active_unlocks().power_ups.contains(&kind)
    }

    /// Reports whether the enemy may spawn in the active wave.
    #[must_use]
    pub fn is_enemy_unlocked(&self, kind: EnemyKind) -> bool {
        self.active_unlocks().enemies.contains(&kind)
    }

    /// Unlocks of the active wave.
    #[must_use]
    pub fn active_unlocks(&self) -> &WaveUnlocks {
        self.table.unlocks(self.current)
    }

    /// Snapshot of the active wave's derived configuration.
    #[must_use]
    pub fn current_wave_config(&self) -> WaveConfig {
        let unlocks = self.active_unlocks().clone();
        WaveConfig {
            wave_number: self.current,
            total_challenges: unlocks.total_challenges,
            unlocks,
            speed_multiplier: self.speed,
            challenges_completed: self.challenges_completed,
            is_transitioning: self.is_transitioning(),
            is_complete: self.victory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_passes_validation() {
        let waves: Vec<WaveUnlocks> = WaveTable::standard().into();
        assert!(WaveTable::from_waves(waves).is_ok());
    }

    #[test]
    fn wave_at_maps_indices_to_wave_numbers() {
        assert_eq!(wave_at(0), WaveNumber::FIRST);
        assert_eq!(wave_at(2), WaveNumber::FINAL);
    }

    #[test]
    fn transition_counts_down_across_updates() {
        let mut manager = WaveManager::default();
        let mut events = Vec::new();
        manager.complete_challenge(&mut events);

        manager.update(Duration::from_millis(2_000));
        assert!(manager.is_transitioning());
        manager.update(Duration::from_millis(500));
        assert!(!manager.is_transitioning());
    }
}
