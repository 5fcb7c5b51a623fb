//! Seeded headless run driven by a scripted rider.

use std::time::Duration;

use anyhow::{Context, Result};
use celo_riders_core::{Character, Command, Event, Screen, Stars, Trigger, WaveNumber};
use celo_riders_session::{apply, query, RunResult, ScoreSubmitter, Session};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::ScenarioConfig;

/// Menu steps from the loading screen to rider selection.
const MENU_STEPS: usize = 7;
const MAX_TRICK_STARS: u32 = 2;

/// Hands finished runs to the log. Stands in for the on-chain leaderboard.
struct LoggingSubmitter;

impl ScoreSubmitter for LoggingSubmitter {
    fn submit(&mut self, result: &RunResult) {
        tracing::info!(
            character = result.character.as_str(),
            final_score = result.final_score.get(),
            stars = result.stars.get(),
            victory = result.victory,
            "score submitted"
        );
    }
}

/// Report printed when a simulated run ends.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) seed: u64,
    pub(crate) character: Character,
    pub(crate) final_score: u64,
    pub(crate) stars: u32,
    pub(crate) victory: bool,
    pub(crate) duration_secs: f64,
    pub(crate) final_wave: u8,
    pub(crate) combos_completed: u32,
    pub(crate) best_combo_bonus: u32,
    pub(crate) events: usize,
}

#[derive(Debug)]
struct RunStats {
    final_wave: WaveNumber,
    combos_completed: u32,
    best_combo_bonus: u32,
    events: usize,
}

impl RunStats {
    fn record(&mut self, events: &[Event]) {
        self.events += events.len();
        for event in events {
            match event {
                Event::WaveChanged { wave } => self.final_wave = *wave,
                Event::ComboEnded { multiplier, .. } => {
                    self.combos_completed += 1;
                    self.best_combo_bonus = self.best_combo_bonus.max(*multiplier);
                }
                _ => {}
            }
        }
    }
}

#[derive(Debug)]
struct Rider {
    grounded: bool,
    airtime_left: Duration,
}

/// Drives one session from the loading screen to game over.
pub(crate) struct Simulation {
    scenario: ScenarioConfig,
    session: Session,
    rng: ChaCha8Rng,
    rider: Rider,
    since_challenge: Duration,
    stats: RunStats,
}

impl Simulation {
    pub(crate) fn new(scenario: ScenarioConfig) -> Self {
        let session = Session::new(scenario.run_config(), Box::new(LoggingSubmitter));
        Self {
            rng: ChaCha8Rng::seed_from_u64(scenario.seed),
            session,
            rider: Rider {
                grounded: true,
                airtime_left: Duration::ZERO,
            },
            since_challenge: Duration::ZERO,
            stats: RunStats {
                final_wave: WaveNumber::FIRST,
                combos_completed: 0,
                best_combo_bonus: 0,
                events: 0,
            },
            scenario,
        }
    }

    /// Plays the run until it ends or the scenario's time limit is reached.
    pub(crate) fn run(mut self) -> Result<RunSummary> {
        for _ in 0..MENU_STEPS {
            self.send(Command::Navigate {
                trigger: Trigger::Continue,
            })?;
        }
        self.send(Command::Navigate {
            trigger: Trigger::StartGame {
                character: self.scenario.character,
            },
        })?;
        self.send(Command::Navigate {
            trigger: Trigger::StakeConfirmed,
        })?;

        let dt = Duration::from_millis(self.scenario.tick_millis);
        let limit = Duration::from_secs(self.scenario.run_length_secs);
        let mut elapsed = Duration::ZERO;
        while query::screen(&self.session) == Screen::Playing {
            if elapsed >= limit {
                tracing::info!(?elapsed, "time limit reached");
                self.send(Command::EndGame)?;
                break;
            }
            self.step(dt)?;
            elapsed += dt;
        }

        let result = query::last_result(&self.session)
            .cloned()
            .context("session left play without a result")?;
        Ok(RunSummary {
            seed: self.scenario.seed,
            character: result.character,
            final_score: result.final_score.get(),
            stars: result.stars.get(),
            victory: result.victory,
            duration_secs: result.duration.as_secs_f64(),
            final_wave: self.stats.final_wave.get(),
            combos_completed: self.stats.combos_completed,
            best_combo_bonus: self.stats.best_combo_bonus,
            events: self.stats.events,
        })
    }

    fn step(&mut self, dt: Duration) -> Result<()> {
        self.send(Command::Tick { dt })?;
        let Some(wave) = query::wave_config(&self.session) else {
            return Ok(());
        };
        let rider = self.scenario.rider.clone();

        let distance = rider.base_speed * wave.speed_multiplier.get() * dt.as_secs_f32();
        self.send(Command::TravelDistance { distance })?;

        let was_grounded = self.rider.grounded;
        if self.rider.grounded {
            if self.rng.gen_bool(rider.jump_chance) {
                self.rider.grounded = false;
                self.rider.airtime_left = Duration::from_millis(rider.airtime_millis);
            } else if self.rng.gen_bool(rider.grind_chance) {
                self.send(Command::GrindTick)?;
            }
        } else {
            self.rider.airtime_left = self.rider.airtime_left.saturating_sub(dt);
            self.rider.grounded = self.rider.airtime_left.is_zero();
        }

        if !self.rider.grounded {
            if self.rng.gen_bool(rider.trick_chance) {
                let obstacle = if self.rng.gen_bool(rider.obstacle_chance) {
                    wave.unlocks.obstacles.choose(&mut self.rng).copied()
                } else {
                    None
                };
                let stars = Stars::new(self.rng.gen_range(0..=MAX_TRICK_STARS));
                self.send(Command::PerformTrick {
                    grounded: false,
                    obstacle,
                    points: rider.trick_points,
                    stars,
                })?;
            }
            if self.rng.gen_bool(rider.enemy_chance) {
                if let Some(enemy) = wave.unlocks.enemies.choose(&mut self.rng).copied() {
                    self.send(Command::DefeatEnemy {
                        grounded: false,
                        enemy,
                        points: rider.enemy_points,
                    })?;
                }
            }
        }

        if self.rng.gen_bool(rider.star_chance) {
            self.send(Command::CollectStars {
                stars: Stars::new(1),
            })?;
        }
        if self.rng.gen_bool(rider.power_up_chance) {
            if let Some(kind) = wave.unlocks.power_ups.choose(&mut self.rng).copied() {
                self.send(Command::CollectPowerUp { kind })?;
            }
        }

        self.send(Command::UpdateAirState {
            was_grounded,
            grounded: self.rider.grounded,
        })?;

        self.since_challenge += dt;
        if self.since_challenge >= Duration::from_secs(self.scenario.challenge_interval_secs) {
            self.since_challenge = Duration::ZERO;
            self.send(Command::CompleteWaveChallenges)?;
        }
        Ok(())
    }

    fn send(&mut self, command: Command) -> Result<()> {
        let mut events = Vec::new();
        apply(&mut self.session, command, &mut events)?;
        self.stats.record(&events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(seed: u64) -> ScenarioConfig {
        ScenarioConfig {
            seed,
            run_length_secs: 20,
            ..ScenarioConfig::default()
        }
    }

    #[test]
    fn same_seed_replays_the_same_run() {
        let first = Simulation::new(scenario(3)).run().expect("run completes");
        let second = Simulation::new(scenario(3)).run().expect("run completes");
        assert_eq!(first, second);
    }

    #[test]
    fn time_limit_ends_the_run_without_victory() {
        let summary = Simulation::new(scenario(11)).run().expect("run completes");
        assert!(!summary.victory);
        assert_eq!(summary.final_wave, 1);
        assert!(summary.final_score >= 20 * 25, "distance alone scores about 30 per second");
        assert!((summary.duration_secs - 20.0).abs() < 1e-6);
    }

    #[test]
    fn frequent_challenges_reach_victory() {
        let summary = Simulation::new(ScenarioConfig {
            challenge_interval_secs: 1,
            run_length_secs: 30,
            ..ScenarioConfig::default()
        })
        .run()
        .expect("run completes");

        assert!(summary.victory);
        assert_eq!(summary.final_wave, 3);
        assert!(summary.duration_secs < 30.0);
    }
}
