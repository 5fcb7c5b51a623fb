//! A single run: the gameplay systems wired together on one scene clock.

use std::time::Duration;

use celo_riders_core::{Character, Command, Event, Score, Stars};
use celo_riders_system_combo::ComboTracker;
use celo_riders_system_messages::{MessageFlags, MessageQueue, PRIORITY_DURATION};
use celo_riders_system_score::ScoreAccumulator;
use celo_riders_system_waves::{WaveAnnouncement, WaveManager};
use serde::{Deserialize, Serialize};

use crate::RunConfig;

const TRICK_TITLE_SEPARATOR: &str = " x ";

/// Outcome of a finished run, handed to the score submitter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Rider that played the run.
    pub character: Character,
    /// Final score.
    pub final_score: Score,
    /// Stars collected plus combo payouts.
    pub stars: Stars,
    /// Whether the final wave was cleared.
    pub victory: bool,
    /// Scene time at which the run ended.
    pub duration: Duration,
}

/// Authoritative state of one playthrough.
#[derive(Clone, Debug)]
pub struct Run {
    character: Character,
    clock: Duration,
    score: ScoreAccumulator,
    combo: ComboTracker,
    waves: WaveManager,
    messages: MessageQueue,
    stars: Stars,
    airborne_trick_stars: Stars,
    result: Option<RunResult>,
}

impl Run {
    pub(crate) fn new(config: &RunConfig, character: Character) -> Self {
        tracing::info!(character = character.as_str(), "run started");
        Self {
            character,
            clock: Duration::ZERO,
            score: ScoreAccumulator::new(),
            combo: ComboTracker::new(),
            waves: WaveManager::new(config.wave_table.clone()),
            messages: MessageQueue::new(config.message_layout),
            stars: Stars::ZERO,
            airborne_trick_stars: Stars::ZERO,
            result: None,
        }
    }

    /// Rider playing the run.
    #[must_use]
    pub fn character(&self) -> Character {
        self.character
    }

    /// Scene time since the run started.
    #[must_use]
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Whole points scored so far.
    #[must_use]
    pub fn score(&self) -> Score {
        self.score.points()
    }

    /// Stars collected plus combo payouts so far.
    #[must_use]
    pub fn stars(&self) -> Stars {
        self.stars
    }

    /// Combo tracker of the run.
    #[must_use]
    pub fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    /// Wave manager of the run.
    #[must_use]
    pub fn waves(&self) -> &WaveManager {
        &self.waves
    }

    /// Notification queue of the run.
    #[must_use]
    pub fn messages(&self) -> &MessageQueue {
        &self.messages
    }

    /// Outcome, once the run has ended.
    #[must_use]
    pub fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }

    /// Runs the producing system for `command`, then routes what it produced
    /// to the notification queue before publishing it.
    pub(crate) fn handle(&mut self, command: Command, out_events: &mut Vec<Event>) {
        if self.result.is_some() {
            tracing::debug!(?command, "command ignored, run has ended");
            return;
        }

        let mut produced = Vec::new();
        match command {
            Command::Tick { dt } => {
                self.clock = self.clock.saturating_add(dt);
                self.waves.update(dt);
                self.messages.update(self.clock);
            }
            Command::TravelDistance { distance } => self.score.add_distance(distance),
            Command::GrindTick => self.score.add_grind_tick(),
            Command::PerformTrick {
                grounded,
                obstacle,
                points,
                stars,
            } => {
                self.score.add_trick(points);
                self.combo
                    .register_trick(self.score.points(), grounded, obstacle, &mut produced);
                if grounded {
                    if let Some(obstacle) = obstacle {
                        self.messages.add_message(
                            obstacle.trick_title(),
                            Some(stars),
                            MessageFlags::default(),
                        );
                    }
                } else {
                    self.airborne_trick_stars = self.airborne_trick_stars.saturating_add(stars);
                }
            }
            Command::DefeatEnemy {
                grounded,
                enemy,
                points,
            } => {
                self.score.add_trick(points);
                self.combo
                    .register_enemy_kill(self.score.points(), grounded, &mut produced);
                self.messages
                    .add_message(enemy.trick_title(), None, MessageFlags::default());
            }
            Command::UpdateAirState {
                was_grounded,
                grounded,
            } => {
                if !was_grounded && grounded {
                    self.announce_landed_trick();
                }
                let earned = self.combo.update_air_state(
                    self.score.points(),
                    was_grounded,
                    grounded,
                    &mut produced,
                );
                self.stars = self.stars.saturating_add(earned);
            }
            Command::CollectStars { stars } => {
                self.stars = self.stars.saturating_add(stars);
                self.combo.add_stars_to_combo(stars);
                if self.combo.is_active() {
                    let state = self.combo.combo_state();
                    self.messages
                        .update_active_combo(state.multiplier, state.stars_to_earn());
                }
            }
            Command::CollectPowerUp { kind } => {
                if !self.waves.is_power_up_unlocked(kind) {
                    tracing::debug!(
                        power_up = kind.as_str(),
                        "power-up collected before its unlock"
                    );
                }
                self.messages.add_power_up_message(kind);
            }
            Command::CompleteWaveChallenges => self.waves.complete_challenge(&mut produced),
            Command::EndGame => {
                self.waves.trigger_end_game(&mut produced);
                self.finish(false, &mut produced);
            }
            Command::Navigate { trigger } => {
                tracing::debug!(?trigger, "navigation is handled by the session");
            }
        }

        if self.route(&produced) {
            self.finish(true, &mut produced);
        }
        out_events.extend(produced);
    }

    fn announce_landed_trick(&mut self) {
        let stars = std::mem::replace(&mut self.airborne_trick_stars, Stars::ZERO);
        let obstacles = self.combo.trick_obstacles();
        if obstacles.is_empty() {
            return;
        }

        let title = obstacles
            .iter()
            .map(|obstacle| obstacle.trick_title())
            .collect::<Vec<_>>()
            .join(TRICK_TITLE_SEPARATOR);
        self.messages
            .add_message(&title, Some(stars), MessageFlags::default());
        self.combo.clear_trick_obstacles();
    }

    /// Delivers produced events to the notification queue. Returns whether
    /// the final wave was cleared.
    fn route(&mut self, events: &[Event]) -> bool {
        let mut victory = false;
        for event in events {
            match event {
                Event::ComboActivated { multiplier } => {
                    let stars_to_earn = self.combo.combo_state().stars_to_earn();
                    self.messages.show_active_combo(*multiplier, stars_to_earn);
                }
                Event::ComboUpdated { multiplier, .. } => {
                    let stars_to_earn = self.combo.combo_state().stars_to_earn();
                    self.messages.update_active_combo(*multiplier, stars_to_earn);
                }
                Event::ComboEnded { stars_earned, .. } => {
                    self.messages.hide_active_combo(*stars_earned);
                }
                Event::WaveChanged { wave } => {
                    let announcement = WaveAnnouncement::for_wave(*wave);
                    self.messages.add_priority_message(
                        &announcement.banner,
                        announcement.tagline.unwrap_or_default(),
                        PRIORITY_DURATION,
                    );
                }
                Event::Victory => victory = true,
                Event::SpeedChanged { .. }
                | Event::ScreenChanged { .. }
                | Event::GameOver { .. } => {}
            }
        }

        if !self.combo.is_active() && self.messages.combo_banner().is_some() {
            self.messages.hide_active_combo(Stars::ZERO);
        }
        victory
    }

    fn finish(&mut self, victory: bool, out_events: &mut Vec<Event>) {
        if self.result.is_some() {
            return;
        }

        let result = RunResult {
            character: self.character,
            final_score: self.score.points(),
            stars: self.stars,
            victory,
            duration: self.clock,
        };
        tracing::info!(
            final_score = result.final_score.get(),
            stars = result.stars.get(),
            victory,
            "run finished"
        );
        out_events.push(Event::GameOver {
            final_score: result.final_score,
            stars: result.stars,
            victory,
        });
        self.messages.clear();
        self.result = Some(result);
    }
}
