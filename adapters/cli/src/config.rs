//! Scenario files describing a headless run.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use celo_riders_core::Character;
use celo_riders_session::RunConfig;
use celo_riders_system_messages::MessageLayout;
use celo_riders_system_waves::WaveTable;
use serde::Deserialize;

/// Complete description of a simulated run. Every field has a default.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScenarioConfig {
    pub(crate) seed: u64,
    pub(crate) character: Character,
    pub(crate) run_length_secs: u64,
    pub(crate) tick_millis: u64,
    pub(crate) challenge_interval_secs: u64,
    pub(crate) rider: RiderConfig,
    /// Replaces the built-in wave table when present.
    pub(crate) waves: Option<WaveTable>,
    pub(crate) message_layout: MessageLayout,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0xC310_5EED,
            character: Character::Kev,
            run_length_secs: 180,
            tick_millis: 50,
            challenge_interval_secs: 45,
            rider: RiderConfig::default(),
            waves: None,
            message_layout: MessageLayout::default(),
        }
    }
}

/// Per-tick odds and payouts of the scripted rider.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RiderConfig {
    /// World units per second at speed multiplier 1.0.
    pub(crate) base_speed: f32,
    pub(crate) airtime_millis: u64,
    pub(crate) jump_chance: f64,
    pub(crate) grind_chance: f64,
    pub(crate) trick_chance: f64,
    pub(crate) obstacle_chance: f64,
    pub(crate) enemy_chance: f64,
    pub(crate) star_chance: f64,
    pub(crate) power_up_chance: f64,
    pub(crate) trick_points: u64,
    pub(crate) enemy_points: u64,
}

impl Default for RiderConfig {
    fn default() -> Self {
        Self {
            base_speed: 300.0,
            airtime_millis: 1_200,
            jump_chance: 0.03,
            grind_chance: 0.1,
            trick_chance: 0.12,
            obstacle_chance: 0.5,
            enemy_chance: 0.03,
            star_chance: 0.05,
            power_up_chance: 0.004,
            trick_points: 100,
            enemy_points: 250,
        }
    }
}

impl ScenarioConfig {
    /// Reads and validates a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let scenario: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse scenario {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Checks the values serde cannot.
    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.tick_millis > 0, "tick_millis must be positive");
        ensure!(
            self.challenge_interval_secs > 0,
            "challenge_interval_secs must be positive"
        );
        ensure!(
            self.rider.base_speed.is_finite() && self.rider.base_speed >= 0.0,
            "rider.base_speed must be a non-negative number"
        );

        let odds = [
            ("jump_chance", self.rider.jump_chance),
            ("grind_chance", self.rider.grind_chance),
            ("trick_chance", self.rider.trick_chance),
            ("obstacle_chance", self.rider.obstacle_chance),
            ("enemy_chance", self.rider.enemy_chance),
            ("star_chance", self.rider.star_chance),
            ("power_up_chance", self.rider.power_up_chance),
        ];
        for (name, value) in odds {
            ensure!(
                (0.0..=1.0).contains(&value),
                "rider.{name} must lie between 0 and 1, found {value}"
            );
        }
        Ok(())
    }

    /// Session settings derived from the scenario.
    pub(crate) fn run_config(&self) -> RunConfig {
        RunConfig {
            wave_table: self.waves.clone().unwrap_or_default(),
            message_layout: self.message_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let scenario: ScenarioConfig = toml::from_str("").expect("defaults parse");
        assert_eq!(scenario, ScenarioConfig::default());
        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.run_config(), RunConfig::default());
    }

    #[test]
    fn partial_file_overrides_selected_fields() {
        let scenario: ScenarioConfig = toml::from_str(
            r#"
            seed = 9
            character = "stacy"

            [rider]
            trick_chance = 0.5

            [message_layout]
            road_y = 420.0

            [[waves]]
            obstacles = ["obstacle_trash"]
            [[waves]]
            obstacles = ["obstacle_trash"]
            [[waves]]
            obstacles = ["obstacle_trash", "obstacle_cone"]
            "#,
        )
        .expect("scenario parses");

        assert_eq!(scenario.seed, 9);
        assert_eq!(scenario.character, Character::Stacy);
        assert_eq!(scenario.rider.trick_chance, 0.5);
        assert_eq!(scenario.rider.trick_points, 100);
        assert_eq!(scenario.run_config().message_layout.road_y, 420.0);
        assert_ne!(scenario.run_config().wave_table, WaveTable::standard());
    }

    #[test]
    fn odds_outside_the_unit_interval_are_rejected() {
        let scenario = ScenarioConfig {
            rider: RiderConfig {
                star_chance: 1.5,
                ..RiderConfig::default()
            },
            ..ScenarioConfig::default()
        };
        let error = scenario.validate().expect_err("invalid odds");
        assert!(error.to_string().contains("star_chance"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<ScenarioConfig>("speed = 3").is_err());
    }
}
