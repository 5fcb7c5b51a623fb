#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the CeloRiders gameplay engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and the gameplay systems. Adapters submit
//! [`Command`] values describing what happened in the physics layer or the
//! menus, the session applies those commands through its `apply` entry point,
//! and the systems broadcast [`Event`] values for presentation, audio, and the
//! score submission layer to react to. Communication is strictly one-way: no
//! system ever waits on a consumer.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical title shown when the experience boots.
pub const GAME_TITLE: &str = "CeloRiders";

/// Commands that express every input the gameplay core accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Advances the scene clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Reports horizontal distance travelled by the rider.
    TravelDistance {
        /// Distance in world units covered since the last report.
        distance: f32,
    },
    /// Reports one tick spent grinding a rail.
    GrindTick,
    /// Reports a trick performed by the rider.
    PerformTrick {
        /// Whether the rider was on the ground when the trick happened.
        grounded: bool,
        /// Obstacle cleared by the trick, if any.
        obstacle: Option<ObstacleKind>,
        /// Raw points awarded for the trick.
        points: u64,
        /// Stars displayed alongside the trick notification.
        stars: Stars,
    },
    /// Reports an enemy defeated by the rider.
    DefeatEnemy {
        /// Whether the rider was on the ground when the enemy was defeated.
        grounded: bool,
        /// Kind of enemy that was defeated.
        enemy: EnemyKind,
        /// Raw points awarded for the defeat.
        points: u64,
    },
    /// Reports the rider's grounded transition for the current tick.
    UpdateAirState {
        /// Whether the rider was grounded on the previous tick.
        was_grounded: bool,
        /// Whether the rider is grounded on this tick.
        grounded: bool,
    },
    /// Reports stars picked up by the rider.
    CollectStars {
        /// Number of stars collected.
        stars: Stars,
    },
    /// Reports a power-up picked up by the rider.
    CollectPowerUp {
        /// Kind of power-up collected.
        kind: PowerUpKind,
    },
    /// Signals that every challenge of the active wave has been satisfied.
    CompleteWaveChallenges,
    /// Forces the run to end, for example when the rider runs out of health.
    EndGame,
    /// Requests a screen transition in the application flow.
    Navigate {
        /// Trigger that should drive the transition.
        trigger: Trigger,
    },
}

/// Events broadcast by the gameplay core after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Announces that the third airborne event activated a combo.
    ComboActivated {
        /// Bonus stars accrued by the combo so far.
        multiplier: u32,
    },
    /// Reports progress of an active combo.
    ComboUpdated {
        /// Bonus stars accrued by the combo so far.
        multiplier: u32,
        /// Score gained since the combo attempt began.
        score_points: u64,
    },
    /// Reports that an active combo resolved on landing.
    ComboEnded {
        /// Final bonus stars of the combo.
        multiplier: u32,
        /// Score gained between the first airborne event and the landing.
        score_points: u64,
        /// Stars awarded: collected stars plus the bonus.
        stars_earned: Stars,
    },
    /// Announces that the run advanced to a new wave.
    WaveChanged {
        /// Wave that became active.
        wave: WaveNumber,
    },
    /// Announces a new speed multiplier for physics and spawning.
    SpeedChanged {
        /// Multiplier that the physics and spawn layers should scale against.
        multiplier: SpeedMultiplier,
    },
    /// Announces that the final wave was cleared.
    Victory,
    /// Announces that the application moved to another screen.
    ScreenChanged {
        /// Screen that was active before the transition.
        from: Screen,
        /// Screen that is active after the transition.
        to: Screen,
    },
    /// Hands the result of a finished run to the submission layer.
    GameOver {
        /// Final score of the run.
        final_score: Score,
        /// Stars awarded during the run.
        stars: Stars,
        /// Whether the run ended by clearing the final wave.
        victory: bool,
    },
}

/// Whole score points accumulated during a run.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Score(u64);

impl Score {
    /// Score of a freshly started run.
    pub const ZERO: Self = Self(0);

    /// Creates a new score with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the score.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Computes the points gained since `earlier`, if the score did not move backwards.
    #[must_use]
    pub const fn checked_since(self, earlier: Score) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of stars collected or awarded.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Stars(u32);

impl Stars {
    /// No stars at all.
    pub const ZERO: Self = Self(0);

    /// Creates a new star count.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the star count.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether the count is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two star counts, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Stars) -> Option<Stars> {
        match self.0.checked_add(other.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Adds two star counts, clamping at the numeric maximum.
    #[must_use]
    pub const fn saturating_add(self, other: Stars) -> Stars {
        Self(self.0.saturating_add(other.0))
    }
}

/// One of the fixed difficulty tiers of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveNumber(u8);

impl WaveNumber {
    /// Wave every run starts in.
    pub const FIRST: Self = Self(1);
    /// Last wave; clearing it wins the run.
    pub const FINAL: Self = Self(3);

    /// Creates a wave number when it lies within `FIRST..=FINAL`.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::FIRST.0 && value <= Self::FINAL.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric representation of the wave.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Reports whether this is the final wave.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.0 == Self::FINAL.0
    }

    /// Wave that follows this one, or `None` after the final wave.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }
}

impl fmt::Display for WaveNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Factor applied to scrolling speed and spawn cadence.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SpeedMultiplier(f32);

impl SpeedMultiplier {
    /// Speed of a freshly started run.
    pub const BASELINE: Self = Self(1.0);

    /// Creates a new multiplier from its raw value.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Retrieves the raw multiplier.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }

    /// Returns the multiplier raised by `increment`.
    #[must_use]
    pub fn boosted(self, increment: f32) -> Self {
        Self(self.0 + increment)
    }
}

impl Default for SpeedMultiplier {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// Unique identifier assigned to an on-screen message block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(u64);

impl BlockId {
    /// Creates a new block identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Reason a content identifier could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown {category} identifier `{value}`")]
pub struct ParseKindError {
    category: &'static str,
    value: String,
}

impl ParseKindError {
    fn new(category: &'static str, value: &str) -> Self {
        Self {
            category,
            value: value.to_owned(),
        }
    }

    /// Identifier that failed to parse.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

macro_rules! content_kind {
    (
        $(#[$meta:meta])*
        $name:ident, $category:literal {
            $($(#[$variant_meta:meta])* $variant:ident => $id:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable identifier used by configuration files and the asset layer.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $id),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseKindError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($id => Ok(Self::$variant),)+
                    _ => Err(ParseKindError::new($category, value)),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseKindError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(kind: $name) -> Self {
                kind.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

content_kind! {
    /// Obstacles that can be spawned on the road.
    ObstacleKind, "obstacle" {
        /// Overflowing trash bin, available from the first wave.
        Trash => "obstacle_trash",
        /// Traffic cone.
        Cone => "obstacle_cone",
        /// Pile of skulls.
        Skulls => "obstacle_skulls",
    }
}

content_kind! {
    /// Power-ups that can be collected during a run.
    PowerUpKind, "power-up" {
        /// Fire taco.
        FireTaco => "fire_taco",
        /// Metal skateboard.
        MetalSkateboard => "metal_skateboard",
        /// Crystal magnet.
        CrystalMagnet => "crystal_magnet",
    }
}

content_kind! {
    /// Enemies that can be spawned during a run.
    EnemyKind, "enemy" {
        /// Ground robot, available from the first wave.
        Robot => "enemy_robot",
        /// Flying eyeball.
        Eyeball => "enemy_eyeball",
        /// Second robot variant.
        Robot2 => "enemy_robot2",
        /// Third robot variant.
        Robot3 => "enemy_robot3",
    }
}

impl ObstacleKind {
    /// Trick name announced when the rider clears this obstacle.
    #[must_use]
    pub const fn trick_title(self) -> &'static str {
        match self {
            Self::Trash => "Trash Nose Grab",
            Self::Cone => "Cone Nose Grab",
            Self::Skulls => "Bonehead Move!",
        }
    }
}

impl EnemyKind {
    /// Trick name announced when the rider takes this enemy out from the air.
    #[must_use]
    pub const fn trick_title(self) -> &'static str {
        match self {
            Self::Robot | Self::Robot2 | Self::Robot3 => "Robo Nose Grab",
            Self::Eyeball => "Eyeball Nose Grab",
        }
    }
}

impl PowerUpKind {
    /// Badge text announced when the power-up is collected.
    #[must_use]
    pub const fn badge_title(self) -> &'static str {
        match self {
            Self::FireTaco => "Fire Taco!",
            Self::MetalSkateboard => "Metal Boot!",
            Self::CrystalMagnet => "Crystal Magnet!",
        }
    }
}

/// Playable riders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    /// Kev.
    Kev,
    /// Stacy.
    Stacy,
}

impl Character {
    /// Stable identifier used by the asset layer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kev => "kev",
            Self::Stacy => "stacy",
        }
    }
}

/// Screens of the application flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    /// Asset loading.
    Preload,
    /// First intro splash.
    Splash1,
    /// Second intro splash.
    Splash2,
    /// Third intro splash.
    Splash3,
    /// Fourth intro splash.
    Splash4,
    /// Fifth intro splash.
    Splash5,
    /// Title menu.
    MainMenu,
    /// Options menu.
    Options,
    /// Gameplay tutorial.
    HowToPlay,
    /// Daily leaderboard.
    Leaderboard,
    /// Rider selection.
    CharacterSelect,
    /// Rider selected; waiting for the entry stake to be confirmed.
    AwaitingStake,
    /// A run is in progress.
    Playing,
    /// Results of the last run.
    GameOver,
}

/// Inputs that drive transitions between [`Screen`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// Advance past the current loading or splash screen.
    Continue,
    /// Open the options menu.
    OpenOptions,
    /// Open the tutorial from the options menu.
    OpenHowToPlay,
    /// Open the leaderboard from the options menu.
    OpenLeaderboard,
    /// Leave the current screen for its parent.
    Back,
    /// Pick a rider and request a run.
    StartGame {
        /// Rider picked by the player.
        character: Character,
    },
    /// The entry stake was confirmed by the wallet layer.
    StakeConfirmed,
    /// Start another run with the same rider.
    PlayAgain,
    /// Return to the title menu.
    ToMainMenu,
}

/// Lifecycle of a combo attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComboStatus {
    /// No airborne events registered since the last landing.
    #[default]
    Inactive,
    /// One or two airborne events registered; no reward yet.
    Pending,
    /// Three or more airborne events registered; the bonus is live.
    Active,
}

/// Immutable snapshot of a combo tracker's state used for queries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboSnapshot {
    /// Lifecycle of the current attempt.
    pub status: ComboStatus,
    /// Airborne events registered during the current attempt.
    pub air_event_count: u32,
    /// Bonus stars accrued by the attempt.
    pub multiplier: u32,
    /// Score captured when the attempt began.
    pub start_score: Score,
    /// Score gained since the attempt began, as last reported.
    pub score_points: u64,
    /// Stars collected while the attempt was pending or active.
    pub stars_collected: Stars,
    /// Obstacles cleared during the current trick, in order.
    pub trick_obstacles: Vec<ObstacleKind>,
}

impl ComboSnapshot {
    /// Stars the rider would earn by landing right now.
    #[must_use]
    pub fn stars_to_earn(&self) -> Stars {
        match self.status {
            ComboStatus::Active => self
                .stars_collected
                .saturating_add(Stars::new(self.multiplier)),
            ComboStatus::Inactive | ComboStatus::Pending => Stars::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ComboSnapshot, ComboStatus, Command, EnemyKind, Event, ObstacleKind, PowerUpKind, Score,
        SpeedMultiplier, Stars, WaveNumber,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn wave_numbers_stop_after_final_wave() {
        let second = WaveNumber::FIRST.next().expect("second wave");
        let third = second.next().expect("third wave");
        assert!(third.is_final());
        assert_eq!(third.next(), None);
        assert_eq!(WaveNumber::new(0), None);
        assert_eq!(WaveNumber::new(4), None);
    }

    #[test]
    fn score_delta_rejects_backwards_movement() {
        assert_eq!(Score::new(160).checked_since(Score::new(100)), Some(60));
        assert_eq!(Score::new(90).checked_since(Score::new(100)), None);
    }

    #[test]
    fn content_identifiers_parse_back() {
        for kind in ObstacleKind::ALL {
            assert_eq!(kind.as_str().parse::<ObstacleKind>(), Ok(*kind));
        }
        for kind in PowerUpKind::ALL {
            assert_eq!(kind.as_str().parse::<PowerUpKind>(), Ok(*kind));
        }
        for kind in EnemyKind::ALL {
            assert_eq!(kind.as_str().parse::<EnemyKind>(), Ok(*kind));
        }
        let error = "obstacle_lava".parse::<ObstacleKind>().unwrap_err();
        assert_eq!(error.value(), "obstacle_lava");
        assert_eq!(
            error.to_string(),
            "unknown obstacle identifier `obstacle_lava`"
        );
    }

    #[test]
    fn stars_to_earn_only_counts_active_combos() {
        let mut snapshot = ComboSnapshot {
            status: ComboStatus::Pending,
            multiplier: 0,
            stars_collected: Stars::new(2),
            ..ComboSnapshot::default()
        };
        assert_eq!(snapshot.stars_to_earn(), Stars::ZERO);

        snapshot.status = ComboStatus::Active;
        snapshot.multiplier = 5;
        assert_eq!(snapshot.stars_to_earn(), Stars::new(7));
    }

    #[test]
    fn speed_multiplier_boosts_from_baseline() {
        let boosted = SpeedMultiplier::BASELINE.boosted(0.15).boosted(0.1);
        assert!((boosted.get() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn trick_command_round_trips_through_bincode() {
        assert_round_trip(&Command::PerformTrick {
            grounded: false,
            obstacle: Some(ObstacleKind::Cone),
            points: 25,
            stars: Stars::new(2),
        });
    }

    #[test]
    fn game_over_event_round_trips_through_bincode() {
        assert_round_trip(&Event::GameOver {
            final_score: Score::new(4_210),
            stars: Stars::new(17),
            victory: true,
        });
    }
}
