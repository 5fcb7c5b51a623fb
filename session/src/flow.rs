//! Screen flow: the transition table between application screens.

use celo_riders_core::{Character, Screen, Trigger};
use thiserror::Error;

/// Navigation failures. The current screen is left unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FlowError {
    /// The trigger has no transition from the current screen.
    #[error("trigger {trigger:?} is not valid on screen {screen:?}")]
    InvalidTrigger {
        /// Screen that received the trigger.
        screen: Screen,
        /// Rejected trigger.
        trigger: Trigger,
    },
    /// A run was requested before a rider was picked.
    #[error("no rider selected")]
    NoCharacterSelected,
}

/// State carried between screens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Rider picked on the selection screen.
    pub character: Option<Character>,
    /// Whether the menu music loop is playing.
    pub menu_music: bool,
}

impl SessionContext {
    pub(crate) fn enter(&mut self, screen: Screen) {
        match screen {
            Screen::MainMenu
            | Screen::Options
            | Screen::HowToPlay
            | Screen::Leaderboard
            | Screen::CharacterSelect
            | Screen::AwaitingStake => {
                if !self.menu_music {
                    tracing::debug!("menu music started");
                }
                self.menu_music = true;
            }
            Screen::Playing => {
                if self.menu_music {
                    tracing::debug!("menu music stopped");
                }
                self.menu_music = false;
            }
            Screen::Preload
            | Screen::Splash1
            | Screen::Splash2
            | Screen::Splash3
            | Screen::Splash4
            | Screen::Splash5
            | Screen::GameOver => {}
        }
    }
}

/// Looks up the screen reached from `screen` by `trigger`.
///
/// `Playing` has no outgoing triggers; a run leaves it only by ending.
pub fn next_screen(screen: Screen, trigger: Trigger) -> Result<Screen, FlowError> {
    let next = match (screen, trigger) {
        (Screen::Preload, Trigger::Continue) => Screen::Splash1,
        (Screen::Splash1, Trigger::Continue) => Screen::Splash2,
        (Screen::Splash2, Trigger::Continue) => Screen::Splash3,
        (Screen::Splash3, Trigger::Continue) => Screen::Splash4,
        (Screen::Splash4, Trigger::Continue) => Screen::Splash5,
        (Screen::Splash5, Trigger::Continue) => Screen::MainMenu,
        (Screen::MainMenu, Trigger::Continue) => Screen::CharacterSelect,
        (Screen::MainMenu, Trigger::OpenOptions) => Screen::Options,
        (Screen::Options, Trigger::OpenHowToPlay) => Screen::HowToPlay,
        (Screen::Options, Trigger::OpenLeaderboard) => Screen::Leaderboard,
        (Screen::Options, Trigger::Back) => Screen::MainMenu,
        (Screen::HowToPlay | Screen::Leaderboard, Trigger::Back) => Screen::Options,
        (Screen::CharacterSelect, Trigger::StartGame { .. }) => Screen::AwaitingStake,
        (Screen::CharacterSelect, Trigger::Back) => Screen::MainMenu,
        (Screen::AwaitingStake, Trigger::StakeConfirmed) => Screen::Playing,
        (Screen::AwaitingStake, Trigger::Back) => Screen::CharacterSelect,
        (Screen::GameOver, Trigger::PlayAgain) => Screen::AwaitingStake,
        (Screen::GameOver, Trigger::ToMainMenu) => Screen::MainMenu,
        (screen, trigger) => return Err(FlowError::InvalidTrigger { screen, trigger }),
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splashes_lead_to_the_main_menu() {
        let mut screen = Screen::Preload;
        for _ in 0..6 {
            screen = next_screen(screen, Trigger::Continue).expect("continue is valid");
        }
        assert_eq!(screen, Screen::MainMenu);
    }

    #[test]
    fn playing_rejects_every_trigger() {
        for trigger in [Trigger::Continue, Trigger::Back, Trigger::ToMainMenu, Trigger::PlayAgain] {
            assert_eq!(
                next_screen(Screen::Playing, trigger),
                Err(FlowError::InvalidTrigger {
                    screen: Screen::Playing,
                    trigger,
                })
            );
        }
    }

    #[test]
    fn music_stops_only_when_a_run_starts() {
        let mut context = SessionContext::default();
        context.enter(Screen::MainMenu);
        context.enter(Screen::Options);
        assert!(context.menu_music);
        context.enter(Screen::Playing);
        assert!(!context.menu_music);
        context.enter(Screen::GameOver);
        assert!(!context.menu_music);
    }
}
