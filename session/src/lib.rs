#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for CeloRiders.
//!
//! The session owns the current screen, the context carried between screens,
//! and the run in progress. Adapters feed it [`Command`] values through
//! [`apply`] and read it back through [`query`].

mod flow;
mod run;

use celo_riders_core::{Command, Event, Score, Screen, Trigger};
use celo_riders_system_messages::MessageLayout;
use celo_riders_system_waves::WaveTable;
use serde::{Deserialize, Serialize};

pub use flow::{next_screen, FlowError, SessionContext};
pub use run::{Run, RunResult};

/// Settings applied to every new run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Unlock table for the three waves.
    pub wave_table: WaveTable,
    /// Geometry of the notification lane.
    pub message_layout: MessageLayout,
}

/// Receives the outcome of every finished run.
pub trait ScoreSubmitter {
    /// Hands over a finished run.
    fn submit(&mut self, result: &RunResult);
}

/// One row of the daily leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Display name or address of the player.
    pub player: String,
    /// Best score submitted today.
    pub score: Score,
}

/// Supplies leaderboard rows whenever the leaderboard screen opens.
pub trait LeaderboardSource {
    /// Current rows, in any order.
    fn entries(&self) -> Vec<LeaderboardEntry>;
}

/// Screen flow plus the run in progress.
pub struct Session {
    screen: Screen,
    context: SessionContext,
    config: RunConfig,
    run: Option<Run>,
    last_result: Option<RunResult>,
    submitter: Box<dyn ScoreSubmitter>,
    leaderboard_source: Option<Box<dyn LeaderboardSource>>,
    leaderboard: Vec<LeaderboardEntry>,
}

impl Session {
    /// Creates a session on the loading screen.
    #[must_use]
    pub fn new(config: RunConfig, submitter: Box<dyn ScoreSubmitter>) -> Self {
        Self {
            screen: Screen::Preload,
            context: SessionContext::default(),
            config,
            run: None,
            last_result: None,
            submitter,
            leaderboard_source: None,
            leaderboard: Vec::new(),
        }
    }

    /// Reads leaderboard rows from `source` each time the leaderboard opens.
    #[must_use]
    pub fn with_leaderboard(mut self, source: Box<dyn LeaderboardSource>) -> Self {
        self.leaderboard_source = Some(source);
        self
    }

    fn navigate(
        &mut self,
        trigger: Trigger,
        out_events: &mut Vec<Event>,
    ) -> Result<(), FlowError> {
        let next = next_screen(self.screen, trigger)?;

        if let Trigger::StartGame { character } = trigger {
            self.context.character = Some(character);
        }
        if next == Screen::Playing {
            let character = self
                .context
                .character
                .ok_or(FlowError::NoCharacterSelected)?;
            self.run = Some(Run::new(&self.config, character));
        }

        self.change_screen(next, out_events);
        Ok(())
    }

    fn end_run(&mut self, result: RunResult, out_events: &mut Vec<Event>) {
        self.run = None;
        self.submitter.submit(&result);
        self.last_result = Some(result);
        self.change_screen(Screen::GameOver, out_events);
    }

    fn change_screen(&mut self, to: Screen, out_events: &mut Vec<Event>) {
        let from = self.screen;
        self.screen = to;
        self.context.enter(to);
        if to == Screen::Leaderboard {
            self.refresh_leaderboard();
        }
        tracing::info!(?from, ?to, "screen changed");
        out_events.push(Event::ScreenChanged { from, to });
    }

    fn refresh_leaderboard(&mut self) {
        let Some(source) = self.leaderboard_source.as_ref() else {
            tracing::debug!("no leaderboard source configured");
            return;
        };
        let mut entries = source.entries();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.player.cmp(&b.player)));
        tracing::debug!(rows = entries.len(), "leaderboard refreshed");
        self.leaderboard = entries;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("screen", &self.screen)
            .field("context", &self.context)
            .field("run", &self.run)
            .field("last_result", &self.last_result)
            .field("leaderboard", &self.leaderboard)
            .finish_non_exhaustive()
    }
}

/// Applies `command` to the session, appending every resulting event.
///
/// Navigation errors leave the session untouched. Gameplay commands outside
/// a run are ignored.
pub fn apply(
    session: &mut Session,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), FlowError> {
    match command {
        Command::Navigate { trigger } => session.navigate(trigger, out_events),
        command => {
            let Some(run) = session.run.as_mut() else {
                tracing::debug!(?command, "gameplay command ignored outside a run");
                return Ok(());
            };
            run.handle(command, out_events);
            if let Some(result) = run.result().cloned() {
                session.end_run(result, out_events);
            }
            Ok(())
        }
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use celo_riders_core::{ComboSnapshot, Screen, Score};
    use celo_riders_system_messages::MessageQueue;
    use celo_riders_system_waves::WaveConfig;

    use super::{LeaderboardEntry, Run, RunConfig, RunResult, Session, SessionContext};

    /// Screen currently shown.
    #[must_use]
    pub fn screen(session: &Session) -> Screen {
        session.screen
    }

    /// Context carried between screens.
    #[must_use]
    pub fn context(session: &Session) -> SessionContext {
        session.context
    }

    /// Settings used for new runs.
    #[must_use]
    pub fn config(session: &Session) -> &RunConfig {
        &session.config
    }

    /// Run in progress, if any.
    #[must_use]
    pub fn run(session: &Session) -> Option<&Run> {
        session.run.as_ref()
    }

    /// Outcome of the most recently finished run.
    #[must_use]
    pub fn last_result(session: &Session) -> Option<&RunResult> {
        session.last_result.as_ref()
    }

    /// Leaderboard rows read when the leaderboard screen last opened, best first.
    #[must_use]
    pub fn leaderboard(session: &Session) -> &[LeaderboardEntry] {
        &session.leaderboard
    }

    /// Score of the run in progress.
    #[must_use]
    pub fn score(session: &Session) -> Option<Score> {
        session.run.as_ref().map(Run::score)
    }

    /// Combo snapshot of the run in progress.
    #[must_use]
    pub fn combo_state(session: &Session) -> Option<ComboSnapshot> {
        session.run.as_ref().map(|run| run.combo().combo_state())
    }

    /// Wave configuration of the run in progress.
    #[must_use]
    pub fn wave_config(session: &Session) -> Option<WaveConfig> {
        session
            .run
            .as_ref()
            .map(|run| run.waves().current_wave_config())
    }

    /// Notification queue of the run in progress.
    #[must_use]
    pub fn messages(session: &Session) -> Option<&MessageQueue> {
        session.run.as_ref().map(Run::messages)
    }
}
