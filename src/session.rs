use crate::board::Position;
use crate::clock::{Tick, TurnClock};
use crate::config::GameConfig;
use crate::error::{GameError, StoreError};
use crate::game::{ForcedEnd, GameState, MoveReport, Outcome};
use crate::history::{GameRecord, WinCounts};
use crate::movegen::Move;
use crate::save::{PlayerNames, SavedGame};
use crate::store::Store;
use tracing::{error, info, warn};

/// One table: the live game, who is playing, their clock, and where results go.
///
/// Every transition goes through `&mut self`, so whoever owns the session is the
/// single writer of board and turn state; the clock only feeds in via [`tick`].
///
/// [`tick`]: GameSession::tick
pub struct GameSession {
    config: GameConfig,
    store: Store,
    game: Option<GameState>,
    names: PlayerNames,
    clock: TurnClock,
}

impl GameSession {
    pub fn new(config: GameConfig, store: Store) -> Self {
        GameSession {
            config,
            store,
            game: None,
            names: PlayerNames::default(),
            clock: TurnClock::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn names(&self) -> &PlayerNames {
        &self.names
    }

    pub fn clock(&self) -> &TurnClock {
        &self.clock
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn low_time(&self) -> bool {
        self.clock.is_low(self.config.low_time_threshold.as_secs())
    }

    pub fn has_saved_game(&self) -> bool {
        self.store.has_saved_game()
    }

    fn turn_seconds(&self) -> u64 {
        self.config.time_per_turn.as_secs()
    }

    fn active(&mut self) -> Result<&mut GameState, GameError> {
        if self.clock.is_paused() {
            return Err(GameError::GamePaused);
        }
        self.game.as_mut().ok_or(GameError::NoActiveGame)
    }

    /// Throw away whatever was in progress and set up the opening position.
    pub fn start_new_game(&mut self, names: PlayerNames) {
        let state = GameState::with_config(&self.config);
        info!(black = %names.black, white = %names.white, "new game");
        self.clock.start(state.turn(), self.turn_seconds());
        self.game = Some(state);
        self.names = names;
        if let Err(e) = self.store.clear_saved_game() {
            warn!(error = %e, "could not remove previous autosave");
        }
    }

    /// Install the autosaved game. `Ok(false)` when there is none, or when it was
    /// unreadable and has been discarded.
    pub fn load_game(&mut self) -> Result<bool, StoreError> {
        let Some(saved) = self.store.load_game()? else {
            return Ok(false);
        };

        let restored = match saved.restore(&self.config) {
            Ok(restored) => restored,
            Err(e) => {
                warn!(error = %e, "discarding corrupt autosave");
                self.store.clear_saved_game()?;
                return Ok(false);
            }
        };

        info!(
            player = %restored.state.current_player(),
            remaining = restored.remaining_time,
            "saved game loaded"
        );
        self.clock
            .start(restored.state.turn(), restored.remaining_time);
        self.game = Some(restored.state);
        self.names = restored.names;
        Ok(true)
    }

    pub fn select(&mut self, pos: Position) -> Result<Vec<Move>, GameError> {
        self.active()?.select_piece(pos)
    }

    pub fn deselect(&mut self) -> Result<(), GameError> {
        self.active()?.deselect()
    }

    pub fn choose_destination(&mut self, to: Position) -> Result<MoveReport, GameError> {
        let report = self.active()?.choose_destination(to)?;
        if !report.continuation {
            self.settle_turn(report.outcome);
        }
        Ok(report)
    }

    pub fn choose_move(&mut self, mv: Move) -> Result<MoveReport, GameError> {
        let report = self.active()?.choose_move(mv)?;
        if !report.continuation {
            self.settle_turn(report.outcome);
        }
        Ok(report)
    }

    pub fn resign(&mut self) -> Result<Outcome, GameError> {
        self.force_outcome(ForcedEnd::Resigned)
    }

    pub fn force_outcome(&mut self, end: ForcedEnd) -> Result<Outcome, GameError> {
        let game = self.game.as_mut().ok_or(GameError::NoActiveGame)?;
        let outcome = game.force_outcome(end)?;
        self.finish(outcome);
        Ok(outcome)
    }

    /// Pause or resume. Returns whether the game is now paused.
    pub fn toggle_pause(&mut self) -> Result<bool, GameError> {
        let game = self.game.as_ref().ok_or(GameError::NoActiveGame)?;
        if game.is_game_over() {
            return Err(GameError::GameOver);
        }
        if self.clock.is_paused() {
            self.clock.resume();
        } else {
            self.clock.pause();
        }
        info!(paused = self.clock.is_paused(), "pause toggled");
        Ok(self.clock.is_paused())
    }

    /// One second of the turn clock. On expiry the turn passes to the opponent
    /// just as after a move. Returns true if the turn was switched.
    pub fn tick(&mut self) -> bool {
        let Tick::Expired { turn } = self.clock.tick() else {
            return false;
        };
        let Some(game) = self.game.as_mut() else {
            return false;
        };
        if !game.expire_turn(turn) {
            return false;
        }
        let outcome = game.outcome().copied();
        self.settle_turn(outcome);
        true
    }

    /// After the turn has passed: finish the game or re-arm the clock and autosave.
    fn settle_turn(&mut self, outcome: Option<Outcome>) {
        if let Some(outcome) = outcome {
            self.finish(outcome);
            return;
        }
        let Some(game) = self.game.as_ref() else {
            return;
        };
        self.clock.start(game.turn(), self.turn_seconds());
        self.autosave();
    }

    fn autosave(&self) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        if game.is_game_over() {
            return;
        }
        let saved = SavedGame::from_state(game, &self.names, self.clock.remaining());
        if let Err(e) = self.store.save_game(&saved) {
            error!(error = %e, "autosave failed");
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.clock.stop();
        let scores = self
            .game
            .as_ref()
            .map(GameState::scores)
            .unwrap_or_default();
        info!(%outcome, black = scores.black, white = scores.white, "recording result");

        if let Err(e) = self.store.clear_saved_game() {
            warn!(error = %e, "could not remove autosave");
        }

        let record = GameRecord::new(&outcome, &self.names, scores, chrono::Local::now());
        if let Err(e) = self.store.append_history(record) {
            error!(error = %e, "could not append to history");
        }
        if let Some(winner) = outcome.winner() {
            if let Err(e) = self.store.record_win(self.names.get(winner)) {
                error!(error = %e, "could not update win counts");
            }
        }
    }

    /// Finished games, most recent first.
    pub fn history(&self) -> Result<Vec<GameRecord>, StoreError> {
        let mut history = self.store.history()?;
        history.reverse();
        Ok(history)
    }

    pub fn win_counts(&self) -> Result<WinCounts, StoreError> {
        self.store.win_counts()
    }
}
