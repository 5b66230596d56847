/// Session: the puzzle engine a frontend talks to.
///
/// Owns the catalog, the current level index and its `PuzzleState`, and the
/// (optional) identifier of the logged-in user.
///
/// ## Phases
///
///   Playing ──Moved/Blocked──▶ Playing
///   Playing ──level solved──▶ (next level loaded) Playing      => LevelComplete
///   Playing ──last level solved──▶ GameComplete (terminal)      => GameComplete
///
/// Once the game is complete no request changes the board.

use crate::domain::grid::{Direction, Pos};
use crate::domain::tile::{Tile, Token};
use crate::error::{EngineError, SaveError};
use crate::sim::level::Catalog;
use crate::sim::save::{self, ProgressRecord, ProgressStore};
use crate::sim::world::PuzzleState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Playing,
    GameComplete,
}

/// Result of a move request.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Moved,
    Blocked,
    /// The move solved the level and the next one is now loaded.
    LevelComplete,
    /// The move solved the final level, or the game was already over.
    GameComplete,
}

pub struct Session {
    catalog: Catalog,
    level: usize,
    state: PuzzleState,
    user: Option<String>,
    phase: Phase,
}

// ── Construction / level loading ──

impl Session {
    /// Start at the first level of `catalog`.
    pub fn new(catalog: Catalog, user: Option<String>) -> Result<Self, EngineError> {
        let state = PuzzleState::from_level(0, catalog.get(0)?)?;
        log::info!("session started for {}", user.as_deref().unwrap_or("guest"));
        Ok(Session { catalog, level: 0, state, user, phase: Phase::Playing })
    }

    /// Replace the board with level `index`'s initial layout.
    pub fn load_level(&mut self, index: usize) -> Result<(), EngineError> {
        let def = self.catalog.get(index)?;
        let state = PuzzleState::from_level(index, def).inspect_err(|e| {
            log::error!("cannot load level {}: {e}", index + 1);
        })?;
        log::info!("loaded level {} ({})", index + 1, def.name());
        self.state = state;
        self.level = index;
        self.phase = Phase::Playing;
        Ok(())
    }

    /// Put the current level back to its initial layout.
    pub fn restart_level(&mut self) -> Result<(), EngineError> {
        if self.phase == Phase::GameComplete {
            return Ok(());
        }
        self.load_level(self.level)
    }
}

// ── Moves ──

impl Session {
    pub fn try_move(&mut self, dir: Direction) -> MoveOutcome {
        if self.phase == Phase::GameComplete {
            return MoveOutcome::GameComplete;
        }
        if !self.state.apply(dir) {
            log::trace!("blocked {dir:?} at {:?}", self.player_position());
            return MoveOutcome::Blocked;
        }
        if self.state.is_solved() {
            self.advance()
        } else {
            MoveOutcome::Moved
        }
    }

    fn advance(&mut self) -> MoveOutcome {
        log::info!("level {} solved in {} moves", self.level + 1, self.state.moves());
        let next = self.level + 1;
        if next >= self.catalog.level_count() {
            return self.finish(next);
        }
        match self.load_level(next) {
            Ok(()) => MoveOutcome::LevelComplete,
            // Catalog levels are validated up front; a failure here is a content bug.
            Err(e) => {
                log::error!("ending game: next level unusable: {e}");
                self.finish(next)
            }
        }
    }

    fn finish(&mut self, next: usize) -> MoveOutcome {
        self.level = next;
        self.phase = Phase::GameComplete;
        log::info!("all {} levels complete", self.catalog.level_count());
        MoveOutcome::GameComplete
    }
}

// ── Persistence ──

impl Session {
    /// Save this session's progress for its user.
    pub fn request_save(&self, store: &mut dyn ProgressStore) -> Result<(), SaveError> {
        save::save_progress(store, self.user.as_deref(), self)
    }

    /// Load the user's saved progress, if any. Returns whether a level was restored.
    pub fn request_load(&mut self, store: &dyn ProgressStore) -> Result<bool, EngineError> {
        match save::load_progress(store, self.user.as_deref()) {
            Some(record) => self.restore(&record),
            None => Ok(false),
        }
    }

    /// Jump to the record's level, starting from its initial layout.
    /// The saved token snapshot is not applied. A record saved after the
    /// last level puts the session straight into the completed state.
    /// Nothing is restored once the game is complete.
    pub fn restore(&mut self, record: &ProgressRecord) -> Result<bool, EngineError> {
        if self.phase == Phase::GameComplete {
            log::debug!("game already complete; saved progress not applied");
            return Ok(false);
        }
        if record.level == self.catalog.level_count() {
            self.finish(record.level);
            return Ok(true);
        }
        if record.level > self.catalog.level_count() {
            log::warn!(
                "saved level {} is outside this catalog ({} levels); ignoring it",
                record.level + 1,
                self.catalog.level_count(),
            );
            return Ok(false);
        }
        if record.snapshot.is_some() {
            log::debug!("saved layout discarded; level {} restarts fresh", record.level + 1);
        }
        self.load_level(record.level)?;
        Ok(true)
    }
}

// ── Read-only queries for rendering ──

impl Session {
    /// Zero-based index of the level being played
    /// (equals `level_count()` once the game is complete).
    pub fn current_level_number(&self) -> usize {
        self.level
    }

    pub fn level_count(&self) -> usize {
        self.catalog.level_count()
    }

    pub fn level_name(&self) -> &str {
        self.catalog.get(self.level).map_or("", |d| d.name())
    }

    pub fn terrain_at(&self, row: usize, col: usize) -> Option<Tile> {
        self.state.terrain_at(Pos::new(row, col))
    }

    pub fn token_at(&self, row: usize, col: usize) -> Option<Token> {
        self.state.token_at(Pos::new(row, col))
    }

    pub fn player_position(&self) -> Pos {
        self.state.player()
    }

    /// (rows, cols) of the current board.
    pub fn dimensions(&self) -> (usize, usize) {
        self.state.dims()
    }

    pub fn moves(&self) -> u32 {
        self.state.moves()
    }

    pub fn is_game_complete(&self) -> bool {
        self.phase == Phase::GameComplete
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn state(&self) -> &PuzzleState {
        &self.state
    }
}
