/// PuzzleState: the mutable board of the level being played.
///
/// ## Two layers
///
///   - `terrain`: walls and goals as loaded. **Never mutated** after load.
///   - `tokens`: player and boxes. Every move rewrites cells here.
///
/// Both grids always have the same shape, and `tokens` holds exactly one
/// `Token::Player`, located at the cached `player` position. The shape is
/// checked in `from_level`; the player invariant is re-checked (debug builds)
/// after every mutation.

use crate::domain::grid::{Direction, Grid, Pos};
use crate::domain::rules::{self, Resolution};
use crate::domain::tile::{Tile, Token};
use crate::error::{EngineError, LevelError};
use crate::sim::level::LevelDef;

#[derive(Clone, Debug)]
pub struct PuzzleState {
    terrain: Grid<Tile>,
    tokens: Grid<Token>,
    player: Pos,
    moves: u32,
}

// ── Construction ──

impl PuzzleState {
    /// Copy a level's layers and locate the player.
    pub fn from_level(index: usize, def: &LevelDef) -> Result<Self, EngineError> {
        if !def.terrain().same_shape(def.initial()) {
            return Err(LevelError::MalformedLevel {
                level: index,
                reason: "terrain and token grids differ in shape".into(),
            }
            .into());
        }
        let player = def
            .initial()
            .positions_of(Token::Player)
            .next()
            .ok_or(EngineError::NoPlayerToken { level: index })?;

        Ok(PuzzleState {
            terrain: def.terrain().clone(),
            tokens: def.initial().clone(),
            player,
            moves: 0,
        })
    }
}

// ── Queries ──

impl PuzzleState {
    /// Terrain at (row, col); `None` off the grid.
    #[inline]
    pub fn terrain_at(&self, pos: Pos) -> Option<Tile> {
        self.terrain.get(pos)
    }

    #[inline]
    pub fn token_at(&self, pos: Pos) -> Option<Token> {
        self.tokens.get(pos)
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    /// (rows, cols)
    pub fn dims(&self) -> (usize, usize) {
        self.terrain.dims()
    }

    pub fn tokens(&self) -> &Grid<Token> {
        &self.tokens
    }

    /// Successful moves since the level was (re)loaded.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn is_solved(&self) -> bool {
        rules::is_solved(&self.terrain, &self.tokens)
    }

    fn invariants_hold(&self) -> bool {
        self.terrain.same_shape(&self.tokens)
            && self.tokens.count(Token::Player) == 1
            && self.tokens.get(self.player) == Some(Token::Player)
    }
}

// ── Mutation ──

impl PuzzleState {
    /// Resolve and apply one step. Returns `false` (and changes nothing)
    /// when the move is blocked.
    pub fn apply(&mut self, dir: Direction) -> bool {
        match rules::resolve_move(&self.terrain, &self.tokens, self.player, dir) {
            Resolution::Blocked => return false,
            Resolution::Step { to } => self.move_player(to),
            Resolution::Push { to, box_to } => {
                self.tokens.set(box_to, Token::Box);
                self.tokens.set(to, Token::Empty);
                self.move_player(to);
            }
        }
        self.moves += 1;
        debug_assert!(self.invariants_hold(), "player/token invariant broken after {dir:?}");
        true
    }

    fn move_player(&mut self, to: Pos) {
        self.tokens.set(self.player, Token::Empty);
        self.tokens.set(to, Token::Player);
        self.player = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::tests::map_from;

    fn state(rows: &[&str]) -> PuzzleState {
        let (terrain, tokens, _) = map_from(rows);
        PuzzleState::from_level(0, &LevelDef::new("t", terrain, tokens)).unwrap()
    }

    #[test]
    fn player_position_found_on_load() {
        let s = state(&["####", "#  #", "# @#", "####"]);
        assert_eq!(s.player(), Pos::new(2, 2));
        assert_eq!(s.moves(), 0);
        assert!(s.invariants_hold());
    }

    #[test]
    fn missing_player_is_reported() {
        let (terrain, tokens, _) = map_from(&["@ "]);
        let mut tokens = tokens;
        tokens.set(Pos::new(0, 0), Token::Empty);
        let err = PuzzleState::from_level(3, &LevelDef::new("t", terrain, tokens)).unwrap_err();
        assert!(matches!(err, EngineError::NoPlayerToken { level: 3 }));
    }

    #[test]
    fn mismatched_layers_are_rejected() {
        let (terrain, _, _) = map_from(&["@  "]);
        let (_, tokens, _) = map_from(&["@ ", "  "]);
        let err = PuzzleState::from_level(0, &LevelDef::new("t", terrain, tokens)).unwrap_err();
        assert!(matches!(err, EngineError::Level(LevelError::MalformedLevel { .. })));
    }

    #[test]
    fn step_moves_player_and_clears_old_cell() {
        let mut s = state(&["@ ."]);
        assert!(s.apply(Direction::Right));
        assert_eq!(s.player(), Pos::new(0, 1));
        assert_eq!(s.token_at(Pos::new(0, 0)), Some(Token::Empty));
        assert_eq!(s.token_at(Pos::new(0, 1)), Some(Token::Player));
        assert_eq!(s.moves(), 1);
    }

    #[test]
    fn push_moves_box_and_player() {
        let mut s = state(&["#####", "#@$ #", "#####"]);
        assert!(s.apply(Direction::Right));
        assert_eq!(s.token_at(Pos::new(1, 3)), Some(Token::Box));
        assert_eq!(s.token_at(Pos::new(1, 2)), Some(Token::Player));
        assert_eq!(s.token_at(Pos::new(1, 1)), Some(Token::Empty));
        assert_eq!(s.player(), Pos::new(1, 2));
    }

    #[test]
    fn push_into_wall_changes_nothing() {
        let mut s = state(&["#####", "#@$##", "#####"]);
        let before = s.clone();
        assert!(!s.apply(Direction::Right));
        assert_eq!(s.tokens(), before.tokens());
        assert_eq!(s.player(), before.player());
        assert_eq!(s.moves(), 0);
    }

    #[test]
    fn terrain_is_untouched_by_moves() {
        let mut s = state(&["@$. "]);
        let terrain_before: Vec<_> = s.terrain.iter().collect();
        s.apply(Direction::Right);
        s.apply(Direction::Right);
        let terrain_after: Vec<_> = s.terrain.iter().collect();
        assert_eq!(terrain_before, terrain_after);
    }

    #[test]
    fn pushing_last_box_onto_goal_solves() {
        let mut s = state(&["@$."]);
        assert!(!s.is_solved());
        assert!(s.apply(Direction::Right));
        assert!(s.is_solved());
    }
}
