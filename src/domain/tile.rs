/// Terrain tiles and dynamic tokens.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

/// Static terrain. Never changes while a level is being played.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Goal,
}

impl Tile {
    /// Can the player (or a pushed box) occupy this tile?
    pub fn is_passable(self) -> bool {
        matches!(self, Tile::Empty | Tile::Goal)
    }

    pub fn is_goal(self) -> bool {
        matches!(self, Tile::Goal)
    }

    /// Embedded terrain notation: `#` wall, `G` goal, space empty.
    pub fn from_char(c: char) -> Option<Tile> {
        match c {
            ' ' => Some(Tile::Empty),
            '#' => Some(Tile::Wall),
            'G' => Some(Tile::Goal),
            _ => None,
        }
    }
}

/// Things that sit on top of the terrain and move during play.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Token {
    #[default]
    Empty,
    Player,
    Box,
}

impl Token {
    /// Embedded dynamic notation: `@` player, `B` box, space empty.
    pub fn from_char(c: char) -> Option<Token> {
        match c {
            ' ' => Some(Token::Empty),
            '@' => Some(Token::Player),
            'B' => Some(Token::Box),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Token::Empty => ' ',
            Token::Player => '@',
            Token::Box => 'B',
        }
    }
}

/// Split one cell of the common single-grid notation into its two layers.
///
///   '#' = Wall           '.' = Goal
///   '$' = Box            '*' = Box on goal
///   '@' = Player         '+' = Player on goal
///   ' ', '-', '_' = Floor
pub fn split_cell(c: char) -> Option<(Tile, Token)> {
    match c {
        ' ' | '-' | '_' => Some((Tile::Empty, Token::Empty)),
        '#' => Some((Tile::Wall, Token::Empty)),
        '.' => Some((Tile::Goal, Token::Empty)),
        '$' => Some((Tile::Empty, Token::Box)),
        '*' => Some((Tile::Goal, Token::Box)),
        '@' => Some((Tile::Empty, Token::Player)),
        '+' => Some((Tile::Goal, Token::Player)),
        _ => None,
    }
}
