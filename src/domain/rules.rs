/// Pure movement rules. No side effects; these functions only decide.
/// The engine applies the decision to its grids.
///
/// Resolution order for a step from `player` in `dir`:
///   1. Off-grid target                       → Blocked
///   2. Wall at target                        → Blocked
///   3. Box at target: look one cell further
///        off-grid / another box / wall       → Blocked
///        otherwise                           → Push
///   4. Empty or goal terrain at target       → Step
///   5. Anything else                         → Blocked

use super::grid::{Direction, Grid, Pos};
use super::tile::{Tile, Token};

/// What a move request resolves to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resolution {
    Blocked,
    /// Player walks into `to`.
    Step { to: Pos },
    /// Player walks into `to`; the box there moves to `box_to`.
    Push { to: Pos, box_to: Pos },
}

pub fn resolve_move(
    terrain: &Grid<Tile>,
    dynamic: &Grid<Token>,
    player: Pos,
    dir: Direction,
) -> Resolution {
    let Some(to) = terrain.step(player, dir) else {
        return Resolution::Blocked;
    };
    let target_tile = terrain.get(to).unwrap_or(Tile::Wall);
    if target_tile == Tile::Wall {
        return Resolution::Blocked;
    }

    if dynamic.get(to) == Some(Token::Box) {
        return match terrain.step(to, dir) {
            Some(box_to) if can_receive_box(terrain, dynamic, box_to) => {
                Resolution::Push { to, box_to }
            }
            _ => Resolution::Blocked,
        };
    }

    if target_tile.is_passable() {
        Resolution::Step { to }
    } else {
        Resolution::Blocked
    }
}

/// A box may land on empty floor or a goal, never on a wall or another box.
fn can_receive_box(terrain: &Grid<Tile>, dynamic: &Grid<Token>, pos: Pos) -> bool {
    if dynamic.get(pos) == Some(Token::Box) {
        return false;
    }
    terrain.get(pos).is_some_and(Tile::is_passable)
}

/// Every goal covered by a box at the same coordinates.
pub fn is_solved(terrain: &Grid<Tile>, dynamic: &Grid<Token>) -> bool {
    terrain
        .positions_of(Tile::Goal)
        .all(|p| dynamic.get(p) == Some(Token::Box))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::tile::split_cell;

    /// Helper: build both layers from a single-grid diagram.
    /// Legend:  '#'=Wall  '.'=Goal  '$'=Box  '*'=Box on goal
    ///          '@'=Player  '+'=Player on goal  ' '=Empty
    pub(crate) fn map_from(rows: &[&str]) -> (Grid<Tile>, Grid<Token>, Pos) {
        let mut terrain = vec![];
        let mut dynamic = vec![];
        let mut player = None;
        for (r, row) in rows.iter().enumerate() {
            let mut t_row = vec![];
            let mut d_row = vec![];
            for (c, ch) in row.chars().enumerate() {
                let (tile, token) = split_cell(ch).unwrap();
                if token == Token::Player {
                    player = Some(Pos::new(r, c));
                }
                t_row.push(tile);
                d_row.push(token);
            }
            terrain.push(t_row);
            dynamic.push(d_row);
        }
        (
            Grid::from_rows(terrain).unwrap(),
            Grid::from_rows(dynamic).unwrap(),
            player.unwrap(),
        )
    }

    fn resolve(rows: &[&str], dir: Direction) -> Resolution {
        let (t, d, p) = map_from(rows);
        resolve_move(&t, &d, p, dir)
    }

    // ── Stepping ──

    #[test]
    fn step_onto_floor() {
        assert_eq!(resolve(&["@ "], Direction::Right), Resolution::Step { to: Pos::new(0, 1) });
    }

    #[test]
    fn step_onto_goal() {
        assert_eq!(resolve(&[".@"], Direction::Left), Resolution::Step { to: Pos::new(0, 0) });
    }

    #[test]
    fn step_into_wall_is_blocked() {
        assert_eq!(resolve(&["@#"], Direction::Right), Resolution::Blocked);
    }

    #[test]
    fn step_off_grid_is_blocked() {
        // No surrounding walls: the grid edge itself must stop the player.
        for dir in Direction::ALL {
            assert_eq!(resolve(&["@"], dir), Resolution::Blocked);
        }
    }

    // ── Pushing ──

    #[test]
    fn push_box_onto_floor() {
        assert_eq!(
            resolve(&["####", "#@$ ", "####"], Direction::Right),
            Resolution::Push { to: Pos::new(1, 2), box_to: Pos::new(1, 3) },
        );
    }

    #[test]
    fn push_box_onto_goal() {
        assert_eq!(
            resolve(&["@$."], Direction::Right),
            Resolution::Push { to: Pos::new(0, 1), box_to: Pos::new(0, 2) },
        );
    }

    #[test]
    fn push_box_into_wall_is_blocked() {
        assert_eq!(resolve(&["#####", "#@$##", "#####"], Direction::Right), Resolution::Blocked);
    }

    #[test]
    fn push_two_boxes_is_blocked() {
        assert_eq!(resolve(&["@$$ "], Direction::Right), Resolution::Blocked);
        assert_eq!(resolve(&["@$* "], Direction::Right), Resolution::Blocked);
    }

    #[test]
    fn push_box_off_grid_is_blocked() {
        assert_eq!(resolve(&["@$"], Direction::Right), Resolution::Blocked);
        assert_eq!(resolve(&["$", "@"], Direction::Up), Resolution::Blocked);
    }

    #[test]
    fn push_box_off_goal() {
        assert_eq!(
            resolve(&["*@"], Direction::Left),
            Resolution::Blocked,
        );
        assert_eq!(
            resolve(&[" *@"], Direction::Left),
            Resolution::Push { to: Pos::new(0, 1), box_to: Pos::new(0, 0) },
        );
    }

    // ── Win detection ──

    #[test]
    fn solved_when_every_goal_has_a_box() {
        let (t, d, _) = map_from(&["@**"]);
        assert!(is_solved(&t, &d));
    }

    #[test]
    fn not_solved_with_one_bare_goal() {
        let (t, d, _) = map_from(&["@*."]);
        assert!(!is_solved(&t, &d));
    }

    #[test]
    fn player_on_goal_does_not_count() {
        let (t, d, _) = map_from(&["###", "#+#", "###"]);
        assert!(!is_solved(&t, &d));
    }

    #[test]
    fn box_on_goal_counts_even_with_spare_boxes() {
        let (t, d, _) = map_from(&["@*$$"]);
        assert!(is_solved(&t, &d));
    }

    #[test]
    fn box_count_alone_is_not_enough() {
        // Two boxes, two goals, but only one goal covered.
        let (t, d, _) = map_from(&["@*$."]);
        assert!(!is_solved(&t, &d));
    }
}
