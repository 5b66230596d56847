/// Board model: tiles, grids, and the pure movement rules.

pub mod grid;
pub mod rules;
pub mod tile;
