/// Game engine: level catalog, board state, session flow and progress storage.
pub mod level;
pub mod save;
pub mod session;
pub mod world;
