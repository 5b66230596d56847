/// Error types shared across the catalog, engine, persistence and login layers.

use std::io;

/// Problems with level data. Static content, so these are configuration bugs.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("level {level} is malformed: {reason}")]
    MalformedLevel { level: usize, reason: String },
    #[error("level index {index} out of range (catalog has {count} levels)")]
    IndexOutOfRange { index: usize, count: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("level {level} has no player token")]
    NoPlayerToken { level: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("saving is available only for registered users")]
    Unauthenticated,
    #[error("save failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("username already exists")]
    UsernameTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username and password must not be empty")]
    EmptyField,
}
