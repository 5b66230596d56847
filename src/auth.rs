/// Username/password accounts held for the life of the process.
///
/// Nothing is written to disk: registered accounts are gone on exit.
/// A user identifier is just the username; a session without one is a guest.

use std::collections::HashMap;

use crate::error::AuthError;

#[derive(Default)]
pub struct CredentialStore {
    accounts: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account. Usernames are compared exactly (case-sensitive).
    pub fn register(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::EmptyField);
        }
        if self.accounts.contains_key(username) {
            return Err(AuthError::UsernameTaken);
        }
        self.accounts.insert(username.to_string(), password.to_string());
        log::info!("registered user {username}");
        Ok(())
    }

    /// Check a username/password pair and return the user identifier.
    pub fn verify(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::EmptyField);
        }
        match self.accounts.get(username) {
            Some(stored) if stored == password => {
                log::info!("user {username} logged in");
                Ok(username.to_string())
            }
            _ => {
                log::warn!("failed login for {username}");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }
}
