//! Credential store trait
//!
//! A key-value store holding the tokens issued by the login flow. The session
//! only reads from it; login writes the token after a successful sign-in.

/// Key holding the token issued at login
pub const AUTH_TOKEN_KEY: &str = "jwtToken";

/// Key holding a replacement token, read when a send is retried
pub const REFRESHED_TOKEN_KEY: &str = "newJwtToken";

/// Key-value store for auth tokens
pub trait CredentialStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous one
    fn set(&self, key: &str, value: String);

    /// Remove a value
    fn remove(&self, key: &str);

    /// Token issued at login, if present and non-empty
    fn auth_token(&self) -> Option<String> {
        self.get(AUTH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Replacement token, if present and non-empty
    fn refreshed_token(&self) -> Option<String> {
        self.get(REFRESHED_TOKEN_KEY).filter(|t| !t.is_empty())
    }
}
