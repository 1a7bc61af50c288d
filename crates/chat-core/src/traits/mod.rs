//! Traits for collaborators the domain reads from but does not own

mod credentials;

pub use credentials::{CredentialStore, AUTH_TOKEN_KEY, REFRESHED_TOKEN_KEY};
