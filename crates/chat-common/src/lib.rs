//! # chat-common
//!
//! Shared utilities including configuration, credential storage and telemetry.

pub mod config;
pub mod credentials;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    ApiConfig, AppSettings, ClientConfig, ConfigError, CredentialsConfig, Environment,
    ServerConfig, SessionConfig,
};
pub use credentials::MemoryCredentialStore;
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
