//! # chat-api
//!
//! HTTP client for the chat server's REST endpoints: login, registration and
//! the robot roster.

pub mod client;
pub mod error;
pub mod models;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use models::{AuthResponse, CreateAccountRequest, LoginRequest};
