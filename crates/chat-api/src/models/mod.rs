//! Request and response bodies of the REST endpoints

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// POST /login body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /create_account body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Reply of the login and registration endpoints
///
/// Failures come back as `{"error": "..."}`, successes carry a message and,
/// for login, the token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthResponse {
    /// Turn an `{error}` reply into [`ApiError::Rejected`]
    pub fn into_result(self) -> ApiResult<Self> {
        match self.error {
            Some(error) => Err(ApiError::Rejected(error)),
            None => Ok(self),
        }
    }

    /// Token of a successful login
    pub fn into_token(self) -> ApiResult<String> {
        self.into_result()?
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("login reply has no token".into()))
    }
}
