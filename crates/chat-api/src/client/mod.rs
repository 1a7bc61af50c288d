//! REST client
//!
//! Authenticated calls carry the login token as a bearer header and are
//! retried on any failure. Login and registration are only retried when the
//! server answers 500.

use std::time::Duration;

use chat_common::ClientConfig;
use chat_core::{CredentialStore, RetryDecision, RetryPolicy, RoboChatter, AUTH_TOKEN_KEY};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{AuthResponse, CreateAccountRequest, LoginRequest};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Three tries, 200 ms apart
const DEFAULT_REQUEST_POLICY: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(200));

/// First try plus three retries on 500, 3 ms apart
const DEFAULT_AUTH_POLICY: RetryPolicy = RetryPolicy::new(4, Duration::from_millis(3));

/// Client for the chat server's HTTP endpoints
#[derive(Debug, Clone)]
pub struct ApiClient<C> {
    http: reqwest::Client,
    base_url: String,
    credentials: C,
    request_policy: RetryPolicy,
    auth_policy: RetryPolicy,
}

impl<C: CredentialStore> ApiClient<C> {
    /// Create a client for `base_url` reading and writing tokens in `credentials`
    pub fn new(base_url: impl Into<String>, credentials: C) -> ApiResult<Self> {
        Self::build(&base_url.into(), credentials, DEFAULT_TIMEOUT)
    }

    /// Create a client from configuration
    pub fn from_config(config: &ClientConfig, credentials: C) -> ApiResult<Self> {
        Ok(Self::build(config.server.http_base(), credentials, config.api.timeout())?
            .with_request_policy(config.api.request_policy())
            .with_auth_policy(config.api.auth_policy()))
    }

    fn build(base_url: &str, credentials: C, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            request_policy: DEFAULT_REQUEST_POLICY,
            auth_policy: DEFAULT_AUTH_POLICY,
        })
    }

    /// Override the policy for authenticated requests
    #[must_use]
    pub fn with_request_policy(mut self, policy: RetryPolicy) -> Self {
        self.request_policy = policy;
        self
    }

    /// Override the policy for login and registration
    #[must_use]
    pub fn with_auth_policy(mut self, policy: RetryPolicy) -> Self {
        self.auth_policy = policy;
        self
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send an authenticated request and decode the JSON reply
    ///
    /// Non-2xx statuses, transport errors and undecodable bodies are all
    /// retried; the last error is returned once the attempts run out.
    pub async fn fetch_with_auth<T>(&self, method: Method, path: &str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let token = self.credentials.auth_token().ok_or(ApiError::MissingToken)?;
        let url = self.url(path);

        let mut retry = self.request_policy.start();
        let mut last_error = None;

        while let RetryDecision::Retry { attempt, delay } = retry.next_attempt() {
            if attempt > 1 {
                tokio::time::sleep(delay).await;
            }

            match self.send_authorized(method.clone(), &url, &token).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::warn!(attempt, url = %url, error = %e, "Authenticated request failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ApiError::RetriesExhausted {
            attempts: retry.attempts(),
        }))
    }

    async fn send_authorized<T>(&self, method: Method, url: &str, token: &str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// List every robot chatter
    ///
    /// GET /robochatters
    pub async fn robo_chatters(&self) -> ApiResult<Vec<RoboChatter>> {
        self.fetch_with_auth(Method::GET, "robochatters")
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error fetching robot chatters"))
    }

    /// Flip a robot chatter on or off and return its new state
    ///
    /// POST /robochatter/toggle/{id}
    pub async fn toggle_robo_chatter(&self, id: i64) -> ApiResult<RoboChatter> {
        self.fetch_with_auth(Method::POST, &format!("robochatter/toggle/{id}"))
            .await
            .inspect_err(|e| tracing::error!(robot_id = id, error = %e, "Error toggling robot chatter"))
    }

    /// Log in and store the issued token under `jwtToken`
    ///
    /// POST /login
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<String> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let token = self
            .post_auth("login", &request)
            .await?
            .into_token()
            .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;

        self.credentials.set(AUTH_TOKEN_KEY, token.clone());
        tracing::info!(email, "Logged in");
        Ok(token)
    }

    /// Register a new account and return the server's confirmation
    ///
    /// POST /create_account
    pub async fn create_account(&self, email: &str, name: &str, password: &str) -> ApiResult<String> {
        let request = CreateAccountRequest {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        };

        let reply = self
            .post_auth("create_account", &request)
            .await?
            .into_result()
            .inspect_err(|e| tracing::warn!(error = %e, "Account creation failed"))?;

        tracing::info!(email, "Account created");
        Ok(reply.message.unwrap_or_default())
    }

    async fn post_auth<B>(&self, path: &str, body: &B) -> ApiResult<AuthResponse>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut retry = self.auth_policy.start();

        while let RetryDecision::Retry { attempt, delay } = retry.next_attempt() {
            if attempt > 1 {
                tokio::time::sleep(delay).await;
            }

            let response = self.http.post(&url).json(body).send().await?;
            if response.status() == StatusCode::INTERNAL_SERVER_ERROR && !retry.is_exhausted() {
                tracing::warn!(attempt, url = %url, "Internal server error, retrying");
                continue;
            }

            return auth_reply(response).await;
        }

        Err(ApiError::RetriesExhausted {
            attempts: retry.attempts(),
        })
    }
}

/// Decode a login or registration reply, preferring the server's `{error}`
async fn auth_reply(response: Response) -> ApiResult<AuthResponse> {
    let status = response.status();
    let text = response.text().await?;

    match serde_json::from_str::<AuthResponse>(&text) {
        Ok(reply) if reply.error.is_some() || status.is_success() => Ok(reply),
        Err(e) if status.is_success() => Err(ApiError::InvalidResponse(e.to_string())),
        _ => Err(ApiError::Status {
            status: status.as_u16(),
        }),
    }
}
