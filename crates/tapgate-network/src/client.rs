//! HTTP client for the remote authorization and enrollment service.
//!
//! The controller asks three questions of the remote service:
//!
//! ```text
//! DeviceController
//!     │
//!     ├─> check_access(card)      GET  {base}/api/entry/{hex}
//!     ├─> enroll(card)            POST {base}/users/enroll        {"card_id": hex}
//!     └─> enroll_temporary(card)  POST {base}/temporary-user?rfid={hex}
//! ```
//!
//! Every call is bounded by the configured request timeout. The client does
//! not retry; any error means "cannot confirm" and the caller fails closed.
//!
//! # Example
//!
//! ```no_run
//! use tapgate_network::{HttpAccessClient, HttpClientConfig, RemoteAccessClient};
//! use tapgate_core::CardId;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpAccessClient::new(HttpClientConfig {
//!     base_url: "http://10.0.0.5:8080/api".to_string(),
//!     timeout: Duration::from_secs(5),
//! })?;
//!
//! let card: CardId = "04a3b2c1".parse()?;
//! let decision = client.check_access(&card).await?;
//! println!("allowed: {}", decision.allowed);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tapgate_core::{CardId, DeviceConfig};
use thiserror::Error;
use tracing::{debug, warn};

/// Answer to "is this card authorized?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessDecision {
    /// A missing field means "not allowed".
    #[serde(default)]
    pub allowed: bool,
}

/// Answer to an enrollment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollAck {
    pub accepted: bool,
}

/// Optional body of a 2xx enrollment answer.
#[derive(Debug, Deserialize)]
struct EnrollBody {
    accepted: Option<bool>,
}

#[derive(Debug, Serialize)]
struct EnrollRequest<'a> {
    card_id: &'a str,
}

/// Errors of a remote call. All of them mean "cannot confirm".
#[derive(Debug, Error)]
pub enum RemoteCallError {
    /// No answer within the request timeout
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Remote service unreachable
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Remote service answered with an unexpected status
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// Answer body could not be decoded
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// Any other transport failure
    #[error("Request failed: {0}")]
    Request(String),
}

impl RemoteCallError {
    fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            Self::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

/// The remote authorization and enrollment service.
pub trait RemoteAccessClient: Send + Sync {
    /// Ask whether `card` may pass.
    fn check_access(
        &self,
        card: &CardId,
    ) -> impl Future<Output = Result<AccessDecision, RemoteCallError>> + Send;

    /// Register `card` permanently (server-triggered enrollment). Only a
    /// 200 answer confirms it.
    fn enroll(
        &self,
        card: &CardId,
    ) -> impl Future<Output = Result<EnrollAck, RemoteCallError>> + Send;

    /// Register `card` as a temporary user (auto-capture enrollment). Any
    /// 2xx answer confirms it.
    fn enroll_temporary(
        &self,
        card: &CardId,
    ) -> impl Future<Output = Result<EnrollAck, RemoteCallError>> + Send;
}

/// Configuration for [`HttpAccessClient`]
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL every route is appended to
    pub base_url: String,

    /// Timeout of each call, connect included
    pub timeout: Duration,
}

impl From<&DeviceConfig> for HttpClientConfig {
    fn from(config: &DeviceConfig) -> Self {
        Self {
            base_url: config.api_base().to_string(),
            timeout: config.request_timeout,
        }
    }
}

/// reqwest-backed [`RemoteAccessClient`].
#[derive(Debug, Clone)]
pub struct HttpAccessClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpAccessClient {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialized.
    pub fn new(config: HttpClientConfig) -> Result<Self, RemoteCallError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| RemoteCallError::Request(e.to_string()))?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        debug!("Creating HTTP access client for {}", base_url);
        Ok(Self {
            http,
            base_url,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RemoteCallError> {
        request.send().await.map_err(|e| {
            let error = RemoteCallError::from_reqwest(e, self.timeout);
            warn!("Remote call failed: {}", error);
            error
        })
    }

    /// Map a 2xx answer to an [`EnrollAck`]. An empty or non-JSON body
    /// counts as accepted; only an explicit `"accepted": false` refuses.
    async fn enroll_ack(
        &self,
        response: reqwest::Response,
    ) -> Result<EnrollAck, RemoteCallError> {
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Enrollment refused by remote service");
            return Err(RemoteCallError::Status(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteCallError::from_reqwest(e, self.timeout))?;
        let accepted = serde_json::from_slice::<EnrollBody>(&body)
            .ok()
            .and_then(|b| b.accepted)
            .unwrap_or(true);
        Ok(EnrollAck { accepted })
    }
}

impl RemoteAccessClient for HttpAccessClient {
    async fn check_access(&self, card: &CardId) -> Result<AccessDecision, RemoteCallError> {
        let url = format!("{}/api/entry/{}", self.base_url, card.to_hex());
        debug!(card_id = %card, "Checking access");

        let response = self.send(self.http.get(&url)).await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(card_id = %card, status = status.as_u16(), "Access check rejected");
            return Err(RemoteCallError::Status(status.as_u16()));
        }

        let decision: AccessDecision = response
            .json()
            .await
            .map_err(|e| RemoteCallError::Decode(e.to_string()))?;
        debug!(card_id = %card, allowed = decision.allowed, "Access decision");
        Ok(decision)
    }

    async fn enroll(&self, card: &CardId) -> Result<EnrollAck, RemoteCallError> {
        let url = format!("{}/users/enroll", self.base_url);
        let hex = card.to_hex();
        debug!(card_id = %card, "Enrolling card");

        let response = self
            .send(self.http.post(&url).json(&EnrollRequest { card_id: &hex }))
            .await?;
        // Permanent enrollment is confirmed by a 200 only.
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(card_id = %card, status = status.as_u16(), "Enrollment not confirmed");
            return Err(RemoteCallError::Status(status.as_u16()));
        }
        self.enroll_ack(response).await
    }

    async fn enroll_temporary(&self, card: &CardId) -> Result<EnrollAck, RemoteCallError> {
        let url = format!("{}/temporary-user", self.base_url);
        let hex = card.to_hex();
        debug!(card_id = %card, "Registering temporary user");

        let response = self
            .send(self.http.post(&url).query(&[("rfid", hex.as_str())]))
            .await?;
        self.enroll_ack(response).await
    }
}
