//! Local command surface of an enroller unit.
//!
//! A small HTTP API that lets an operator console trigger an enrollment and
//! exercise the buzzer and the alarm speaker:
//!
//! | Route         | Action                                 | Success |
//! |---------------|----------------------------------------|---------|
//! | `POST /api`   | read one card and enroll it remotely   | 200 `{"type":"rfid","card_id",…}` |
//! | `POST /beep`  | sound the buzzer test tone             | 200 `{"status":"success",…}` |
//! | `POST /alarm` | play the alarm clip                    | 200 `{"status":"success",…}` |
//!
//! Failures answer `{"status":"error","message"}` with the status code of
//! the [`CommandError`]. The actions themselves live behind the
//! [`CommandSurface`] trait so the router can be tested without hardware.

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tapgate_core::CardId;
use thiserror::Error;
use tokio::{net::TcpListener, time::Instant};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Card captured and accepted by a triggered enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledCard {
    pub card_id: CardId,
}

/// Actions reachable through the command surface.
pub trait CommandSurface: Send + Sync + 'static {
    /// Open a read window, then enroll the captured card remotely.
    fn trigger_enrollment(&self) -> impl Future<Output = Result<EnrolledCard, CommandError>> + Send;

    /// Sound the buzzer test tone.
    fn test_tone(&self) -> impl Future<Output = Result<(), CommandError>> + Send;

    /// Play the alarm clip.
    fn play_alarm(&self) -> impl Future<Output = Result<(), CommandError>> + Send;
}

/// Errors reported to the command-surface caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No card entered the field within the enrollment window
    #[error("Card read timed out after {0}ms")]
    ReadTimeout(u64),

    /// The remote service did not accept the card
    #[error("Remote enrollment failed: {0}")]
    RemoteEnrollFailed(String),

    /// Another enrollment holds the reader
    #[error("Another enrollment is already in progress")]
    Busy,

    /// The action is not available in the current configuration
    #[error("{0}")]
    Disabled(String),

    /// Reader, indicator or audio failure
    #[error("Hardware error: {0}")]
    Hardware(String),
}

impl CommandError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ReadTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::Busy | Self::Disabled(_) => StatusCode::CONFLICT,
            Self::RemoteEnrollFailed(_) | Self::Hardware(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `{"status", "message"}` body shared by every non-enrollment answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Body of a successful `POST /api`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub card_id: String,
    pub status: String,
    pub message: String,
}

impl From<EnrolledCard> for EnrollmentResponse {
    fn from(enrolled: EnrolledCard) -> Self {
        Self {
            kind: "rfid".to_string(),
            card_id: enrolled.card_id.to_hex(),
            status: "success".to_string(),
            message: "Card enrolled".to_string(),
        }
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(StatusResponse::error(self.to_string()))).into_response()
    }
}

async fn enroll_handler<C: CommandSurface>(
    State(surface): State<Arc<C>>,
) -> Result<Json<EnrollmentResponse>, CommandError> {
    let enrolled = surface.trigger_enrollment().await?;
    Ok(Json(enrolled.into()))
}

async fn beep_handler<C: CommandSurface>(
    State(surface): State<Arc<C>>,
) -> Result<Json<StatusResponse>, CommandError> {
    surface.test_tone().await?;
    Ok(Json(StatusResponse::success("Buzzer activated")))
}

async fn alarm_handler<C: CommandSurface>(
    State(surface): State<Arc<C>>,
) -> Result<Json<StatusResponse>, CommandError> {
    surface.play_alarm().await?;
    Ok(Json(StatusResponse::success("Sound played successfully")))
}

/// Log every request and its outcome.
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    info!(%method, %path, "Command request received");

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if status.is_success() {
        info!(%method, %path, status = status.as_u16(), latency_ms, "Command request completed");
    } else {
        warn!(%method, %path, status = status.as_u16(), latency_ms, "Command request failed");
    }
    response
}

/// Build the command-surface router over `surface`.
///
/// Every route accepts cross-origin calls so an operator console served
/// from another host can drive the unit.
pub fn build_router<C: CommandSurface>(surface: Arc<C>) -> Router {
    Router::new()
        .route("/api", post(enroll_handler::<C>))
        .route("/beep", post(beep_handler::<C>))
        .route("/alarm", post(alarm_handler::<C>))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_requests))
        .with_state(surface)
}

/// Errors starting or running the command server
#[derive(Debug, Error)]
pub enum CommandServerError {
    #[error("Failed to bind command surface on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Command surface stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// Configuration for [`CommandServer`]
#[derive(Debug, Clone)]
pub struct CommandServerConfig {
    pub bind_addr: SocketAddr,
}

impl CommandServerConfig {
    /// Listen on every interface at `port`.
    pub fn on_port(port: u16) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }
}

/// Bound command-surface listener.
#[derive(Debug)]
pub struct CommandServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl CommandServer {
    /// Bind the listener.
    ///
    /// # Errors
    ///
    /// Returns [`CommandServerError::Bind`] if the address is unavailable.
    pub async fn bind(config: CommandServerConfig) -> Result<Self, CommandServerError> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| CommandServerError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| CommandServerError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        info!("Command surface listening on {}", local_addr);
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve `surface` until `shutdown` is cancelled. In-flight requests are
    /// allowed to finish.
    pub async fn serve<C: CommandSurface>(
        self,
        surface: Arc<C>,
        shutdown: CancellationToken,
    ) -> Result<(), CommandServerError> {
        axum::serve(self.listener, build_router(surface))
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(CommandServerError::Serve)?;
        info!("Command surface stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::timeout(CommandError::ReadTimeout(10_000), StatusCode::REQUEST_TIMEOUT)]
    #[case::remote(CommandError::RemoteEnrollFailed("503".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case::busy(CommandError::Busy, StatusCode::CONFLICT)]
    #[case::disabled(CommandError::Disabled("auto-capture".into()), StatusCode::CONFLICT)]
    #[case::hardware(CommandError::Hardware("reader faulted".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_codes(#[case] error: CommandError, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
        assert_eq!(error.into_response().status(), expected);
    }

    #[test]
    fn test_enrollment_response_shape() {
        let card: CardId = "04A3B2C1".parse().unwrap();
        let body = serde_json::to_value(EnrollmentResponse::from(EnrolledCard { card_id: card }))
            .unwrap();
        assert_eq!(body["type"], "rfid");
        assert_eq!(body["card_id"], "04a3b2c1");
        assert_eq!(body["status"], "success");
        assert!(body["message"].is_string());
    }

    #[test]
    fn test_on_port_binds_all_interfaces() {
        let config = CommandServerConfig::on_port(5000);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:5000");
    }
}
