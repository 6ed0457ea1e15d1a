//! Network layer for Tapgate
//!
//! Two HTTP edges of an access-control unit:
//!
//! - **HttpAccessClient**: outbound calls to the remote authorization and
//!   enrollment service (reqwest)
//! - **CommandServer**: inbound command surface of an enroller unit (axum)
//!
//! Both are thin transports. Decisions about what an answer means for the
//! indicators are made by the controller.
//!
//! # Example
//!
//! ```no_run
//! use tapgate_network::{HttpAccessClient, HttpClientConfig};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpAccessClient::new(HttpClientConfig {
//!     base_url: "http://127.0.0.1:8080/api".to_string(),
//!     timeout: Duration::from_millis(5000),
//! })?;
//! # Ok(())
//! # }
//! ```

mod client;
mod server;

pub use client::{
    AccessDecision, EnrollAck, HttpAccessClient, HttpClientConfig, RemoteAccessClient,
    RemoteCallError,
};
pub use server::{
    CommandError, CommandServer, CommandServerConfig, CommandServerError, CommandSurface,
    EnrolledCard, EnrollmentResponse, StatusResponse, build_router,
};
