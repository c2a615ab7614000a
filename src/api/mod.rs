//! Boundary to the remote decision service.
//!
//! Everything above this module talks to [`RemoteApi`], so tests swap in
//! fakes and the engine never sees a transport type.

mod error;
#[cfg(test)]
pub(crate) mod fake;
mod http;

pub use error::ApiError;
pub use http::HttpApi;

use crate::feedback::{EventBatch, FeedbackAck, FeedbackRequest};
use crate::inference::{InferenceRequest, RemoteDecision};

#[async_trait::async_trait]
pub trait RemoteApi: Send + Sync {
    /// `POST /v1/init`
    async fn decide(&self, request: &InferenceRequest) -> Result<RemoteDecision, ApiError>;

    /// `POST /v1/feedback`
    async fn send_feedback(&self, request: &FeedbackRequest) -> Result<FeedbackAck, ApiError>;

    /// `POST /v1/events`
    async fn track_events(&self, batch: &EventBatch) -> Result<(), ApiError>;

    /// `GET /`; false on any failure.
    async fn check_health(&self) -> bool;
}
