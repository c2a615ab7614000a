use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::feedback::{EventBatch, FeedbackAck, FeedbackRequest};
use crate::inference::{InferenceRequest, RemoteDecision};

use super::{ApiError, RemoteApi};

const INIT_PATH: &str = "/v1/init";
const FEEDBACK_PATH: &str = "/v1/feedback";
const EVENTS_PATH: &str = "/v1/events";

/// reqwest client for the decision service. One instance is shared by the
/// gateway, feedback sink and event tracker.
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(
        &self,
        path: &str,
        body: &(impl Serialize + ?Sized + Sync),
    ) -> Result<reqwest::Response, ApiError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + ?Sized + Sync),
    ) -> Result<T, ApiError> {
        let bytes = self
            .post(path, body)
            .await?
            .bytes()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RemoteApi for HttpApi {
    async fn decide(&self, request: &InferenceRequest) -> Result<RemoteDecision, ApiError> {
        self.post_json(INIT_PATH, request).await
    }

    async fn send_feedback(&self, request: &FeedbackRequest) -> Result<FeedbackAck, ApiError> {
        self.post_json(FEEDBACK_PATH, request).await
    }

    async fn track_events(&self, batch: &EventBatch) -> Result<(), ApiError> {
        self.post(EVENTS_PATH, batch).await.map(|_| ())
    }

    async fn check_health(&self) -> bool {
        match self.client.get(self.url("/")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let api = HttpApi::new("http://10.0.2.2:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://10.0.2.2:8000");
        assert_eq!(api.url(INIT_PATH), "http://10.0.2.2:8000/v1/init");
    }
}
