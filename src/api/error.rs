use std::time::Duration;

use crate::inference::FailureKind;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("server error ({status}): {body}")]
    Server { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Timeout(_) => FailureKind::Timeout,
            ApiError::Network(_) => FailureKind::Network,
            ApiError::Server { .. } => FailureKind::Server,
            ApiError::Decode(_) => FailureKind::Decode,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout)
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
