//! LLM error types

use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while talking to the model service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Classify a reqwest send error, separating timeouts
    pub fn from_send(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            debug!(?timeout, "LlmError::from_send: timeout");
            LlmError::Timeout(timeout)
        } else {
            LlmError::Network(err)
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Turn a non-success HTTP response into an error
///
/// 429 becomes [`LlmError::RateLimited`] using the `retry-after` header
/// (60 seconds when absent).
pub async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status().as_u16();
    if status == 429 {
        debug!("error_for_status: rate limited (429)");
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(LlmError::RateLimited {
            retry_after: Duration::from_secs(retry_after),
        });
    }

    if !response.status().is_success() {
        debug!(%status, "error_for_status: API error");
        let message = response.text().await.unwrap_or_default();
        return Err(LlmError::ApiError { status, message });
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after() {
        let err = LlmError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(LlmError::Timeout(Duration::from_secs(1)).retry_after(), None);
        let err = LlmError::ApiError {
            status: 500,
            message: "Server error".to_string(),
        };
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn test_display() {
        let err = LlmError::ApiError {
            status: 403,
            message: "PERMISSION_DENIED".to_string(),
        };
        assert_eq!(err.to_string(), "API error 403: PERMISSION_DENIED");
    }
}
