//! Error types for the remote data client

use std::sync::Arc;

use musea_catalog::RejectedEnvelope;
use thiserror::Error;

/// Errors surfaced by the remote data client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, TLS, timeout, malformed body).
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response that carried no usable envelope.
    #[error("unexpected http status {status}")]
    Http { status: u16 },

    /// Envelope arrived with `success: false`.
    #[error("api rejected request: {message}")]
    Api {
        message: String,
        trace_id: Option<String>,
    },

    /// 401 from the backend. Session teardown is the caller's
    /// responsibility; the client only reports it.
    #[error("unauthorized (token missing or expired)")]
    Unauthorized,
}

impl From<RejectedEnvelope> for ApiError {
    fn from(rejected: RejectedEnvelope) -> Self {
        ApiError::Api {
            message: rejected.message,
            trace_id: rejected.trace_id,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Clonable wrapper so one failure can be replayed to every caller attached
/// to a deduplicated fetch.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SharedApiError(Arc<ApiError>);

impl SharedApiError {
    pub fn inner(&self) -> &ApiError {
        &self.0
    }
}

impl From<ApiError> for SharedApiError {
    fn from(error: ApiError) -> Self {
        Self(Arc::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_envelope_maps_to_api_error() {
        let rejected = RejectedEnvelope {
            message: "no such record".to_string(),
            trace_id: Some("t-9".to_string()),
        };
        match ApiError::from(rejected) {
            ApiError::Api { message, trace_id } => {
                assert_eq!(message, "no such record");
                assert_eq!(trace_id.as_deref(), Some("t-9"));
            }
            other => panic!("expected Api variant, got {other:?}"),
        }
    }

    #[test]
    fn shared_error_clones_and_displays() {
        let shared = SharedApiError::from(ApiError::Unauthorized);
        let copy = shared.clone();
        assert!(matches!(copy.inner(), ApiError::Unauthorized));
        assert_eq!(shared.to_string(), copy.to_string());
    }
}
