//! The standard API response envelope

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wrapper the upstream API puts around every payload.
///
/// A payload must never be read without checking `success` first: the API can
/// return `success: false` with a zero-value `data`, and treating that as a
/// result would surface phantom empty lists to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,
    /// Rejections arrive with `data: null` (or no `data` at all), so the
    /// payload must decode independently of `success`.
    #[serde(default)]
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "totalRecord", default)]
    pub total_record: i64,
    #[serde(rename = "correlationId", default)]
    pub correlation_id: Option<String>,
    #[serde(rename = "traceId", default)]
    pub trace_id: Option<String>,
}

/// An envelope with `success: false`, carried as an error.
#[derive(Debug, Clone, Error)]
#[error("api rejected request: {message}")]
pub struct RejectedEnvelope {
    /// The `error` field, falling back to `message` when blank.
    pub message: String,
    pub trace_id: Option<String>,
}

impl<T> Envelope<T> {
    /// Normalize the envelope: the payload on success, the surfaced error
    /// otherwise.
    pub fn into_result(self) -> Result<T, RejectedEnvelope> {
        if self.success {
            return self.data.ok_or(RejectedEnvelope {
                message: "successful response carried no payload".to_string(),
                trace_id: self.trace_id,
            });
        }
        let message = match self.error {
            Some(e) if !e.trim().is_empty() => e,
            _ if !self.message.trim().is_empty() => self.message,
            _ => "request failed".to_string(),
        };
        Err(RejectedEnvelope {
            message,
            trace_id: self.trace_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_yields_payload() {
        let env: Envelope<Vec<u32>> = serde_json::from_value(serde_json::json!({
            "success": true,
            "data": [1, 2],
            "error": null,
            "message": "",
            "totalRecord": 2,
            "traceId": "t-1"
        }))
        .unwrap();
        assert_eq!(env.into_result().unwrap(), vec![1, 2]);
    }

    #[test]
    fn failure_never_yields_payload() {
        let env: Envelope<Vec<u32>> = serde_json::from_value(serde_json::json!({
            "success": false,
            "data": [],
            "error": "no such record",
            "message": "not found",
            "traceId": "t-2"
        }))
        .unwrap();
        let err = env.into_result().unwrap_err();
        assert_eq!(err.message, "no such record");
        assert_eq!(err.trace_id.as_deref(), Some("t-2"));
    }

    #[test]
    fn rejection_with_null_data_still_decodes() {
        let env: Envelope<Vec<u32>> = serde_json::from_value(serde_json::json!({
            "success": false,
            "data": null,
            "error": "no such record",
            "traceId": "t-3"
        }))
        .unwrap();
        let err = env.into_result().unwrap_err();
        assert_eq!(err.message, "no such record");
        assert_eq!(err.trace_id.as_deref(), Some("t-3"));
    }

    #[test]
    fn rejection_without_a_data_field_still_decodes() {
        let env: Envelope<Vec<u32>> = serde_json::from_value(serde_json::json!({
            "success": false,
            "error": "backend unavailable"
        }))
        .unwrap();
        assert_eq!(env.into_result().unwrap_err().message, "backend unavailable");
    }

    #[test]
    fn success_without_payload_is_surfaced_as_a_rejection() {
        let env: Envelope<Vec<u32>> = serde_json::from_value(serde_json::json!({
            "success": true,
            "data": null,
            "error": null
        }))
        .unwrap();
        assert!(env.into_result().is_err());
    }

    #[test]
    fn failure_falls_back_to_message() {
        let env: Envelope<()> = serde_json::from_value(serde_json::json!({
            "success": false,
            "data": null,
            "error": "",
            "message": "backend unavailable"
        }))
        .unwrap();
        assert_eq!(env.into_result().unwrap_err().message, "backend unavailable");
    }
}
