//! The wire format both sides of the bridge speak
//!
//! Every message is a single JSON object with a `type` discriminator in
//! SCREAMING_SNAKE_CASE and an optional free-form `data` payload. The host
//! sends `ARTIFACT_DATA`, `PING`, `LOAD_MODEL` and `RESET_VIEW`; everything
//! else flows viewer-to-host.

use chrono::Utc;
use musea_catalog::Artifact;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Message discriminator. Types this build does not know parse as
/// [`MessageKind::Unknown`] rather than failing, so a newer viewer never
/// breaks an older host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    // host -> viewer
    ArtifactData,
    Ping,
    LoadModel,
    ResetView,
    // viewer -> host
    WebviewReady,
    DataReceived,
    RequestData,
    ArInitialized,
    ModelLoaded,
    TargetFound,
    TargetLost,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// URL of the AR target bundle, carried alongside artifact payloads.
    #[serde(rename = "fileMindUrl", skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    /// Milliseconds since the epoch, stamped on host-originated messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl BridgeMessage {
    fn stamped(kind: MessageKind, data: Option<Value>) -> Self {
        Self {
            kind,
            data,
            target_url: None,
            timestamp: Some(Utc::now().timestamp_millis()),
        }
    }

    /// The artifact batch handed to the viewer for rendering.
    pub fn artifact_data(
        artifacts: &[Artifact],
        target_url: Option<String>,
    ) -> Result<Self, serde_json::Error> {
        let mut message = Self::stamped(
            MessageKind::ArtifactData,
            Some(serde_json::to_value(artifacts)?),
        );
        message.target_url = target_url;
        Ok(message)
    }

    /// Liveness probe; the viewer ignores it if it is not listening yet.
    pub fn ping() -> Self {
        Self::stamped(MessageKind::Ping, None)
    }

    /// Ask the viewer to switch to a specific model.
    pub fn load_model(model_id: &str) -> Self {
        Self::stamped(MessageKind::LoadModel, Some(json!({ "modelId": model_id })))
    }

    /// Ask the viewer to restore its default camera.
    pub fn reset_view() -> Self {
        Self::stamped(MessageKind::ResetView, None)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Human-readable text of an `ERROR` message, if the payload carries one.
    pub fn error_text(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| {
            data.get("message")
                .and_then(Value::as_str)
                .or_else(|| data.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_use_the_screaming_snake_wire_names() {
        let raw = serde_json::to_string(&MessageKind::WebviewReady).unwrap();
        assert_eq!(raw, "\"WEBVIEW_READY\"");
        let raw = serde_json::to_string(&MessageKind::ArInitialized).unwrap();
        assert_eq!(raw, "\"AR_INITIALIZED\"");
    }

    #[test]
    fn unknown_types_parse_instead_of_failing() {
        let message = BridgeMessage::parse(r#"{"type":"SOMETHING_NEW","data":{"x":1}}"#).unwrap();
        assert_eq!(message.kind, MessageKind::Unknown);
    }

    #[test]
    fn artifact_data_carries_the_target_url() {
        let message =
            BridgeMessage::artifact_data(&[], Some("https://cdn.test/site.mind".to_string()))
                .unwrap();
        let raw = message.to_json().unwrap();
        assert!(raw.contains("\"type\":\"ARTIFACT_DATA\""));
        assert!(raw.contains("\"fileMindUrl\":\"https://cdn.test/site.mind\""));
        assert!(message.timestamp.is_some());
    }

    #[test]
    fn error_text_reads_the_message_field() {
        let message = BridgeMessage::parse(
            r#"{"type":"ERROR","data":{"message":"model failed to load"}}"#,
        )
        .unwrap();
        assert_eq!(message.error_text(), Some("model failed to load"));

        let bare = BridgeMessage::parse(r#"{"type":"ERROR","data":"out of memory"}"#).unwrap();
        assert_eq!(bare.error_text(), Some("out of memory"));
    }
}
