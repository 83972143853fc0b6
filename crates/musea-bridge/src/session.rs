//! The per-viewer session state machine
//!
//! A [`ViewerSession`] owns one embedded viewer from page load to teardown.
//! Data can only flow once the viewer is ready, readiness is established
//! either by an explicit `WEBVIEW_READY` message or by a timer after the
//! page reports loaded, and every artifact batch is delivered over both
//! channels with bounded retries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use musea_catalog::{Artifact, dedup_by_model};
use tokio::sync::{Mutex, broadcast};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::message::{BridgeMessage, MessageKind};
use crate::transport::ViewerChannel;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Where the session is in its lifecycle. `Errored` is terminal until
/// [`ViewerSession::reload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Page content still loading.
    Loading,
    /// Content loaded, waiting for the viewer to signal readiness.
    WaitingReady,
    /// Viewer can receive data.
    Ready,
    /// An artifact batch went out, awaiting confirmation.
    DataSent,
    /// Viewer confirmed receipt.
    Confirmed,
    /// Delivery exhausted its retries or the viewer reported a fault.
    Errored,
}

impl SessionState {
    fn can_send(self) -> bool {
        matches!(self, Self::Ready | Self::DataSent | Self::Confirmed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loading => "loading",
            Self::WaitingReady => "waiting-ready",
            Self::Ready => "ready",
            Self::DataSent => "data-sent",
            Self::Confirmed => "confirmed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Timing and retry knobs. The defaults match what museum-floor hardware
/// tolerates: a one second readiness grace, three send attempts two seconds
/// apart, and the script-injection fallback one second behind each post.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub ready_delay: Duration,
    pub max_send_attempts: u32,
    pub retry_backoff: Duration,
    pub fallback_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ready_delay: Duration::from_secs(1),
            max_send_attempts: 3,
            retry_backoff: Duration::from_secs(2),
            fallback_delay: Duration::from_secs(1),
        }
    }
}

/// What the host UI reacts to.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    StateChanged(SessionState),
    DataSent { count: usize },
    DataConfirmed,
    ViewerError { message: String },
    ArInitialized,
    ModelLoaded { name: Option<String> },
    TargetFound,
    TargetLost,
}

struct SessionInner<C> {
    channel: C,
    config: BridgeConfig,
    state: Mutex<SessionState>,
    last_payload: Mutex<Option<BridgeMessage>>,
    events: broadcast::Sender<BridgeEvent>,
}

/// Clonable handle on one viewer session; clones share state.
pub struct ViewerSession<C> {
    inner: Arc<SessionInner<C>>,
}

impl<C> Clone for ViewerSession<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: ViewerChannel> ViewerSession<C> {
    pub fn new(channel: C, config: BridgeConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                channel,
                config,
                state: Mutex::new(SessionState::Loading),
                last_payload: Mutex::new(None),
                events,
            }),
        }
    }

    pub async fn state(&self) -> SessionState {
        *self.inner.state.lock().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.inner.events.subscribe()
    }

    /// The page finished loading. Arms the readiness timer so a viewer that
    /// never sends `WEBVIEW_READY` still unlocks after the grace period, and
    /// follows up with a ping probe.
    pub async fn content_loaded(&self) {
        {
            let mut state = self.inner.state.lock().await;
            if *state != SessionState::Loading {
                debug!(state = %*state, "content_loaded ignored outside of loading");
                return;
            }
            *state = SessionState::WaitingReady;
        }
        self.emit(BridgeEvent::StateChanged(SessionState::WaitingReady));
        let session = self.clone();
        tokio::spawn(async move {
            sleep(session.inner.config.ready_delay).await;
            session.unlock_ready("readiness timer").await;
            match BridgeMessage::ping().to_json() {
                Ok(raw) => {
                    if let Err(err) = session.inner.channel.post_message(&raw).await {
                        debug!(%err, "ping probe failed");
                    }
                }
                Err(err) => warn!(%err, "ping serialization failed"),
            }
        });
    }

    async fn unlock_ready(&self, source: &str) {
        {
            let mut state = self.inner.state.lock().await;
            if !matches!(*state, SessionState::Loading | SessionState::WaitingReady) {
                return;
            }
            *state = SessionState::Ready;
        }
        debug!(source, "viewer ready");
        self.emit(BridgeEvent::StateChanged(SessionState::Ready));
    }

    /// Feed one raw message from the viewer into the session. Malformed
    /// payloads are logged and dropped, never fatal.
    pub async fn handle_raw(&self, raw: &str) {
        match BridgeMessage::parse(raw) {
            Ok(message) => self.handle_message(message).await,
            Err(err) => warn!(%err, "malformed bridge message ignored"),
        }
    }

    pub async fn handle_message(&self, message: BridgeMessage) {
        match message.kind {
            MessageKind::WebviewReady => self.unlock_ready("ready message").await,
            MessageKind::DataReceived => {
                let confirmed = {
                    let mut state = self.inner.state.lock().await;
                    if *state == SessionState::DataSent {
                        *state = SessionState::Confirmed;
                        true
                    } else {
                        false
                    }
                };
                if confirmed {
                    self.emit(BridgeEvent::StateChanged(SessionState::Confirmed));
                    self.emit(BridgeEvent::DataConfirmed);
                } else {
                    debug!("receipt confirmation with no outstanding send");
                }
            }
            MessageKind::RequestData => {
                let payload = self.inner.last_payload.lock().await.clone();
                match payload {
                    Some(message) => {
                        let session = self.clone();
                        tokio::spawn(async move {
                            if let Err(err) = session.deliver_with_retry(&message).await {
                                warn!(%err, "re-send after data request failed");
                            }
                        });
                    }
                    None => debug!("viewer requested data before any was sent"),
                }
            }
            MessageKind::Error => {
                let text = message
                    .error_text()
                    .unwrap_or("viewer reported an unspecified error")
                    .to_string();
                warn!(error = %text, "viewer error");
                self.transition(SessionState::Errored).await;
                self.emit(BridgeEvent::ViewerError { message: text });
            }
            MessageKind::ArInitialized => self.emit(BridgeEvent::ArInitialized),
            MessageKind::ModelLoaded => {
                let name = message
                    .data
                    .as_ref()
                    .and_then(|data| data.get("name"))
                    .and_then(|name| name.as_str())
                    .map(str::to_string);
                self.emit(BridgeEvent::ModelLoaded { name });
            }
            MessageKind::TargetFound => self.emit(BridgeEvent::TargetFound),
            MessageKind::TargetLost => self.emit(BridgeEvent::TargetLost),
            MessageKind::Ping => debug!("ping echoed back"),
            MessageKind::ArtifactData | MessageKind::LoadModel | MessageKind::ResetView => {
                warn!(kind = ?message.kind, "host-bound message received from viewer; ignoring")
            }
            MessageKind::Unknown => debug!("unknown bridge message type ignored"),
        }
    }

    /// Send an artifact batch. Duplicate previews are dropped first; the
    /// surviving batch is delivered with retries and kept for re-sends.
    /// Returns how many artifacts went out.
    #[instrument(skip_all, fields(total = artifacts.len()))]
    pub async fn send_artifacts(
        &self,
        artifacts: &[Artifact],
        target_url: Option<String>,
    ) -> BridgeResult<usize> {
        {
            let state = *self.inner.state.lock().await;
            if !state.can_send() {
                return Err(BridgeError::NotReady { state });
            }
        }
        let kept = dedup_by_model(artifacts);
        if kept.is_empty() {
            return Err(BridgeError::NothingToSend);
        }
        let message = BridgeMessage::artifact_data(&kept, target_url)?;
        self.deliver_with_retry(&message).await?;
        *self.inner.last_payload.lock().await = Some(message);
        self.transition(SessionState::DataSent).await;
        self.emit(BridgeEvent::DataSent { count: kept.len() });
        Ok(kept.len())
    }

    /// Ask the viewer to switch models. Requires readiness; no retry, the
    /// host can simply repeat the gesture.
    pub async fn load_model(&self, model_id: &str) -> BridgeResult<()> {
        self.send_command(BridgeMessage::load_model(model_id)).await
    }

    /// Restore the viewer's default camera.
    pub async fn reset_view(&self) -> BridgeResult<()> {
        self.send_command(BridgeMessage::reset_view()).await
    }

    async fn send_command(&self, message: BridgeMessage) -> BridgeResult<()> {
        let state = *self.inner.state.lock().await;
        if !state.can_send() {
            return Err(BridgeError::NotReady { state });
        }
        let raw = message.to_json()?;
        self.inner.channel.post_message(&raw).await?;
        Ok(())
    }

    /// The only way out of `Errored`: drop the payload and start the
    /// lifecycle over. The host reloads the page and calls
    /// [`Self::content_loaded`] again.
    pub async fn reload(&self) {
        {
            let mut state = self.inner.state.lock().await;
            *state = SessionState::Loading;
        }
        *self.inner.last_payload.lock().await = None;
        self.emit(BridgeEvent::StateChanged(SessionState::Loading));
    }

    async fn deliver_with_retry(&self, message: &BridgeMessage) -> BridgeResult<()> {
        let raw = message.to_json()?;
        let max = self.inner.config.max_send_attempts;
        let mut attempt = 1;
        loop {
            match self.deliver_once(&raw).await {
                Ok(()) => {
                    if attempt > 1 {
                        debug!(attempt, "delivery succeeded after retry");
                    }
                    return Ok(());
                }
                Err(err) => {
                    warn!(attempt, max, %err, "bridge delivery failed");
                    if attempt >= max {
                        self.transition(SessionState::Errored).await;
                        return Err(BridgeError::SendFailed { attempts: attempt });
                    }
                    sleep(self.inner.config.retry_backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One delivery: post immediately, then schedule the script-injection
    /// fallback so a viewer whose listener is not wired up yet still gets
    /// the payload.
    async fn deliver_once(&self, raw: &str) -> Result<(), crate::error::ChannelError> {
        self.inner.channel.post_message(raw).await?;
        let session = self.clone();
        let script = injection_script(raw);
        tokio::spawn(async move {
            sleep(session.inner.config.fallback_delay).await;
            if let Err(err) = session.inner.channel.inject_script(&script).await {
                debug!(%err, "fallback injection failed");
            }
        });
        Ok(())
    }

    async fn transition(&self, next: SessionState) {
        let changed = {
            let mut state = self.inner.state.lock().await;
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        };
        if changed {
            self.emit(BridgeEvent::StateChanged(next));
        }
    }

    fn emit(&self, event: BridgeEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

fn injection_script(payload_json: &str) -> String {
    format!(
        "try {{ if (window.receiveArtifactData) {{ window.receiveArtifactData({payload_json}); }} }} catch (e) {{}} true;"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ready_states_can_send() {
        assert!(!SessionState::Loading.can_send());
        assert!(!SessionState::WaitingReady.can_send());
        assert!(!SessionState::Errored.can_send());
        assert!(SessionState::Ready.can_send());
        assert!(SessionState::DataSent.can_send());
        assert!(SessionState::Confirmed.can_send());
    }

    #[test]
    fn injection_script_guards_the_receiver_hook() {
        let script = injection_script(r#"{"type":"PING"}"#);
        assert!(script.contains("window.receiveArtifactData"));
        assert!(script.starts_with("try {"));
    }
}
