//! Delivery channels into the embedded viewer

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::ChannelError;

/// The two delivery paths an embedded viewer exposes. `post_message` is the
/// structured channel; `inject_script` evaluates JavaScript inside the
/// viewer and exists because the structured channel can drop messages while
/// the page is still wiring up its listener.
#[async_trait]
pub trait ViewerChannel: Send + Sync + 'static {
    async fn post_message(&self, raw: &str) -> Result<(), ChannelError>;
    async fn inject_script(&self, script: &str) -> Result<(), ChannelError>;
}

#[async_trait]
impl<C: ViewerChannel> ViewerChannel for std::sync::Arc<C> {
    async fn post_message(&self, raw: &str) -> Result<(), ChannelError> {
        (**self).post_message(raw).await
    }

    async fn inject_script(&self, script: &str) -> Result<(), ChannelError> {
        (**self).inject_script(script).await
    }
}

/// Recording channel for tests and loopback wiring. Delivery failures can be
/// injected per call.
#[derive(Default)]
pub struct InMemoryChannel {
    posts: Mutex<Vec<String>>,
    injections: Mutex<Vec<String>>,
    failing_posts: AtomicUsize,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` `post_message` calls fail.
    pub fn fail_next_posts(&self, n: usize) {
        self.failing_posts.store(n, Ordering::SeqCst);
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn injections(&self) -> Vec<String> {
        self.injections.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ViewerChannel for InMemoryChannel {
    async fn post_message(&self, raw: &str) -> Result<(), ChannelError> {
        let remaining = self.failing_posts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_posts.store(remaining - 1, Ordering::SeqCst);
            return Err(ChannelError::Transport("injected post failure".to_string()));
        }
        self.posts
            .lock()
            .map_err(|_| ChannelError::Closed)?
            .push(raw.to_string());
        Ok(())
    }

    async fn inject_script(&self, script: &str) -> Result<(), ChannelError> {
        self.injections
            .lock()
            .map_err(|_| ChannelError::Closed)?
            .push(script.to_string());
        Ok(())
    }
}
