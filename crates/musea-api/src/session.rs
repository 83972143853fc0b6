//! In-memory authentication session state

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Token returned by the password-grant exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub scope: String,
}

/// Bearer token holder shared by every client clone.
///
/// Lives for the process; never persisted. Cheap to clone, clones share
/// state.
#[derive(Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<AuthToken>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, token: AuthToken) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    /// The raw bearer value to put in the Authorization header, if any.
    pub async fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> AuthToken {
        AuthToken {
            access_token: "abc123".to_string(),
            expires_in: 3600,
            token_type: "Bearer".to_string(),
            scope: "password".to_string(),
        }
    }

    #[tokio::test]
    async fn session_shares_state_across_clones() {
        let session = Session::new();
        let other = session.clone();
        assert!(!other.is_authenticated().await);

        session.set(token()).await;
        assert_eq!(other.bearer().await.as_deref(), Some("abc123"));

        other.clear().await;
        assert!(session.bearer().await.is_none());
    }
}
