//! # Musea API
//!
//! Remote data client for the heritage catalog backend.
//!
//! - [`ApiClient`]: generic request executor. Every call goes against the
//!   configured base URL, carries `Content-Type: application/json`, attaches
//!   the session's bearer token when one is present, and emits one diagnostic
//!   log record. Responses are unwrapped from the standard envelope; an
//!   envelope with `success: false` surfaces as [`ApiError::Api`], never as a
//!   payload.
//! - [`Session`]: in-memory bearer token state. Login happens once via
//!   [`ApiClient::authenticate`] (OAuth password grant); there is no refresh
//!   and nothing is persisted. A 401 maps to [`ApiError::Unauthorized`] and
//!   is the caller's problem — the client never tears the session down.
//! - [`CatalogApi`]: the trait seam between the HTTP client and the cached
//!   store, so the store can be exercised without a network.
//! - [`CatalogStore`]: the cached facade screens actually use, wiring the
//!   client into `musea-cache` with the `Artifact` / `TargetBundle` tags.

pub mod auth;
pub mod client;
pub mod error;
pub mod session;
pub mod store;

pub use auth::Credentials;
pub use client::{ApiClient, ApiConfig, CatalogApi};
pub use error::{ApiError, ApiResult, SharedApiError};
pub use session::{AuthToken, Session};
pub use store::{CatalogStore, tags};
