//! The HTTP request executor and typed endpoints

use std::time::Duration;

use async_trait::async_trait;
use musea_catalog::{Artifact, Envelope, FilterRequest, TargetFile};
use reqwest::RequestBuilder;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::auth::Credentials;
use crate::error::{ApiError, ApiResult};
use crate::session::{AuthToken, Session};

mod endpoints {
    pub const ARTIFACT_LIST: &str = "HienVat3D/GetHienVat3DList";
    pub const ARTIFACT_BY_ID: &str = "HienVat3D/GetHienVat3DById";
    pub const ARTIFACT_FILTER: &str = "HienVat3D/GetData/FilterByHienVat";
    pub const TARGET_FILE_LIST: &str = "FileAR/GetFileARList";
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL all catalog endpoints hang off.
    pub base_url: String,
    /// Absolute URL of the token exchange endpoint.
    pub token_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_url: token_url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// The catalog endpoints, abstracted so the cached store (and its tests) can
/// run against something other than a live backend.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_artifacts(&self) -> ApiResult<Vec<Artifact>>;
    async fn artifact_by_id(&self, id: &str) -> ApiResult<Artifact>;
    async fn filter_artifacts(&self, request: &FilterRequest) -> ApiResult<Vec<Artifact>>;
    async fn list_target_files(&self) -> ApiResult<Vec<TargetFile>>;
}

/// Authenticated HTTP client for the catalog backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    session: Session,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: Session) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// One-shot password-grant token exchange. The token lands in the
    /// session so subsequent calls carry it.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, credentials: &Credentials) -> ApiResult<AuthToken> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&credentials.form_params())
            .send()
            .await?;
        let status = response.status();
        debug!(status = status.as_u16(), "token exchange");
        if !status.is_success() {
            let message = response
                .json::<TokenErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("token exchange failed with status {status}"));
            warn!(status = status.as_u16(), "token exchange rejected");
            return Err(ApiError::Api {
                message,
                trace_id: None,
            });
        }
        let token: AuthToken = response.json().await?;
        self.session.set(token.clone()).await;
        Ok(token)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.http.get(self.url(path));
        self.execute(request, "GET", path).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.post(self.url(path)).json(body);
        self.execute(request, "POST", path).await
    }

    /// Run one request: bearer header, envelope unwrap, per-call diagnostic.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: &str,
        path: &str,
    ) -> ApiResult<T> {
        let mut request = request.header(CONTENT_TYPE, "application/json");
        if let Some(bearer) = self.session.bearer().await {
            request = request.bearer_auth(bearer);
        }
        let response = request.send().await?;
        let status = response.status();
        debug!(method, path, status = status.as_u16(), "api call");
        if status.as_u16() == 401 {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }
        let envelope: Envelope<T> = response.json().await?;
        envelope.into_result().map_err(ApiError::from)
    }
}

#[async_trait]
impl CatalogApi for ApiClient {
    async fn list_artifacts(&self) -> ApiResult<Vec<Artifact>> {
        self.get_json(endpoints::ARTIFACT_LIST).await
    }

    async fn artifact_by_id(&self, id: &str) -> ApiResult<Artifact> {
        self.get_json(&format!("{}/{id}", endpoints::ARTIFACT_BY_ID))
            .await
    }

    async fn filter_artifacts(&self, request: &FilterRequest) -> ApiResult<Vec<Artifact>> {
        self.post_json(endpoints::ARTIFACT_FILTER, request).await
    }

    async fn list_target_files(&self) -> ApiResult<Vec<TargetFile>> {
        self.get_json(endpoints::TARGET_FILE_LIST).await
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining_tolerates_slashes() {
        let client = ApiClient::new(
            ApiConfig::new("https://api.test/v5/", "https://sso.test/connect/token"),
            Session::new(),
        )
        .unwrap();
        assert_eq!(
            client.url("/HienVat3D/GetHienVat3DList"),
            "https://api.test/v5/HienVat3D/GetHienVat3DList"
        );
        assert_eq!(
            client.url("HienVat3D/GetHienVat3DList"),
            "https://api.test/v5/HienVat3D/GetHienVat3DList"
        );
    }
}
