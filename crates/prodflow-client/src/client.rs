use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::model::{Credentials, Resource, ResourceKind, TokenResponse, Validate};

/// API version prefix for resource and auth endpoints.
const VERSION_SEGMENT: &str = "v1";

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// HTTP client for the ProdFlow admin API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LogListing {
    Listing { logs: Vec<String> },
    // The server answers `[]` when it has no log directory at all.
    Bare(Vec<String>),
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        Self::with_config(base_url, token, ClientConfig::default())
    }

    pub fn with_config(base_url: &str, token: Option<String>, config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "{base_url} is not an http(s) base URL"
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns a client sharing this one's connection pool but carrying `token`.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let req = self.http.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(error = %e, "request failed before a response arrived");
            ClientError::from(e)
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let err = ClientError::from_response(status, &body);
        tracing::warn!(status = status.as_u16(), error = %err, "API returned an error");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let resp = self.send(req).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Exchanges a username and password for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let creds = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        creds.validate()?;

        // Trailing empty segment keeps the `/v1/auth/` slash the server routes on.
        let url = self.endpoint(&[VERSION_SEGMENT, "auth", ""]);
        tracing::debug!(%url, username, "requesting access token");
        let req = self.http.post(url).form(&creds);
        self.send_json(req).await
    }

    pub async fn list<R: Resource>(&self) -> Result<Vec<R>> {
        let url = self.endpoint(&[VERSION_SEGMENT, R::KIND.path_segment()]);
        tracing::debug!(kind = %R::KIND, %url, "fetching collection");
        let items: Vec<R> = self.send_json(self.request(Method::GET, url)).await?;
        tracing::debug!(kind = %R::KIND, count = items.len(), "fetched collection");
        Ok(items)
    }

    /// One record by id, read straight from the server.
    pub async fn get<R: Resource>(&self, id: Uuid) -> Result<R> {
        let id = id.to_string();
        let url = self.endpoint(&[VERSION_SEGMENT, R::KIND.path_segment(), &id]);
        tracing::debug!(kind = %R::KIND, %id, "fetching {}", R::KIND.singular());
        self.send_json(self.request(Method::GET, url)).await
    }

    /// Records of `R` whose name matches `query`, filtered server-side.
    ///
    /// Results are not cached; the cache only ever holds whole collections.
    pub async fn search<R: Resource>(&self, query: &str) -> Result<Vec<R>> {
        let mut url = self.endpoint(&[VERSION_SEGMENT, R::KIND.path_segment()]);
        url.query_pairs_mut().append_pair(R::KIND.search_param(), query);
        tracing::debug!(kind = %R::KIND, query, "searching collection");
        self.send_json(self.request(Method::GET, url)).await
    }

    pub async fn create<R: Resource>(&self, payload: &R::Create) -> Result<R> {
        payload.validate()?;
        let url = self.endpoint(&[VERSION_SEGMENT, R::KIND.path_segment()]);
        tracing::debug!(kind = %R::KIND, "creating {}", R::KIND.singular());
        self.send_json(self.request(Method::POST, url).json(payload))
            .await
    }

    pub async fn update<R: Resource>(&self, id: Uuid, payload: &R::Update) -> Result<R> {
        payload.validate()?;
        let id = id.to_string();
        let url = self.endpoint(&[VERSION_SEGMENT, R::KIND.path_segment(), &id]);
        tracing::debug!(kind = %R::KIND, %id, "updating {}", R::KIND.singular());
        self.send_json(self.request(Method::PATCH, url).json(payload))
            .await
    }

    pub async fn delete<R: Resource>(&self, id: Uuid) -> Result<()> {
        self.delete_kind(R::KIND, id).await
    }

    pub async fn delete_kind(&self, kind: ResourceKind, id: Uuid) -> Result<()> {
        let id = id.to_string();
        let url = self.endpoint(&[VERSION_SEGMENT, kind.path_segment(), &id]);
        tracing::debug!(%kind, %id, "deleting {}", kind.singular());
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    /// Permission identifiers the server knows about.
    pub async fn permissions(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&[VERSION_SEGMENT, "roles", "permissions"]);
        self.send_json(self.request(Method::GET, url)).await
    }

    /// Names of the log files the server exposes.
    pub async fn list_logs(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["logs"]);
        let listing: LogListing = self.send_json(self.request(Method::GET, url)).await?;
        Ok(match listing {
            LogListing::Listing { logs } | LogListing::Bare(logs) => logs,
        })
    }

    /// Raw contents of one log file.
    pub async fn log_file(&self, filename: &str) -> Result<Vec<u8>> {
        let url = self.endpoint(&["logs", filename]);
        tracing::debug!(%url, "downloading log file");
        let resp = self.send(self.request(Method::GET, url)).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    /// Liveness probe against the server root.
    pub async fn ping(&self) -> Result<(u16, String)> {
        let resp = self.http.get(self.base_url.clone()).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok((status, body))
    }
}
