use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{BoxId, PatioId, PatioStatus, ZoneId},
    error::{ApiErrorBody, ApiException},
    protocol::{
        BoxRequest, CompletePatioRequest, ParkingBox, Patio, PatioRequest, Zone, ZoneRequest,
    },
};
use tracing::debug;
use url::Url;

pub mod cache;
pub mod cep;
pub mod editor;
pub mod error;
pub mod reconcile;
pub mod services;
pub mod streams;
pub mod wizard;

pub use cache::{Snapshot, TimedSnapshot, DEFAULT_CACHE_TTL};
pub use editor::{create_patio, created_message, EditOutcome, PatioEditor, PatioSnapshot, SubmitError};
pub use error::{ClientError, ClientResult, FieldErrors};
pub use reconcile::{SyncError, SyncKind, SyncReport};
pub use streams::{EventSubscription, ReportStream};
pub use wizard::{validate_step, BoxDraft, InvalidStep, Wizard, WizardData, WizardStep, ZoneDraft};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_CEP_BASE_URL: &str = "https://viacep.com.br/ws";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub cep_base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            cep_base_url: DEFAULT_CEP_BASE_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Trims whitespace and trailing slashes and requires an http(s) scheme.
pub fn normalize_base_url(raw: &str) -> ClientResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::InvalidConfig("base url must not be empty".into()));
    }
    let parsed = Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::InvalidConfig(format!(
            "base url must start with http:// or https://: {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Backend operations the wizard submitter and the reconciliation loop depend on.
#[async_trait]
pub trait YardBackend: Send + Sync {
    async fn fetch_patio(&self, patio_id: PatioId) -> ClientResult<Patio>;
    async fn update_patio(&self, patio_id: PatioId, request: &PatioRequest)
        -> ClientResult<Patio>;
    async fn create_complete_patio(&self, request: &CompletePatioRequest) -> ClientResult<Patio>;
    async fn list_patio_boxes(
        &self,
        patio_id: PatioId,
        patio_status: PatioStatus,
    ) -> ClientResult<Vec<ParkingBox>>;
    async fn create_box(&self, request: &BoxRequest) -> ClientResult<ParkingBox>;
    async fn update_box(&self, box_id: BoxId, request: &BoxRequest) -> ClientResult<ParkingBox>;
    async fn delete_box(&self, box_id: BoxId) -> ClientResult<()>;
    async fn list_patio_zones(
        &self,
        patio_id: PatioId,
        patio_status: PatioStatus,
    ) -> ClientResult<Vec<Zone>>;
    async fn create_zone(&self, request: &ZoneRequest) -> ClientResult<Zone>;
    async fn update_zone(&self, zone_id: ZoneId, request: &ZoneRequest) -> ClientResult<Zone>;
    async fn delete_patio_zone(
        &self,
        patio_id: PatioId,
        patio_status: PatioStatus,
        zone_id: ZoneId,
    ) -> ClientResult<()>;
}

/// Shared HTTP client for the yard REST backend. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    // SSE connections stay open until dropped, so only connecting is bounded.
    stream_http: Client,
    base_url: String,
    cep_base_url: String,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let base_url = normalize_base_url(&config.base_url)?;
        let cep_base_url = normalize_base_url(&config.cep_base_url)?;
        if config.timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }
        let http = Client::builder().timeout(config.timeout).build()?;
        let stream_http = Client::builder().connect_timeout(config.timeout).build()?;
        Ok(Self {
            http,
            stream_http,
            base_url,
            cep_base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn stream_http(&self) -> &Client {
        &self.stream_http
    }

    pub(crate) fn cep_endpoint(&self, digits: &str) -> String {
        format!("{}/{digits}/json/", self.cep_base_url)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.endpoint(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.endpoint(path))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.http.put(self.endpoint(path))
    }

    pub(crate) fn patch(&self, path: &str) -> RequestBuilder {
        self.http.patch(self.endpoint(path))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.http.delete(self.endpoint(path))
    }

    pub(crate) async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = execute(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Like [`ApiClient::fetch`] but treats `204 No Content` or an empty body as `None`.
    pub(crate) async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ClientResult<Option<T>> {
        let response = execute(request).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub(crate) async fn fetch_text(&self, request: RequestBuilder) -> ClientResult<String> {
        let response = execute(request).await?;
        Ok(response.text().await?)
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> ClientResult<()> {
        execute(request).await?;
        Ok(())
    }
}

async fn execute(request: RequestBuilder) -> ClientResult<Response> {
    let response = request.send().await?;
    ensure_success(response).await
}

/// Turns a non-2xx response into an [`ApiException`], keeping the backend error body.
pub(crate) async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let fallback = format!(
        "Erro na API: {} - {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );
    let url = response.url().to_string();
    let bytes = response.bytes().await.unwrap_or_default();
    let body = serde_json::from_slice::<ApiErrorBody>(&bytes).unwrap_or_default();
    debug!(status = status.as_u16(), url = %url, "api: request rejected");
    Err(ApiException::from_response(status.as_u16(), body, fallback).into())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
