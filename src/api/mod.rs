// src/api/mod.rs — Shared HTTP gateway to the Nekota backend
//
// One gateway per process. It owns the bearer token (written only by the
// session store), attaches it to every request, and maps HTTP failures
// onto `NekotaError` kinds. Resource groups below are thin, stateless
// views over the request primitives.

pub mod admin;
pub mod alarm;
pub mod auth;
pub mod device;
pub mod friend;
pub mod memory;
pub mod payment;
pub mod types;
pub mod user;
pub mod voice;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{RwLock, Weak};
use std::time::{Duration, Instant};

use crate::infra::config::ApiConfig;
use crate::infra::errors::NekotaError;
pub use types::UploadFile;

/// Notified when a request that carried the active token comes back 401.
#[async_trait]
pub trait UnauthorizedHandler: Send + Sync {
    /// `rejected_token` is the token the failing request carried.
    async fn on_unauthorized(&self, rejected_token: &str);
}

pub struct ApiGateway {
    base_url: String,
    http: reqwest::Client,
    token: RwLock<Option<String>>,
    unauthorized: RwLock<Option<Weak<dyn UnauthorizedHandler>>>,
}

impl ApiGateway {
    /// Build a gateway for `base_url`, e.g. `https://api.nekota.app`.
    pub fn new(base_url: &str) -> Result<Self, NekotaError> {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, NekotaError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NekotaError::Config(format!("HTTP client: {e}")))?;
        Self::with_http_client(&config.base_url, http)
    }

    /// Use a custom HTTP client (connection pool reuse or testing).
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Result<Self, NekotaError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| NekotaError::Config(format!("invalid API base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NekotaError::Config(format!(
                "API base URL must be http(s), got '{base_url}'"
            )));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            token: RwLock::new(None),
            unauthorized: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Token ──────────────────────────────────────────────────────────────

    /// Replace the token used by subsequent requests. In-flight requests
    /// keep the header they were built with.
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Register the single 401 interceptor. Held weakly so the session
    /// store and the gateway do not keep each other alive.
    pub fn set_unauthorized_handler(&self, handler: Weak<dyn UnauthorizedHandler>) {
        let mut guard = self
            .unauthorized
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *guard = Some(handler);
    }

    // ─── Request primitives ─────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, NekotaError> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, NekotaError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, NekotaError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, NekotaError> {
        self.request::<(), T>(Method::DELETE, path, None).await
    }

    /// Multipart upload for binary payloads. The transport picks the
    /// Content-Type so the boundary is set correctly.
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file: UploadFile,
        extra_fields: &[(&str, String)],
    ) -> Result<T, NekotaError> {
        let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(mime) = &file.mime_type {
            part = part
                .mime_str(mime)
                .map_err(|e| NekotaError::UnprocessableInput {
                    detail: format!("invalid MIME type '{mime}': {e}"),
                })?;
        }
        let mut form = reqwest::multipart::Form::new().part("file", part);
        for (name, value) in extra_fields {
            form = form.text(name.to_string(), value.clone());
        }

        let token = self.token();
        let mut builder = self.http.post(self.url(path)).multipart(form);
        if let Some(t) = &token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {t}"));
        }
        self.execute(Method::POST, path, builder, token).await
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, NekotaError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        // Copied once: a later set_token() cannot change this request
        let token = self.token();

        let mut builder = self
            .http
            .request(method.clone(), self.url(path))
            .header(CONTENT_TYPE, "application/json");
        if let Some(t) = &token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {t}"));
        }
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| NekotaError::Decode(format!("request body: {e}")))?;
            builder = builder.body(bytes);
        }
        self.execute(method, path, builder, token).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: reqwest::RequestBuilder,
        token: Option<String>,
    ) -> Result<T, NekotaError> {
        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%method, path, "Request failed: {e}");
            NekotaError::Network(e.to_string())
        })?;

        let status = response.status();
        tracing::debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            authenticated = token.is_some(),
            "API call"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = NekotaError::from_status(status.as_u16(), error_detail(&body));
            tracing::warn!(%method, path, status = status.as_u16(), "API error: {err}");
            if status == StatusCode::UNAUTHORIZED {
                if let Some(rejected) = token {
                    self.notify_unauthorized(&rejected).await;
                }
            }
            return Err(err);
        }

        let bytes = response.bytes().await?;
        let payload: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(%method, path, "Unexpected response body: {e}");
            NekotaError::Decode(format!("{method} {path}: {e}"))
        })
    }

    /// Only a rejection of the token that is still active means the
    /// session is dead; a 401 for an already-replaced token is stale.
    async fn notify_unauthorized(&self, rejected: &str) {
        if self.token().as_deref() != Some(rejected) {
            tracing::debug!("Ignoring 401 for a superseded token");
            return;
        }
        let handler = self
            .unauthorized
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .and_then(Weak::upgrade);
        if let Some(handler) = handler {
            handler.on_unauthorized(rejected).await;
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    // ─── Resource groups ────────────────────────────────────────────────────

    pub fn auth(&self) -> auth::AuthApi<'_> {
        auth::AuthApi::new(self)
    }

    pub fn user(&self) -> user::UserApi<'_> {
        user::UserApi::new(self)
    }

    pub fn memory(&self) -> memory::MemoryApi<'_> {
        memory::MemoryApi::new(self)
    }

    pub fn friend(&self) -> friend::FriendApi<'_> {
        friend::FriendApi::new(self)
    }

    pub fn voice(&self) -> voice::VoiceApi<'_> {
        voice::VoiceApi::new(self)
    }

    pub fn alarm(&self) -> alarm::AlarmApi<'_> {
        alarm::AlarmApi::new(self)
    }

    pub fn payment(&self) -> payment::PaymentApi<'_> {
        payment::PaymentApi::new(self)
    }

    pub fn admin(&self) -> admin::AdminApi<'_> {
        admin::AdminApi::new(self)
    }

    pub fn device(&self) -> device::DeviceApi<'_> {
        device::DeviceApi::new(self)
    }
}

/// Pull a readable message out of an error body: `detail`, `message`
/// or `error` from JSON, else the raw text (truncated).
fn error_detail(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            match json.get(key) {
                Some(serde_json::Value::String(s)) => return s.clone(),
                Some(v) if !v.is_null() => return v.to_string(),
                _ => {}
            }
        }
    }
    crate::util::truncate_str(body.trim(), 200).to_string()
}

/// Append `?k=v&...` with form encoding.
pub(crate) fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{query}")
}

/// Percent-encode one path segment. Ids come from the backend and are
/// usually plain, but `/`, `?`, `#` and spaces must not reshape the path.
pub(crate) fn segment(value: &str) -> String {
    let Ok(mut url) = url::Url::parse("http://segment/") else {
        return url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(value);
    }
    url.path().trim_start_matches('/').to_string()
}

/// A dashboard tile: the fetched value, or its default when the fetch failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tile<T> {
    pub value: T,
    pub failed: bool,
}

/// Swallow a failed fetch into a default value, so one failing sub-fetch
/// does not blank a whole summary view.
pub(crate) fn or_default<T: Default>(what: &str, result: Result<T, NekotaError>) -> Tile<T> {
    match result {
        Ok(value) => Tile {
            value,
            failed: false,
        },
        Err(e) => {
            tracing::warn!(what, "Falling back to default: {e}");
            Tile {
                value: T::default(),
                failed: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            ApiGateway::new("not a url"),
            Err(NekotaError::Config(_))
        ));
        assert!(matches!(
            ApiGateway::new("ftp://example.com"),
            Err(NekotaError::Config(_))
        ));
    }

    #[test]
    fn test_url_joining() {
        let gw = ApiGateway::new("https://api.nekota.app/").unwrap();
        assert_eq!(gw.base_url(), "https://api.nekota.app");
        assert_eq!(gw.url("/api/auth/login"), "https://api.nekota.app/api/auth/login");
        assert_eq!(gw.url("api/auth/login"), "https://api.nekota.app/api/auth/login");

        let prefixed = ApiGateway::new("https://example.com/backend").unwrap();
        assert_eq!(prefixed.url("/api/x"), "https://example.com/backend/api/x");
    }

    #[test]
    fn test_set_token_replaces() {
        let gw = ApiGateway::new("http://localhost:8000").unwrap();
        assert_eq!(gw.token(), None);
        gw.set_token(Some("abc".into()));
        assert_eq!(gw.token().as_deref(), Some("abc"));
        gw.set_token(None);
        assert_eq!(gw.token(), None);
    }

    #[test]
    fn test_error_detail_variants() {
        assert_eq!(error_detail(r#"{"detail":"bad email"}"#), "bad email");
        assert_eq!(error_detail(r#"{"message":"nope"}"#), "nope");
        assert_eq!(
            error_detail(r#"{"detail":[{"loc":["body","email"]}]}"#),
            r#"[{"loc":["body","email"]}]"#
        );
        assert_eq!(error_detail("  plain text  "), "plain text");
        assert_eq!(error_detail(""), "");
    }

    #[test]
    fn test_query_and_segment_encoding() {
        assert_eq!(with_query("/api/memories", &[]), "/api/memories");
        assert_eq!(
            with_query("/api/memories", &[("user_id", "u 1&x")]),
            "/api/memories?user_id=u+1%26x"
        );
        assert_eq!(segment("u1"), "u1");
        assert_eq!(segment("a/b"), "a%2Fb");
        assert_eq!(segment("a b"), "a%20b");
        assert_eq!(segment("a+b"), "a+b");
        assert_eq!(segment("x?y#z"), "x%3Fy%23z");
    }

    #[test]
    fn test_or_default_swallows_errors() {
        let tile: Tile<Vec<u32>> = or_default("memories", Err(NekotaError::Unauthorized));
        assert!(tile.failed);
        assert!(tile.value.is_empty());

        let tile = or_default("memories", Ok(vec![1, 2]));
        assert!(!tile.failed);
        assert_eq!(tile.value, vec![1, 2]);
    }
}
