use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::decode::decode_body;
use crate::{FailureKind, FetchError};

pub(crate) const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// API root, e.g. `http://localhost:8000/api`.
    pub api_base: Url,
    /// Origin serving `/media/...` static assets; defaults to the API origin.
    pub static_origin: Url,
    pub connect_timeout: Duration,
    /// Applies to short requests only; streams are bounded by the connect timeout.
    pub request_timeout: Duration,
    pub carry_partial_lines: bool,
}

impl ClientSettings {
    pub fn new(api_base: Url) -> Self {
        let static_origin = origin_of(&api_base);
        Self {
            api_base,
            static_origin,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            carry_partial_lines: false,
        }
    }
}

fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

/// Thin wrapper over a shared `reqwest::Client` bound to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl ApiClient {
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// `{api_base}/{path}`; `path` may contain several segments.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, FetchError> {
        let base = self.settings.api_base.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    /// Endpoint URL with one extra, percent-encoded path segment.
    pub fn endpoint_url_with_segment(&self, path: &str, segment: &str) -> Result<Url, FetchError> {
        let mut url = self.endpoint_url(path)?;
        url.path_segments_mut()
            .map_err(|_| FetchError::new(FailureKind::InvalidUrl, "API base cannot have segments"))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    pub fn static_url(&self, absolute_path: &str) -> Result<Url, FetchError> {
        self.settings
            .static_origin
            .join(absolute_path)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &Value,
    ) -> Result<T, FetchError> {
        let body = serde_json::to_vec(body)
            .map_err(|err| FetchError::new(FailureKind::InvalidResponse, err.to_string()))?;
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(self.settings.request_timeout)
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    /// GET an HTML document and decode it by charset.
    pub async fn get_html(&self, url: Url) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, HTML_ACCEPT)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let content_type = content_type_of(&response);
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        decode_body(&bytes, content_type.as_deref())
            .map(|decoded| decoded.text)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
    }
}

pub(crate) fn content_type_of(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Turns a non-success status into `HTTP <code>: <reason>`, preferring a JSON `detail`.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = status.canonical_reason().unwrap_or("Unknown");
    let body = response.bytes().await.unwrap_or_default();
    let message = error_detail(&body).unwrap_or_else(|| format!("HTTP {}: {reason}", status.as_u16()));
    Err(FetchError::new(FailureKind::HttpStatus(status.as_u16()), message))
}

fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FetchError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| FetchError::new(FailureKind::InvalidResponse, err.to_string()))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return FetchError::new(FailureKind::InvalidUrl, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
