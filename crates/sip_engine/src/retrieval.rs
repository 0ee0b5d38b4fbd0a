//! Ordered report retrieval strategies.
//!
//! Each strategy is tried only after the previous one failed; the first
//! success ends the chain. Every failure is kept, in order, for diagnostics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use sip_core::report::{file_name_from_path, static_asset_path};
use sip_core::{RetrievalMethod, RetrievalOutcome, RetrievedReport, StrategyFailure};

use crate::decode::decode_body;
use crate::{ApiClient, FailureKind, FetchError};

/// Direct file access, available when the client runs next to the report store.
#[async_trait::async_trait]
pub trait LocalFileReader: Send + Sync {
    async fn read_report(&self, path: &str) -> Result<String, FetchError>;
}

/// Reads reports from disk, resolving relative paths against `root`.
#[derive(Debug, Clone)]
pub struct FsFileReader {
    root: PathBuf,
}

impl FsFileReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() && candidate.exists() {
            return candidate.to_path_buf();
        }
        let relative = path.trim_start_matches(['/', '\\']).replace('\\', "/");
        self.root.join(relative)
    }
}

#[async_trait::async_trait]
impl LocalFileReader for FsFileReader {
    async fn read_report(&self, path: &str) -> Result<String, FetchError> {
        let resolved = self.resolve(path);
        let bytes = tokio::fs::read(&resolved).await.map_err(|err| {
            FetchError::new(FailureKind::Io, format!("{}: {err}", resolved.display()))
        })?;
        decode_body(&bytes, None)
            .map(|decoded| decoded.text)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
pub trait ReportSource: Send + Sync {
    fn method(&self) -> RetrievalMethod;
    async fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

struct LocalFileSource {
    reader: Option<Arc<dyn LocalFileReader>>,
}

#[async_trait::async_trait]
impl ReportSource for LocalFileSource {
    fn method(&self) -> RetrievalMethod {
        RetrievalMethod::LocalFile
    }

    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        match &self.reader {
            Some(reader) => reader.read_report(path).await,
            None => Err(FetchError::new(
                FailureKind::Unavailable,
                "File system API not available",
            )),
        }
    }
}

/// `GET /download-report?filepath=<path>`.
pub struct DownloadEndpointSource {
    client: ApiClient,
}

impl DownloadEndpointSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ReportSource for DownloadEndpointSource {
    fn method(&self) -> RetrievalMethod {
        RetrievalMethod::DownloadEndpoint
    }

    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let mut url = self.client.endpoint_url("download-report")?;
        url.query_pairs_mut().append_pair("filepath", path);
        self.client.get_html(url).await
    }
}

/// `GET /reports/<file name>`.
pub struct ReportsEndpointSource {
    client: ApiClient,
}

impl ReportsEndpointSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ReportSource for ReportsEndpointSource {
    fn method(&self) -> RetrievalMethod {
        RetrievalMethod::ReportsEndpoint
    }

    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let name = file_name_from_path(path);
        if name.is_empty() {
            return Err(FetchError::new(FailureKind::InvalidUrl, "empty file name"));
        }
        let url = self.client.endpoint_url_with_segment("reports", name)?;
        self.client.get_html(url).await
    }
}

/// The artifact path rewritten to its public `/media/...` URL.
pub struct StaticPathSource {
    client: ApiClient,
}

impl StaticPathSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ReportSource for StaticPathSource {
    fn method(&self) -> RetrievalMethod {
        RetrievalMethod::StaticPath
    }

    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let asset = static_asset_path(path).ok_or_else(|| {
            FetchError::new(FailureKind::InvalidUrl, "path has no media segment")
        })?;
        let url = self.client.static_url(&asset)?;
        self.client.get_html(url).await
    }
}

pub struct ReportRetriever {
    sources: Vec<Box<dyn ReportSource>>,
}

impl ReportRetriever {
    /// The standard chain: local file, download endpoint, reports endpoint, static path.
    pub fn new(client: ApiClient, reader: Option<Arc<dyn LocalFileReader>>) -> Self {
        Self::with_sources(vec![
            Box::new(LocalFileSource { reader }),
            Box::new(DownloadEndpointSource::new(client.clone())),
            Box::new(ReportsEndpointSource::new(client.clone())),
            Box::new(StaticPathSource::new(client)),
        ])
    }

    pub fn with_sources(sources: Vec<Box<dyn ReportSource>>) -> Self {
        Self { sources }
    }

    pub async fn retrieve(&self, path: &str) -> RetrievalOutcome {
        let mut outcome = RetrievalOutcome::default();
        for source in &self.sources {
            let method = source.method();
            match source.fetch(path).await {
                Ok(content) => {
                    engine_info!("Report {path} loaded via {method}");
                    outcome.retrieved = Some(RetrievedReport { method, content });
                    break;
                }
                Err(err) => {
                    engine_warn!("Report {path} via {method} failed: {err}");
                    outcome.failures.push(StrategyFailure {
                        method,
                        message: err.message,
                    });
                }
            }
        }
        outcome
    }
}
