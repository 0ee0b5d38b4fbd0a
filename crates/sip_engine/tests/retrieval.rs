use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sip_core::{RetrievalMethod, RetrievedReport};
use sip_engine::{ApiClient, ClientSettings, FsFileReader, LocalFileReader, ReportRetriever};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPORT_PATH: &str = "media/generated/x/comprehensive_report.html";

fn client_for(server: &MockServer) -> ApiClient {
    let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
    ApiClient::new(ClientSettings::new(base)).unwrap()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

fn methods(failures: &[sip_core::StrategyFailure]) -> Vec<RetrievalMethod> {
    failures.iter().map(|failure| failure.method).collect()
}

#[tokio::test]
async fn static_path_is_used_after_three_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download-report"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reports/comprehensive_report.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/generated/x/comprehensive_report.html"))
        .respond_with(html("<html>...</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let retriever = ReportRetriever::new(client_for(&server), None);
    let outcome = retriever.retrieve(REPORT_PATH).await;

    assert_eq!(
        methods(&outcome.failures),
        vec![
            RetrievalMethod::LocalFile,
            RetrievalMethod::DownloadEndpoint,
            RetrievalMethod::ReportsEndpoint,
        ]
    );
    assert_eq!(outcome.failures[0].message, "File system API not available");
    assert_eq!(outcome.failures[1].message, "HTTP 404: Not Found");
    assert_eq!(
        outcome.retrieved,
        Some(RetrievedReport {
            method: RetrievalMethod::StaticPath,
            content: "<html>...</html>".to_string(),
        })
    );
}

#[tokio::test]
async fn download_success_stops_the_chain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download-report"))
        .and(query_param("filepath", REPORT_PATH))
        .respond_with(html("<html>report</html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reports/comprehensive_report.html"))
        .respond_with(html("<html>alt</html>"))
        .expect(0)
        .mount(&server)
        .await;

    let retriever = ReportRetriever::new(client_for(&server), None);
    let outcome = retriever.retrieve(REPORT_PATH).await;

    assert_eq!(methods(&outcome.failures), vec![RetrievalMethod::LocalFile]);
    let retrieved = outcome.retrieved.expect("retrieved");
    assert_eq!(retrieved.method, RetrievalMethod::DownloadEndpoint);
    assert_eq!(retrieved.content, "<html>report</html>");
}

#[tokio::test]
async fn local_reader_is_tried_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<html>remote</html>"))
        .expect(0)
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let report_dir = temp.path().join("media/generated/x");
    fs::create_dir_all(&report_dir).unwrap();
    fs::write(report_dir.join("comprehensive_report.html"), "<html>local</html>").unwrap();
    let reader: Arc<dyn LocalFileReader> = Arc::new(FsFileReader::new(temp.path()));

    let retriever = ReportRetriever::new(client_for(&server), Some(reader));
    let outcome = retriever.retrieve(&format!("/{REPORT_PATH}")).await;

    assert!(outcome.failures.is_empty());
    let retrieved = outcome.retrieved.expect("retrieved");
    assert_eq!(retrieved.method, RetrievalMethod::LocalFile);
    assert_eq!(retrieved.content, "<html>local</html>");
}

#[tokio::test]
async fn exhaustion_reports_every_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let retriever = ReportRetriever::new(client_for(&server), None);
    let outcome = retriever.retrieve(REPORT_PATH).await;

    assert!(outcome.retrieved.is_none());
    assert_eq!(
        methods(&outcome.failures),
        vec![
            RetrievalMethod::LocalFile,
            RetrievalMethod::DownloadEndpoint,
            RetrievalMethod::ReportsEndpoint,
            RetrievalMethod::StaticPath,
        ]
    );
}

#[tokio::test]
async fn static_rewrite_requires_media_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let retriever = ReportRetriever::new(client_for(&server), None);
    let outcome = retriever.retrieve("reports/summary.html").await;

    let last = outcome.failures.last().expect("failures");
    assert_eq!(last.method, RetrievalMethod::StaticPath);
    assert_eq!(last.message, "path has no media segment");
}
