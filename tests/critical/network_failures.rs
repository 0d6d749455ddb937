//! Connection failures, server errors and rate limiting.
//! Assert retries and final error reporting.

use std::time::Duration;

use imgdl_core::DownloadStatus;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::support::socket_guard::start_mock_server_or_skip;
use crate::support::{has_part_files, test_fetcher};

#[tokio::test]
async fn p0_server_error_500_retries_then_final_status() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/fail.jpg"))
        .respond_with(ResponseTemplate::new(500).set_body_bytes(b"error"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let (fetcher, sleeper) = test_fetcher(3, 0.5);
    let result = fetcher
        .fetch(&format!("{}/fail.jpg", mock_server.uri()), temp.path())
        .await;

    assert_eq!(result.status(), DownloadStatus::Failed);
    assert!(result.error().unwrap().contains("HTTP 500"));
    assert_eq!(
        sleeper.delays(),
        vec![
            Duration::from_millis(500),
            Duration::from_secs(1),
            Duration::from_secs(2)
        ]
    );
    assert!(!has_part_files(temp.path()));
}

#[tokio::test]
async fn p0_client_error_404_fails_without_retry() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (fetcher, sleeper) = test_fetcher(3, 0.5);
    let result = fetcher
        .fetch(&format!("{}/missing.jpg", mock_server.uri()), temp.path())
        .await;

    assert_eq!(result.status(), DownloadStatus::Failed);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn p0_rate_limit_429_honors_retry_after() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/limited.jpg"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"image"))
        .mount(&mock_server)
        .await;

    let (fetcher, sleeper) = test_fetcher(3, 0.5);
    let result = fetcher
        .fetch(&format!("{}/limited.jpg", mock_server.uri()), temp.path())
        .await;

    assert_eq!(result.status(), DownloadStatus::Ok);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_secs(2), Duration::from_secs(2)]
    );
    assert_eq!(
        std::fs::read(temp.path().join("limited.jpg")).unwrap(),
        b"image"
    );
}

#[tokio::test]
async fn p0_connection_refused_is_retried_then_fails() {
    // Bind then drop to get a port with nothing listening
    let Ok(listener) = std::net::TcpListener::bind("127.0.0.1:0") else {
        return;
    };
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let temp = TempDir::new().unwrap();

    let (fetcher, sleeper) = test_fetcher(2, 0.0);
    let result = fetcher
        .fetch(&format!("http://{addr}/a.jpg"), temp.path())
        .await;

    assert_eq!(result.status(), DownloadStatus::Failed);
    assert!(result.error().unwrap().contains("network error"));
    assert_eq!(sleeper.delays().len(), 2);
    assert!(!temp.path().join("a.jpg").exists());
}
