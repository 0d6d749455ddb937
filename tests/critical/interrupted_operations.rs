//! Interrupted transfers must never leave a destination or temp file behind.

use std::time::Duration;

use imgdl_core::DownloadStatus;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::support::socket_guard::{should_skip_socket_bound_test, start_mock_server_or_skip};
use crate::support::{downloaded_files, has_part_files, test_engine, test_fetcher};

/// Serves a response that promises more bytes than it sends, then hangs up.
async fn spawn_truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\nConnection: close\r\n\r\n0123456789",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

/// Accepts connections and sends headers, then stalls forever.
async fn spawn_stalling_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\npartial")
                    .await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn p0_truncated_body_leaves_no_files() {
    if should_skip_socket_bound_test() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let base = spawn_truncating_server().await;

    let (fetcher, _) = test_fetcher(0, 0.0);
    let result = fetcher
        .fetch(&format!("{base}/photo.jpg"), temp.path())
        .await;

    assert_eq!(result.status(), DownloadStatus::Failed, "{result:?}");
    assert!(!temp.path().join("photo.jpg").exists());
    assert!(!has_part_files(temp.path()));
}

#[tokio::test]
async fn p0_truncated_body_is_retried_then_fails() {
    if should_skip_socket_bound_test() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let base = spawn_truncating_server().await;

    let (fetcher, sleeper) = test_fetcher(2, 0.0);
    let result = fetcher
        .fetch(&format!("{base}/photo.jpg"), temp.path())
        .await;

    assert_eq!(result.status(), DownloadStatus::Failed);
    assert_eq!(sleeper.delays().len(), 2);
    assert!(downloaded_files(temp.path()).is_empty());
    assert!(!has_part_files(temp.path()));
}

#[tokio::test]
async fn p0_cancelled_run_removes_part_files() {
    if should_skip_socket_bound_test() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let base = spawn_stalling_server().await;
    let urls: Vec<String> = (0..3).map(|i| format!("{base}/{i}.jpg")).collect();

    let engine = test_engine(3, 0, 0.0);
    let outcome =
        tokio::time::timeout(Duration::from_millis(500), engine.run(&urls, temp.path())).await;
    assert!(outcome.is_err(), "run should still be stalled");

    // Aborted tasks drop their temp-file guards asynchronously
    let mut clean = false;
    for _ in 0..50 {
        if !has_part_files(temp.path()) {
            clean = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(clean, "part files left after cancellation");
    assert!(downloaded_files(temp.path()).is_empty());
}

#[tokio::test]
async fn p0_interrupted_run_keeps_finished_files_for_rerun() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fast"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"slow")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let first_url = format!("{}/a.jpg", mock_server.uri());
    let urls = vec![first_url.clone(), format!("{}/slow.jpg", mock_server.uri())];

    let engine = test_engine(1, 0, 0.0);
    let outcome =
        tokio::time::timeout(Duration::from_millis(800), engine.run(&urls, temp.path())).await;
    assert!(outcome.is_err(), "second download should still be running");
    assert!(temp.path().join("a.jpg").is_file());

    let rerun = test_engine(1, 0, 0.0)
        .run(std::slice::from_ref(&first_url), temp.path())
        .await
        .unwrap();

    assert_eq!(rerun[0].status(), DownloadStatus::Skipped);
    assert_eq!(rerun[0].path(), Some(temp.path().join("a.jpg").as_path()));
    assert_eq!(downloaded_files(temp.path()).len(), 1);
}
