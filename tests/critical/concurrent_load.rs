//! Many URLs at high worker counts: completeness and name uniqueness.

use std::collections::HashSet;
use std::time::Duration;

use imgdl_core::{DownloadStatus, summarize};
use tempfile::TempDir;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, ResponseTemplate};

use crate::support::socket_guard::start_mock_server_or_skip;
use crate::support::{downloaded_files, has_part_files, test_engine};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn p1_every_url_yields_exactly_one_result() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path_regex(r"^/img/\d+\.jpg$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"jpeg".to_vec())
                .set_delay(Duration::from_millis(20)),
        )
        .mount(&mock_server)
        .await;

    let urls: Vec<String> = (0..60)
        .map(|i| format!("{}/img/{i}.jpg", mock_server.uri()))
        .collect();

    let results = test_engine(16, 0, 0.0)
        .run(&urls, temp.path())
        .await
        .unwrap();

    assert_eq!(results.len(), urls.len());
    let seen: HashSet<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(seen.len(), urls.len());
    assert_eq!(summarize(&results).ok, urls.len());
    assert_eq!(downloaded_files(temp.path()).len(), urls.len());
    assert!(!has_part_files(temp.path()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn p1_same_filename_from_many_hosts_never_collides() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path_regex(r"^/\d+/cover\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
        .mount(&mock_server)
        .await;

    let urls: Vec<String> = (0..25)
        .map(|i| format!("{}/{i}/cover.png", mock_server.uri()))
        .collect();

    let results = test_engine(10, 0, 0.0)
        .run(&urls, temp.path())
        .await
        .unwrap();

    assert!(results.iter().all(|r| r.status() == DownloadStatus::Ok));
    let paths: HashSet<_> = results.iter().filter_map(|r| r.path()).collect();
    assert_eq!(paths.len(), urls.len());
    let plain = results
        .iter()
        .filter(|r| r.path() == Some(temp.path().join("cover.png").as_path()))
        .count();
    assert_eq!(plain, 1);
}
