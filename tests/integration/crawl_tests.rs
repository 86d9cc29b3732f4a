//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end against a SQLite store on disk.

use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use trawl::config::{Config, CrawlerConfig, HttpConfig, IndexerConfig, StoreConfig};
use trawl::crawler::crawl;
use trawl::shutdown::{self, ShutdownSignal};
use trawl::state::UrlStatus;
use trawl::storage::{NewUrl, SqliteStorage, Storage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration storing into `dir`
fn create_test_config(dir: &TempDir, seeds: Vec<String>, blacklist: &[&str]) -> Config {
    Config {
        store: StoreConfig {
            database_path: dir.path().join("trawl.db"),
        },
        http: HttpConfig {
            user_agent: "TrawlTest/1.0".to_string(),
            request_timeout_secs: 5,
        },
        crawler: CrawlerConfig {
            seeds,
            blacklist: blacklist.iter().map(|b| b.to_string()).collect(),
            max_workers: 4,
            buffer_limit: 2,
            progress_interval: 1,
        },
        indexer: IndexerConfig::default(),
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn status_of(db_path: &Path, url: &str) -> Option<UrlStatus> {
    let storage = SqliteStorage::open(db_path).expect("Failed to open DB");
    storage
        .get_url(url)
        .expect("Failed to read URL")
        .map(|record| record.status)
}

#[tokio::test]
async fn test_crawl_follows_external_links_only() {
    let site_a = MockServer::start().await;
    let site_b = MockServer::start().await;
    let a = site_a.uri();
    let b = site_b.uri();

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(html_page(&format!(
            r#"<a href="{b}/y?ref=a">B</a>
               <a href="http://archive.org/z">Archive</a>
               <a href="/internal">Internal</a>
               <a href="{a}/also-internal">Internal too</a>"#
        )))
        .expect(1)
        .mount(&site_a)
        .await;

    Mock::given(method("GET"))
        .and(path("/internal"))
        .respond_with(html_page("never fetched"))
        .expect(0)
        .mount(&site_a)
        .await;

    // Links back to the seed must not cause a second fetch
    Mock::given(method("GET"))
        .and(path("/y"))
        .respond_with(html_page(&format!(r#"<a href="{a}/x#top">Back</a>"#)))
        .expect(1)
        .mount(&site_b)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![format!("{a}/x")], &["archive.org"]);

    let summary = crawl(&config, ShutdownSignal::never())
        .await
        .expect("Crawl failed");

    assert!(!summary.interrupted);
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.enqueued, 1);
    assert_eq!(summary.remaining, 0);

    let db = &config.store.database_path;
    assert_eq!(status_of(db, &format!("{a}/x")), Some(UrlStatus::Processed));
    assert_eq!(status_of(db, &format!("{b}/y")), Some(UrlStatus::Processed));
    assert_eq!(status_of(db, "http://archive.org/z"), Some(UrlStatus::Processed));
    assert_eq!(status_of(db, &format!("{a}/internal")), None);
    assert_eq!(status_of(db, &format!("{b}/y?ref=a")), None);
}

#[tokio::test]
async fn test_crawl_resumes_from_pending_urls() {
    let site = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("GET"))
        .and(path("/done"))
        .respond_with(html_page("already crawled"))
        .expect(0)
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/todo"))
        .respond_with(html_page(&format!(r#"<a href="{base}/done">Old</a>"#)))
        .expect(1)
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/seed"))
        .respond_with(html_page("seed"))
        .expect(0)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![format!("{base}/seed")], &[]);

    {
        let mut storage = SqliteStorage::open(&config.store.database_path).unwrap();
        storage
            .insert_urls(&[
                NewUrl::processed(format!("{base}/done")),
                NewUrl::pending(format!("{base}/todo")),
            ])
            .unwrap();
        storage.close().unwrap();
    }

    let summary = crawl(&config, ShutdownSignal::never())
        .await
        .expect("Crawl failed");

    assert_eq!(summary.fetched, 1);
    let db = &config.store.database_path;
    assert_eq!(status_of(db, &format!("{base}/todo")), Some(UrlStatus::Processed));
    assert_eq!(status_of(db, &format!("{base}/seed")), None);
}

#[tokio::test]
async fn test_interrupted_crawl_leaves_queue_pending() {
    let site = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("GET"))
        .respond_with(html_page("unused"))
        .expect(0)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![format!("{base}/start")], &[]);

    let (trigger, signal) = shutdown::channel();
    trigger.trigger();

    let summary = crawl(&config, signal).await.expect("Crawl failed");
    assert!(summary.interrupted);
    assert_eq!(summary.fetched, 0);
    assert_eq!(summary.remaining, 1);

    let db = &config.store.database_path;
    assert_eq!(status_of(db, &format!("{base}/start")), Some(UrlStatus::Pending));
}

#[tokio::test]
async fn test_shutdown_during_fetch_persists_batch_results() {
    let site_a = MockServer::start().await;
    let site_b = MockServer::start().await;
    let a = site_a.uri();
    let b = site_b.uri();

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html_page(&format!(r#"<a href="{b}/next">Next</a>"#))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&site_a)
        .await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_page("not reached"))
        .expect(0)
        .mount(&site_b)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![format!("{a}/slow")], &[]);

    // Shutdown is requested once the slow fetch is in flight
    let (trigger, signal) = shutdown::channel();
    let request_shutdown = async {
        while site_a
            .received_requests()
            .await
            .unwrap_or_default()
            .is_empty()
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        trigger.trigger();
    };

    let (result, ()) = tokio::join!(crawl(&config, signal), request_shutdown);
    let summary = result.expect("Crawl failed");

    assert!(summary.interrupted);
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.enqueued, 1);
    assert_eq!(summary.remaining, 1);

    let db = &config.store.database_path;
    assert_eq!(status_of(db, &format!("{a}/slow")), Some(UrlStatus::Processed));
    assert_eq!(status_of(db, &format!("{b}/next")), Some(UrlStatus::Pending));
}

#[tokio::test]
async fn test_crawl_retries_transient_errors() {
    let site_a = MockServer::start().await;
    let site_b = MockServer::start().await;
    let b = site_b.uri();

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&site_a)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html_page(&format!(r#"<a href="{b}/found">Found</a>"#)))
        .expect(1)
        .mount(&site_a)
        .await;

    Mock::given(method("GET"))
        .and(path("/found"))
        .respond_with(html_page("found"))
        .expect(1)
        .mount(&site_b)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![format!("{}/flaky", site_a.uri())], &[]);

    let summary = crawl(&config, ShutdownSignal::never())
        .await
        .expect("Crawl failed");

    assert_eq!(summary.fetched, 2);
    let db = &config.store.database_path;
    assert_eq!(status_of(db, &format!("{b}/found")), Some(UrlStatus::Processed));
}

#[tokio::test]
async fn test_failed_fetch_still_marks_processed() {
    let site = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![format!("{base}/gone")], &[]);

    let summary = crawl(&config, ShutdownSignal::never())
        .await
        .expect("Crawl failed");

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.enqueued, 0);
    let db = &config.store.database_path;
    assert_eq!(status_of(db, &format!("{base}/gone")), Some(UrlStatus::Processed));
}

#[tokio::test]
async fn test_blacklisted_seed_is_never_fetched() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("unused"))
        .expect(0)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let seed = format!("{}/page", site.uri());
    let config = create_test_config(&dir, vec![seed.clone()], &["127.0.0.1"]);

    let summary = crawl(&config, ShutdownSignal::never())
        .await
        .expect("Crawl failed");

    assert_eq!(summary.fetched, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        status_of(&config.store.database_path, &seed),
        Some(UrlStatus::Processed)
    );
}
