//! Integration tests for the indexer
//!
//! Processed URLs are written straight into a store on disk and point at
//! wiremock servers; the indexer then runs end-to-end over them.

use tempfile::TempDir;
use trawl::config::{Config, CrawlerConfig, HttpConfig, IndexerConfig, StoreConfig};
use trawl::indexer::{index, NO_TEXT_CONTENT};
use trawl::shutdown::ShutdownSignal;
use trawl::state::IndexState;
use trawl::storage::{IndexEntry, IndexStatusRecord, NewUrl, SqliteStorage, Storage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(dir: &TempDir, reindex: bool) -> Config {
    Config {
        store: StoreConfig {
            database_path: dir.path().join("trawl.db"),
        },
        http: HttpConfig {
            user_agent: "TrawlTest/1.0".to_string(),
            request_timeout_secs: 5,
        },
        crawler: CrawlerConfig::default(),
        indexer: IndexerConfig {
            page_size: 2,
            buffer_limit: 4,
            reindex,
        },
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

/// Stores the given URLs and returns their page ids in order
fn seed_store(config: &Config, rows: &[NewUrl]) -> Vec<i64> {
    let mut storage = SqliteStorage::open(&config.store.database_path).unwrap();
    storage.insert_urls(rows).unwrap();
    let ids = rows
        .iter()
        .map(|row| storage.get_url(&row.url).unwrap().unwrap().id)
        .collect();
    storage.close().unwrap();
    ids
}

fn status_of(config: &Config, page_id: i64) -> Option<IndexStatusRecord> {
    let storage = SqliteStorage::open(&config.store.database_path).unwrap();
    storage.index_status(page_id).unwrap()
}

fn entries_of(config: &Config, page_id: i64) -> Vec<(String, u32)> {
    let storage = SqliteStorage::open(&config.store.database_path).unwrap();
    storage
        .index_entries_for(page_id)
        .unwrap()
        .into_iter()
        .map(|IndexEntry { keyword, frequency, .. }| (keyword, frequency))
        .collect()
}

#[tokio::test]
async fn test_page_keywords_are_indexed() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/animals"))
        .respond_with(html_page(
            "<p>cat cat dog dog dog bird</p><script>var ignored = 1;</script>",
        ))
        .expect(1)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, false);
    let ids = seed_store(&config, &[NewUrl::processed(format!("{}/animals", site.uri()))]);

    let summary = index(&config, ShutdownSignal::never())
        .await
        .expect("Indexing failed");

    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.keywords, 3);

    let status = status_of(&config, ids[0]).unwrap();
    assert_eq!(status.status, IndexState::Indexed);
    assert!(status.error.is_none());
    assert!(status.last_indexed.is_some());

    assert_eq!(
        entries_of(&config, ids[0]),
        vec![
            ("dog".to_string(), 3),
            ("cat".to_string(), 2),
            ("bird".to_string(), 1)
        ]
    );
}

#[tokio::test]
async fn test_empty_page_is_marked_failed() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blank"))
        .respond_with(html_page("<script>render();</script>   "))
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, false);
    let ids = seed_store(&config, &[NewUrl::processed(format!("{}/blank", site.uri()))]);

    let summary = index(&config, ShutdownSignal::never())
        .await
        .expect("Indexing failed");
    assert_eq!(summary.failed, 1);

    let status = status_of(&config, ids[0]).unwrap();
    assert_eq!(status.status, IndexState::Failed);
    assert!(status.error.as_deref().unwrap_or_default().contains("no text"));
    assert!(entries_of(&config, ids[0]).is_empty());
}

#[tokio::test]
async fn test_missing_page_is_marked_failed() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, false);
    let ids = seed_store(&config, &[NewUrl::processed(format!("{}/missing", site.uri()))]);

    index(&config, ShutdownSignal::never())
        .await
        .expect("Indexing failed");

    let status = status_of(&config, ids[0]).unwrap();
    assert_eq!(status.status, IndexState::Failed);
    assert_eq!(status.error.as_deref(), Some(NO_TEXT_CONTENT));
}

#[tokio::test]
async fn test_rerun_without_reindex_leaves_indexed_pages_untouched() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stable"))
        .respond_with(html_page("<p>rust rust crawler</p>"))
        .expect(1)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, false);
    let ids = seed_store(&config, &[NewUrl::processed(format!("{}/stable", site.uri()))]);

    index(&config, ShutdownSignal::never())
        .await
        .expect("Indexing failed");
    let first_status = status_of(&config, ids[0]).unwrap();
    let first_entries = entries_of(&config, ids[0]);

    let summary = index(&config, ShutdownSignal::never())
        .await
        .expect("Indexing failed");

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.indexed, 0);
    assert_eq!(status_of(&config, ids[0]).unwrap(), first_status);
    assert_eq!(entries_of(&config, ids[0]), first_entries);
}

#[tokio::test]
async fn test_reindex_replaces_previous_entries() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/changing"))
        .respond_with(html_page("<p>alpha alpha beta gamma delta</p>"))
        .up_to_n_times(1)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/changing"))
        .respond_with(html_page("<p>omega omega</p>"))
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, false);
    let ids = seed_store(&config, &[NewUrl::processed(format!("{}/changing", site.uri()))]);

    index(&config, ShutdownSignal::never())
        .await
        .expect("Indexing failed");
    assert_eq!(entries_of(&config, ids[0]).len(), 4);

    let reindex_config = create_test_config(&dir, true);
    let summary = index(&reindex_config, ShutdownSignal::never())
        .await
        .expect("Indexing failed");

    assert_eq!(summary.indexed, 1);
    assert_eq!(
        entries_of(&config, ids[0]),
        vec![("omega".to_string(), 2)]
    );
    assert_eq!(
        status_of(&config, ids[0]).unwrap().status,
        IndexState::Indexed
    );
}

#[tokio::test]
async fn test_only_processed_pages_are_indexed() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/done"))
        .respond_with(html_page("<p>processed page</p>"))
        .expect(3)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/queued"))
        .respond_with(html_page("<p>queued page</p>"))
        .expect(0)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, false);
    let base = site.uri();
    let ids = seed_store(
        &config,
        &[
            NewUrl::processed(format!("{base}/done")),
            NewUrl::pending(format!("{base}/queued")),
            NewUrl::processed(format!("{base}/done?page=2")),
            NewUrl::processed(format!("{base}/done?page=3")),
        ],
    );

    let summary = index(&config, ShutdownSignal::never())
        .await
        .expect("Indexing failed");

    // Three processed rows span two pages of two rows
    assert_eq!(summary.considered, 3);
    assert_eq!(summary.indexed, 3);
    assert!(status_of(&config, ids[1]).is_none());
    for id in [ids[0], ids[2], ids[3]] {
        assert_eq!(status_of(&config, id).unwrap().status, IndexState::Indexed);
    }
}
