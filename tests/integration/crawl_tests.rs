//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the poem catalog and run the
//! full crawl into a CSV file on disk.

use poesy_loader::config::{
    Config, CrawlConfig, FetchConfig, LoggingConfig, MainConfig, SiteProfile,
};
use poesy_loader::crawler::{run_crawl, Coordinator};
use poesy_loader::{CsvSink, PoesyError, Record, RecordSink};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock catalog
fn create_test_config(server: &MockServer, output: &Path) -> Config {
    Config {
        main: MainConfig {
            url: format!("{}/poems/top/all", server.uri()),
            output_file: output.to_string_lossy().into_owned(),
        },
        fetch: FetchConfig {
            max_try: 3,
            backoff_unit_ms: 1, // Very short for testing
            timeout_secs: 5,
            concurrency: 4,
            user_agent: "TestBot/1.0".to_string(),
        },
        crawl: CrawlConfig::default(),
        logging: LoggingConfig::default(),
        site: SiteProfile::default(),
    }
}

fn listing_html(links: &[&str], last_page: u32) -> String {
    let items: String = links
        .iter()
        .map(|l| {
            format!(
                r#"<div class="_1jGw_"><a class="_2A3Np" href="{}">poem</a></div>"#,
                l
            )
        })
        .collect();
    let pages: String = (1..=last_page)
        .map(|p| format!(r#"<a class="GmJ5E" href="?page={0}">{0}</a>"#, p))
        .collect();
    format!(
        r#"<html><body><div class="_2VELq">{}</div><div class="_2uPBE">{}</div></body></html>"#,
        items, pages
    )
}

fn poem_html(author: &str, title: &str, stanzas: &[&str], year: Option<&str>) -> String {
    let stanzas: String = stanzas
        .iter()
        .map(|s| format!(r#"<p class="">{}</p>"#, s))
        .collect();
    let year = year
        .map(|y| format!("<div>{}</div>", y))
        .unwrap_or_default();
    format!(
        r#"<html><body><div class="_1MTBU _3RpDE _47J4f _3IEeu">
        <div class="_14JnI">{}</div>
        <div class="_2jzeL">{}</div>
        <div class="_3P9bi">{}{}</div>
        </div></body></html>"#,
        author, title, stanzas, year
    )
}

async fn mount_listing(server: &MockServer, page: Option<u32>, body: String) {
    let mock = Mock::given(method("GET")).and(path("/poems/top/all"));
    let mock = match page {
        Some(page) => mock.and(query_param("page", page.to_string().as_str())),
        None => mock,
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_poem(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Collects formatted log output in memory
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_full_crawl_single_page() {
    let server = MockServer::start().await;
    mount_listing(&server, None, listing_html(&["/poem/first", "/poem/second"], 1)).await;
    mount_poem(
        &server,
        "/poem/first",
        poem_html("Poet One", "Morning", &["Line1<br/>Line2", "Line3"], None),
    )
    .await;
    mount_poem(
        &server,
        "/poem/second",
        poem_html("Poet Two", "Evening", &["Dusk"], Some("1999")),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("poems.csv");
    let stats = run_crawl(create_test_config(&server, &output))
        .await
        .expect("Crawl failed");

    let rows = CsvSink::read_records(&output).unwrap();
    assert_eq!(
        rows,
        vec![
            Record::new("Poet One", "Morning", "Line1\nLine2\n\nLine3"),
            Record::new("Poet Two", "Evening", "Dusk\n\n1999"),
        ]
    );
    assert_eq!(stats.total_pages, 1);
    assert_eq!(stats.records_written, 2);
    assert_eq!(stats.fetch_failures, 0);
}

#[tokio::test]
async fn test_exhausted_document_is_dropped_and_logged() {
    let server = MockServer::start().await;
    mount_listing(&server, None, listing_html(&["/poem/first", "/poem/second"], 1)).await;
    mount_poem(
        &server,
        "/poem/first",
        poem_html("Poet One", "Morning", &["Line1"], None),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/poem/second"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let logs = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("poems.csv");
    let stats = run_crawl(create_test_config(&server, &output))
        .await
        .expect("Crawl failed");

    let rows = CsvSink::read_records(&output).unwrap();
    assert_eq!(rows, vec![Record::new("Poet One", "Morning", "Line1")]);
    assert_eq!(stats.fetch_failures, 1);

    let log = logs.contents();
    assert!(
        log.contains("/poem/second") && log.contains("failed after 3 attempts"),
        "missing failure entry in log:\n{}",
        log
    );
}

#[tokio::test]
async fn test_multi_page_crawl_appends_in_page_order() {
    let server = MockServer::start().await;
    mount_listing(&server, Some(2), listing_html(&["/poem/c"], 3)).await;
    mount_listing(&server, Some(3), listing_html(&["/poem/d", "/poem/e"], 3)).await;
    mount_listing(&server, None, listing_html(&["/poem/a", "/poem/b"], 3)).await;
    for (route, title) in [
        ("/poem/a", "A"),
        ("/poem/b", "B"),
        ("/poem/c", "C"),
        ("/poem/d", "D"),
        ("/poem/e", "E"),
    ] {
        mount_poem(&server, route, poem_html("Poet", title, &["text"], None)).await;
    }

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("poems.csv");
    let stats = run_crawl(create_test_config(&server, &output))
        .await
        .expect("Crawl failed");

    let titles: Vec<String> = CsvSink::read_records(&output)
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["A", "B", "C", "D", "E"]);
    assert_eq!(stats.pages_processed, 3);
}

#[tokio::test]
async fn test_rerun_appends_after_existing_rows() {
    let server = MockServer::start().await;
    mount_listing(&server, None, listing_html(&["/poem/only"], 1)).await;
    mount_poem(
        &server,
        "/poem/only",
        poem_html("Poet", "Again", &["text"], None),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("poems.csv");

    run_crawl(create_test_config(&server, &output))
        .await
        .expect("First crawl failed");
    let after_first = CsvSink::read_records(&output).unwrap();

    run_crawl(create_test_config(&server, &output))
        .await
        .expect("Second crawl failed");
    let after_second = CsvSink::read_records(&output).unwrap();

    assert_eq!(after_first.len(), 1);
    assert_eq!(after_second.len(), 2);
    assert_eq!(after_second[0], after_first[0]);

    let sink = CsvSink::open(&output).unwrap();
    assert_eq!(sink.cursor().next_row(), 3);
}

#[tokio::test]
async fn test_unavailable_catalog_is_fatal_before_writes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/poems/top/all"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("poems.csv");
    let result = run_crawl(create_test_config(&server, &output)).await;

    assert!(matches!(
        result,
        Err(PoesyError::CatalogUnavailable { .. })
    ));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_skipped_listing_page_does_not_stop_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/poems/top/all"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    mount_listing(&server, Some(3), listing_html(&["/poem/late"], 3)).await;
    mount_listing(&server, None, listing_html(&["/poem/early"], 3)).await;
    mount_poem(&server, "/poem/early", poem_html("P", "Early", &["x"], None)).await;
    mount_poem(&server, "/poem/late", poem_html("P", "Late", &["y"], None)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("poems.csv");
    let stats = run_crawl(create_test_config(&server, &output))
        .await
        .expect("Crawl failed");

    let titles: Vec<String> = CsvSink::read_records(&output)
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["Early", "Late"]);
    assert_eq!(stats.skipped_pages, vec![2]);
}

#[tokio::test]
async fn test_start_page_and_max_pages() {
    let server = MockServer::start().await;
    mount_listing(&server, Some(2), listing_html(&["/poem/two"], 4)).await;
    mount_listing(&server, Some(3), listing_html(&["/poem/three"], 4)).await;
    mount_listing(&server, None, listing_html(&["/poem/one"], 4)).await;
    mount_poem(&server, "/poem/two", poem_html("P", "Two", &["x"], None)).await;
    mount_poem(&server, "/poem/three", poem_html("P", "Three", &["x"], None)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("poems.csv");
    let mut config = create_test_config(&server, &output);
    config.crawl = CrawlConfig {
        start_page: 2,
        max_pages: 2,
    };

    let coordinator = Coordinator::new(&config).unwrap();
    let mut sink = CsvSink::open(&output).unwrap();
    let stats = coordinator.run(&mut sink).await.expect("Crawl failed");

    assert_eq!(stats.pages_processed, 2);
    assert_eq!(sink.cursor().next_row(), 3);
    let titles: Vec<String> = CsvSink::read_records(&output)
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["Two", "Three"]);
}
