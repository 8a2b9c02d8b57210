//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use docsift::config::CrawlerConfig;
use docsift::crawler::{CrawlRequest, Crawler};
use docsift::state::PageState;
use std::collections::BTreeMap;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a crawler config suited to a local mock server
fn create_test_config(max_depth: u32) -> CrawlerConfig {
    CrawlerConfig {
        max_depth,
        request_timeout: 5,
        user_agent: "docsift-test/1.0".to_string(),
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_writes_index() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/", "<h1>Welcome</h1><p>Hello</p>", 1).await;

    let out = TempDir::new().unwrap();
    let report = Crawler::new(&create_test_config(5))
        .crawl(&CrawlRequest::new(base_url.clone(), out.path()))
        .await
        .expect("Crawl failed");

    let index = out.path().join("index.md");
    assert_eq!(report.written, vec![index.clone()]);

    let content = std::fs::read_to_string(&index).unwrap();
    assert_eq!(content.lines().next(), Some(format!("# {}", base_url).as_str()));
    assert!(content.contains("# Welcome"));
    assert!(content.contains("Hello"));

    let files: Vec<_> = std::fs::read_dir(out.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn test_external_links_are_never_fetched() {
    let site = MockServer::start().await;
    let external = MockServer::start().await;

    mount_page(
        &site,
        "/",
        &format!(
            r#"<a href="{}/elsewhere">Other site</a><a href="/about">About</a>"#,
            external.uri()
        ),
        1,
    )
    .await;
    mount_page(&site, "/about", "About us", 1).await;

    Mock::given(method("GET"))
        .respond_with(html("should not be fetched"))
        .expect(0)
        .mount(&external)
        .await;

    let out = TempDir::new().unwrap();
    let report = Crawler::new(&create_test_config(5))
        .crawl(&CrawlRequest::new(site.uri(), out.path()))
        .await
        .unwrap();

    assert_eq!(report.pages_fetched(), 2);
    assert_eq!(report.out_of_scope, 1);
    assert!(out.path().join("about.md").exists());
}

#[tokio::test]
async fn test_cycles_fetch_each_page_once() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a">A</a><a href="/b">B</a><a href="/a#top">A again</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/a", r#"<a href="/">Home</a><a href="/b">B</a>"#, 1).await;
    mount_page(&mock_server, "/b", r#"<a href="/a">A</a><a href="/">Home</a>"#, 1).await;

    let out = TempDir::new().unwrap();
    let report = Crawler::new(&create_test_config(5))
        .crawl(&CrawlRequest::new(mock_server.uri(), out.path()))
        .await
        .unwrap();

    assert_eq!(report.pages_fetched(), 3);
    assert_eq!(report.count(PageState::Processed), 3);

    let mut fetched: Vec<String> = report.fetched.iter().map(|u| u.path().to_string()).collect();
    fetched.sort();
    assert_eq!(fetched, vec!["/", "/a", "/b"]);
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;

    // Chain: / -> /d1 -> /d2 -> /d3
    mount_page(&mock_server, "/", r#"<a href="/d1">1</a>"#, 1).await;
    mount_page(&mock_server, "/d1", r#"<a href="/d2">2</a>"#, 1).await;
    mount_page(&mock_server, "/d2", r#"<a href="/d3">3</a>"#, 1).await;
    mount_page(&mock_server, "/d3", "too deep", 0).await;

    let out = TempDir::new().unwrap();
    let report = Crawler::new(&create_test_config(2))
        .crawl(&CrawlRequest::new(mock_server.uri(), out.path()))
        .await
        .unwrap();

    assert_eq!(report.pages_fetched(), 3, "Expected exactly 3 fetched pages");
    assert_eq!(report.depth_limited, 1);
    assert!(out.path().join("d2.md").exists());
    assert!(!out.path().join("d3.md").exists());
}

#[tokio::test]
async fn test_dead_link_abandons_branch_only() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/docs/guide">Guide</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/docs/guide", "Read me", 1).await;

    let out = TempDir::new().unwrap();
    let report = Crawler::new(&create_test_config(5))
        .crawl(&CrawlRequest::new(mock_server.uri(), out.path()))
        .await
        .expect("a dead link must not fail the crawl");

    assert_eq!(report.count(PageState::DeadLink), 1);
    assert_eq!(report.count(PageState::Processed), 2);
    assert!(out.path().join("docs_guide.md").exists());
    assert!(!out.path().join("missing.md").exists());
}

#[tokio::test]
async fn test_server_error_is_counted_as_failed() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/broken">Broken</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let out = TempDir::new().unwrap();
    let report = Crawler::new(&create_test_config(5))
        .crawl(&CrawlRequest::new(mock_server.uri(), out.path()))
        .await
        .unwrap();

    assert_eq!(report.count(PageState::Failed), 1);
    assert_eq!(report.written.len(), 1);
}

#[tokio::test]
async fn test_content_type_handling() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/manual.pdf">PDF</a><a href="/page">Page</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<a href="/hidden">not really html</a>"#,
            "application/pdf",
        ))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/page", "Content", 1).await;
    mount_page(&mock_server, "/hidden", "never linked from HTML", 0).await;

    let out = TempDir::new().unwrap();
    let report = Crawler::new(&create_test_config(5))
        .crawl(&CrawlRequest::new(mock_server.uri(), out.path()))
        .await
        .unwrap();

    assert_eq!(report.count(PageState::ContentMismatch), 1);
    assert!(!out.path().join("manual.pdf.md").exists());
    assert!(out.path().join("page.md").exists());
}

#[tokio::test]
async fn test_headers_and_cookies_are_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("x-api-token", "secret"))
        .and(header("cookie", "lang=en; session=abc"))
        .respond_with(html(r#"<a href="/next">Next</a>"#))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut headers = BTreeMap::new();
    headers.insert("X-Api-Token".to_string(), "secret".to_string());
    let mut cookies = BTreeMap::new();
    cookies.insert("session".to_string(), "abc".to_string());
    cookies.insert("lang".to_string(), "en".to_string());

    let out = TempDir::new().unwrap();
    let request = CrawlRequest::new(mock_server.uri(), out.path())
        .with_headers(headers)
        .with_cookies(cookies);

    let report = Crawler::new(&create_test_config(5))
        .crawl(&request)
        .await
        .unwrap();

    assert_eq!(report.count(PageState::Processed), 2);
}

#[tokio::test]
async fn test_output_directory_is_created() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Hi", 1).await;

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("nested/output");

    Crawler::new(&create_test_config(5))
        .crawl(&CrawlRequest::new(mock_server.uri(), &out))
        .await
        .unwrap();

    assert!(out.join("index.md").exists());
}

#[tokio::test]
async fn test_unwritable_page_does_not_abort_crawl() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/blocked">Blocked</a><a href="/ok">Ok</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/blocked", r#"<a href="/behind">Behind</a>"#, 1).await;
    mount_page(&mock_server, "/behind", "only linked from the unwritten page", 0).await;
    mount_page(&mock_server, "/ok", "Fine", 1).await;

    // A directory squatting on the target name makes the write fail
    let out = TempDir::new().unwrap();
    std::fs::create_dir(out.path().join("blocked.md")).unwrap();

    let report = Crawler::new(&create_test_config(5))
        .crawl(&CrawlRequest::new(mock_server.uri(), out.path()))
        .await
        .expect("a failed write must not fail the crawl");

    assert_eq!(report.count(PageState::Failed), 1);
    assert_eq!(report.count(PageState::Processed), 2);
    assert!(out.path().join("ok.md").exists());
    assert!(out.path().join("blocked.md").is_dir());
    assert_eq!(report.written.len(), 2);
}

#[tokio::test]
async fn test_off_site_redirect_is_not_followed() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(&site, "/", r#"<a href="/go">Go</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/secret", other.uri()).as_str()),
        )
        .expect(1)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .respond_with(html("off-site"))
        .expect(0)
        .mount(&other)
        .await;

    let out = TempDir::new().unwrap();
    let report = Crawler::new(&create_test_config(5))
        .crawl(&CrawlRequest::new(site.uri(), out.path()))
        .await
        .unwrap();

    assert_eq!(report.count(PageState::Failed), 1);
    assert_eq!(report.out_of_scope, 1);
    assert!(out.path().join("index.md").exists());
    assert!(!out.path().join("go.md").exists());
    assert!(!out.path().join("secret.md").exists());
}

#[tokio::test]
async fn test_same_site_redirect_is_followed() {
    let site = MockServer::start().await;

    mount_page(&site, "/", r#"<a href="/old">Old</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/new", site.uri()).as_str()),
        )
        .expect(1)
        .mount(&site)
        .await;
    mount_page(&site, "/new", "Moved here", 1).await;

    let out = TempDir::new().unwrap();
    let report = Crawler::new(&create_test_config(5))
        .crawl(&CrawlRequest::new(site.uri(), out.path()))
        .await
        .unwrap();

    assert_eq!(report.count(PageState::Processed), 2);
    let content = std::fs::read_to_string(out.path().join("old.md")).unwrap();
    assert!(content.contains("Moved here"));
}
