//! Integration tests for thread crawling against a mock forum.

use chrono::NaiveDate;
use futures_util::TryStreamExt;
use sa_thread_scraper::config::Config;
use sa_thread_scraper::{ForumClient, Post, ScrapeError};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const THREAD_ID: &str = "123456";
const THREAD_PAGE: &str = include_str!("fixtures/thread_page.html");
const THREAD_PAGE_SINGLE: &str = include_str!("fixtures/thread_page_single.html");
const THREAD_PAGE_2: &str = include_str!("fixtures/thread_page_2.html");
const THREAD_PAGE_3: &str =
    r#"<html><body><div class="pages"><a>1</a><a>2</a></div></body></html>"#;

/// Create a test configuration pointing at the mock server.
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    Config {
        base_url: server.uri(),
        cookies_file_path: dir.path().join("cookies.json"),
        ..Config::for_testing()
    }
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/account.php"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/index.php")
                .append_header("set-cookie", "bbuserid=42; path=/")
                .append_header("set-cookie", "bbpassword=hash; path=/"),
        )
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_number: Option<&str>, body: &str, hits: u64) {
    let mock = Mock::given(method("GET"))
        .and(path("/showthread.php"))
        .and(query_param("threadid", THREAD_ID));
    let mock = match page_number {
        Some(n) => mock.and(query_param("pagenumber", n)).and(query_param("perpage", "40")),
        None => mock.and(query_param_is_missing("pagenumber")),
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(hits)
        .mount(server)
        .await;
}

async fn collect(client: &mut ForumClient) -> Vec<Post> {
    client
        .posts()
        .try_collect()
        .await
        .expect("Failed to crawl thread")
}

fn authors(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.author.as_str()).collect()
}

#[tokio::test]
async fn test_crawl_walks_every_page_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    mount_page(&server, None, THREAD_PAGE, 1).await;
    mount_page(&server, Some("2"), THREAD_PAGE_2, 1).await;
    mount_page(&server, Some("3"), THREAD_PAGE_3, 1).await;

    let config = create_test_config(&server, &dir);
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();
    let posts = collect(&mut client).await;

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["12345", "12346", "12347", "12348", "12349", "12350"]);
    assert_eq!(
        authors(&posts),
        ["TestUser1", "TestUser2", "Adbot", "TestUser3", "TestUser4", "TestUser5"]
    );
    assert_eq!(posts[0].text, "This is the first test post content.");
    assert_eq!(
        posts[0].timestamp,
        NaiveDate::from_ymd_opt(2025, 10, 22)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    );
}

#[tokio::test]
async fn test_stopping_early_fetches_no_further_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    mount_page(&server, None, THREAD_PAGE, 1).await;
    mount_page(&server, Some("2"), THREAD_PAGE_2, 0).await;
    mount_page(&server, Some("3"), THREAD_PAGE_3, 0).await;

    let config = create_test_config(&server, &dir);
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();

    let mut posts = client.posts();
    let first = posts.try_next().await.unwrap().expect("Expected a post");
    assert_eq!(first.id, "12345");

    // Draining page 1 still must not touch page 2.
    for _ in 0..3 {
        posts.try_next().await.unwrap().expect("Expected a post");
    }
}

#[tokio::test]
async fn test_single_page_thread_fetches_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    mount_page(&server, None, THREAD_PAGE_SINGLE, 1).await;

    let config = create_test_config(&server, &dir);
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();
    let posts = collect(&mut client).await;

    assert_eq!(posts.len(), 4);
}

#[tokio::test]
async fn test_user_and_bot_posts() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    mount_page(&server, None, THREAD_PAGE_SINGLE, 2).await;

    let config = create_test_config(&server, &dir);
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();

    let users: Vec<Post> = client.user_posts().try_collect().await.unwrap();
    assert_eq!(authors(&users), ["TestUser1", "TestUser2", "TestUser3"]);

    let bots: Vec<Post> = client.bot_posts().try_collect().await.unwrap();
    assert_eq!(authors(&bots), ["Adbot"]);
}

#[tokio::test]
async fn test_own_posts_count_as_bot_posts() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    mount_page(&server, None, THREAD_PAGE_SINGLE, 1).await;

    let config = Config {
        username: Some("TestUser2".to_string()),
        ..create_test_config(&server, &dir)
    };
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();

    let bots: Vec<Post> = client.bot_posts().try_collect().await.unwrap();
    assert_eq!(authors(&bots), ["TestUser2", "Adbot"]);
}

#[tokio::test]
async fn test_my_posts_after_cutoff() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    mount_page(&server, None, THREAD_PAGE_SINGLE, 1).await;

    let config = Config {
        username: Some("TestUser2".to_string()),
        ..create_test_config(&server, &dir)
    };
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();

    let cutoff = NaiveDate::from_ymd_opt(2025, 10, 22)
        .unwrap()
        .and_hms_opt(11, 0, 0)
        .unwrap();
    let mine: Vec<Post> = client.my_posts(cutoff).try_collect().await.unwrap();

    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].author, "TestUser2");
    assert_eq!(mine[0].id, "12346");
}

#[tokio::test]
async fn test_posts_by_user_asks_forum_to_filter() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/showthread.php"))
        .and(query_param("threadid", THREAD_ID))
        .and(query_param("userid", "77"))
        .respond_with(ResponseTemplate::new(200).set_body_string(THREAD_PAGE_SINGLE))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, &dir);
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();
    let posts: Vec<Post> = client.posts_by_user("77").try_collect().await.unwrap();

    assert_eq!(posts.len(), 4);
}

#[tokio::test]
async fn test_missing_thread_id_sends_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let config = create_test_config(&server, &dir);
    let mut client = ForumClient::new(&config, None).await.unwrap();

    let err = client.posts().try_next().await.unwrap_err();
    assert!(matches!(err, ScrapeError::Precondition(_)), "{err:?}");

    let err = client.page(1).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Precondition(_)), "{err:?}");

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_page_reports_page_count() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    mount_page(&server, Some("2"), THREAD_PAGE_2, 1).await;

    let config = create_test_config(&server, &dir);
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();
    let page = client.page(2).await.unwrap();

    assert_eq!(page.page_count, 2);
    assert_eq!(authors(&page.posts), ["TestUser4", "TestUser5"]);
}

#[tokio::test]
async fn test_requests_carry_session_cookies() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/showthread.php"))
        .and(header("cookie", "bbpassword=hash; bbuserid=42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(THREAD_PAGE_SINGLE))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, &dir);
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();
    let page = client.page(1).await.unwrap();

    assert_eq!(page.posts.len(), 4);
}

#[tokio::test]
async fn test_fetched_pages_are_backed_up() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    mount_page(&server, None, THREAD_PAGE, 1).await;
    mount_page(&server, Some("2"), THREAD_PAGE_2, 1).await;
    mount_page(&server, Some("3"), THREAD_PAGE_3, 1).await;

    let backup_dir = dir.path().join("pages");
    let config = Config {
        page_backup_dir: Some(backup_dir.clone()),
        ..create_test_config(&server, &dir)
    };
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();
    collect(&mut client).await;

    for n in 1..=3 {
        let file = backup_dir.join(format!("thread-{THREAD_ID}-page-{n}.html"));
        assert!(file.exists(), "missing {}", file.display());
    }
    let page_2 = std::fs::read_to_string(backup_dir.join("thread-123456-page-2.html")).unwrap();
    assert!(page_2.contains("Page 2"));
}

#[tokio::test]
async fn test_western_charset_is_decoded_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;

    let body = b"<html><body><table><tr id=\"post555\">\
        <td class=\"author\">Jos\xe9</td>\
        <td class=\"postdate\">Oct 22, 2025 10:30</td>\
        <td class=\"postbody\">\x93caf\xe9\x94</td>\
        </tr></table></body></html>"
        .to_vec();
    Mock::given(method("GET"))
        .and(path("/showthread.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html; charset=windows-1252"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, &dir);
    let mut client = ForumClient::new(&config, Some(THREAD_ID.to_string()))
        .await
        .unwrap();
    let posts = collect(&mut client).await;

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author, "Jos\u{e9}");
    assert_eq!(posts[0].text, "\u{201c}caf\u{e9}\u{201d}");
}
