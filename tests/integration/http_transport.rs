//! Client tests over real HTTP against a mock server

use bgg_client::fetcher::cache::CacheConfig;
use bgg_client::fetcher::transport::ReqwestTransport;
use bgg_client::fetcher::Transport;
use bgg_client::{BggClient, ClientConfig, FetcherError, HotItemKind, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOT_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<items termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
    <item id="13" rank="2"><thumbnail value="https://example.org/13.jpg"/><name value="Catan"/><yearpublished value="1995"/></item>
    <item id="822" rank="1"><thumbnail value="https://example.org/822.jpg"/><name value="Carcassonne"/><yearpublished value="2000"/></item>
</items>"#;

fn xml(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), "text/xml; charset=utf-8")
}

fn config(server: &MockServer, retry: RetryPolicy) -> ClientConfig {
    ClientConfig {
        api_endpoint: format!("{}/xmlapi2", server.uri()),
        retry,
        ..ClientConfig::uncached()
    }
}

fn quick_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        retry_delay: Duration::from_millis(10),
        ..RetryPolicy::default()
    }
}

/// Client with its own connection pool and no rate limiter
fn client(config: ClientConfig, cache: CacheConfig) -> BggClient {
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(reqwest::Client::new()));
    BggClient::with_transport(config, cache.wrap(transport)).unwrap()
}

#[tokio::test]
async fn test_hot_items_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xmlapi2/hot"))
        .and(query_param("type", "boardgame"))
        .respond_with(xml(200, HOT_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let bgg = client(config(&server, quick_retries(3)), CacheConfig::None);
    let hot = bgg.hot_items(HotItemKind::BoardGame).await.unwrap();

    assert_eq!(hot.len(), 2);
    assert_eq!(hot.items[0].name, "Carcassonne");
    assert_eq!(hot.items[1].id, 13);
}

#[tokio::test]
async fn test_first_page_has_no_page_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xmlapi2/guild"))
        .and(query_param("id", "1229"))
        .and(query_param_is_missing("page"))
        .respond_with(xml(
            200,
            r#"<guild id="1229" name="Geekcon"><members count="1" page="1"><member name="alice" date="2012-01-01"/></members></guild>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let bgg = client(config(&server, quick_retries(3)), CacheConfig::None);
    let guild = bgg.fetch_guild(1229, None, true).await.unwrap();

    assert_eq!(guild.members, vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_overload_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xmlapi2/hot"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/xmlapi2/hot"))
        .respond_with(xml(200, HOT_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let bgg = client(config(&server, quick_retries(3)), CacheConfig::None);
    let hot = bgg.hot_items(HotItemKind::BoardGame).await.unwrap();

    assert_eq!(hot.len(), 2);
}

#[tokio::test]
async fn test_rate_limited_with_retries_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xmlapi2/hot"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let bgg = client(config(&server, quick_retries(0)), CacheConfig::None);
    let err = bgg.hot_items(HotItemKind::BoardGame).await.unwrap_err();

    assert!(matches!(
        err,
        FetcherError::RetryExhausted {
            attempts: 1,
            max_retries: 0
        }
    ));
}

#[tokio::test]
async fn test_other_status_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xmlapi2/hot"))
        .respond_with(xml(500, "<error>Internal failure</error>"))
        .expect(1)
        .mount(&server)
        .await;

    let bgg = client(config(&server, quick_retries(3)), CacheConfig::None);
    let err = bgg.hot_items(HotItemKind::BoardGame).await.unwrap_err();

    match err {
        FetcherError::Http { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("Internal failure"));
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_html_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xmlapi2/hot"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html><body>maintenance</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let bgg = client(config(&server, quick_retries(3)), CacheConfig::None);
    let err = bgg.hot_items(HotItemKind::BoardGame).await.unwrap_err();

    assert!(matches!(err, FetcherError::Protocol(_)));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xmlapi2/hot"))
        .respond_with(xml(200, HOT_BODY).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let retry = RetryPolicy {
        timeout: Duration::from_millis(100),
        ..quick_retries(1)
    };
    let bgg = client(config(&server, retry), CacheConfig::None);
    let err = bgg.hot_items(HotItemKind::BoardGame).await.unwrap_err();

    assert!(matches!(err, FetcherError::Timeout { attempts: 2 }));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let config = ClientConfig {
        api_endpoint: "http://127.0.0.1:9/xmlapi2".to_string(),
        retry: quick_retries(3),
        ..ClientConfig::uncached()
    };
    let bgg = client(config, CacheConfig::None);

    let err = bgg.hot_items(HotItemKind::BoardGame).await.unwrap_err();
    assert!(matches!(err, FetcherError::Network(_)));
}

#[tokio::test]
async fn test_file_cache_answers_repeated_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xmlapi2/hot"))
        .respond_with(xml(200, HOT_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheConfig::from_uri(&format!("file://{}?ttl=3600", dir.path().display())).unwrap();
    assert!(matches!(cache, CacheConfig::File { .. }));

    let bgg = client(config(&server, quick_retries(3)), cache.clone());
    let first = bgg.hot_items(HotItemKind::BoardGame).await.unwrap();

    // a second client reads the same directory
    let bgg = client(config(&server, quick_retries(3)), cache);
    let second = bgg.hot_items(HotItemKind::BoardGame).await.unwrap();

    assert_eq!(first, second);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_some());
}

#[tokio::test]
async fn test_failed_responses_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xmlapi2/hot"))
        .respond_with(xml(500, "<error/>"))
        .expect(2)
        .mount(&server)
        .await;

    let bgg = client(
        config(&server, quick_retries(3)),
        CacheConfig::Memory {
            ttl: Duration::from_secs(3600),
        },
    );
    assert!(bgg.hot_items(HotItemKind::BoardGame).await.is_err());
    assert!(bgg.hot_items(HotItemKind::BoardGame).await.is_err());
}
