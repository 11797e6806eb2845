mod common;

use std::time::{Duration, Instant};

use common::{closed_port_url, quote_client, quote_server, QUOTES_PATH};
use joker::config::{ClientOptions, KEYWORDS, QUOTE_FALLBACK, QUOTE_FALLBACK_AUTHOR};
use joker::error::FetchError;
use joker::mock::MockResponse;
use joker::quotes::QuoteClient;
use joker::types::ContentResult;

fn fallback() -> ContentResult {
    ContentResult::quote(QUOTE_FALLBACK, QUOTE_FALLBACK_AUTHOR)
}

#[tokio::test]
async fn fetch_quote_maps_first_element() {
    let server = quote_server(vec![MockResponse::quotes([
        ("Be yourself.", "Oscar Wilde"),
        ("Ignored.", "Nobody"),
    ])])
    .await;
    let client = quote_client(&server, Duration::from_secs(10));

    assert_eq!(
        client.fetch_quote().await,
        ContentResult::quote("Be yourself.", "Oscar Wilde")
    );

    let recorded = server.requests_for(QUOTES_PATH).await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].method, "GET");

    let keyword = recorded[0]
        .path
        .strip_prefix("/api/random/")
        .expect("keyword is the last path segment");
    assert!(KEYWORDS.contains(&keyword), "unexpected keyword {keyword}");

    server.shutdown().await;
}

#[tokio::test]
async fn fetch_with_keyword_uses_given_keyword() {
    let server = quote_server(vec![MockResponse::quotes([("Now.", "Someone")])]).await;
    let client = quote_client(&server, Duration::from_secs(10));

    client
        .fetch_with_keyword("Today")
        .await
        .expect("quote fetch succeeds");

    let recorded = server.recorded_requests().await;
    assert_eq!(recorded[0].path, "/api/random/Today");

    server.shutdown().await;
}

#[tokio::test]
async fn non_success_status_falls_back() {
    let server = quote_server(vec![
        MockResponse::json(serde_json::json!({ "error": "rate limited" })).with_status(429)
    ])
    .await;
    let client = quote_client(&server, Duration::from_secs(10));

    assert!(matches!(
        client.fetch_with_keyword("Love").await,
        Err(FetchError::UpstreamStatus { status: 429, .. })
    ));
    assert_eq!(client.fetch_quote().await, fallback());

    server.shutdown().await;
}

#[tokio::test]
async fn malformed_body_falls_back() {
    let server = quote_server(vec![
        MockResponse::text("<html>maintenance</html>"),
        MockResponse::json(serde_json::json!([])),
    ])
    .await;
    let client = quote_client(&server, Duration::from_secs(10));

    assert_eq!(client.fetch_quote().await, fallback());
    assert!(matches!(
        client.fetch_with_keyword("Pain").await,
        Err(FetchError::MalformedResponse(_))
    ));

    server.shutdown().await;
}

#[tokio::test]
async fn slow_upstream_times_out_to_fallback() {
    let server = quote_server(vec![MockResponse::quotes([("Too late.", "Slowpoke")])
        .with_delay(Duration::from_secs(3))])
    .await;
    let client = quote_client(&server, Duration::from_millis(150));

    let started = Instant::now();
    assert_eq!(client.fetch_quote().await, fallback());
    assert!(started.elapsed() < Duration::from_secs(2));

    assert!(matches!(
        client.fetch_with_keyword("Past").await,
        Err(FetchError::Timeout(_))
    ));

    server.shutdown().await;
}

#[tokio::test]
async fn unreachable_upstream_falls_back() {
    let options = ClientOptions::from_base_url(closed_port_url(QUOTES_PATH).await)
        .expect("loopback url parses")
        .with_timeout(Duration::from_secs(5));
    let client = QuoteClient::with_options(options).expect("quote client builds");

    assert!(matches!(
        client.fetch_with_keyword("Fear").await,
        Err(FetchError::Network(_))
    ));
    assert_eq!(client.fetch_quote().await, fallback());
}
