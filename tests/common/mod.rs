#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::Response;
use joker::config::ClientOptions;
use joker::mistral::{MistralClient, MistralModel};
use joker::mock::{MockResponse, MockRoute, MockUpstreamServer};
use joker::quotes::QuoteClient;
use joker::selector::ContentSelector;

pub const QUOTES_PATH: &str = "/api/random";
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const TEST_KEY: &str = "mock-mistral-key";

pub async fn quote_server(responders: Vec<MockResponse>) -> MockUpstreamServer {
    MockUpstreamServer::start(vec![MockRoute::new(QUOTES_PATH, responders)])
        .await
        .expect("quote mock server starts")
}

pub async fn completion_server(responders: Vec<MockResponse>) -> MockUpstreamServer {
    MockUpstreamServer::start(vec![MockRoute::new(COMPLETIONS_PATH, responders)])
        .await
        .expect("completion mock server starts")
}

pub fn quote_client(server: &MockUpstreamServer, timeout: Duration) -> QuoteClient {
    let options = ClientOptions::for_mock_server(server, QUOTES_PATH)
        .expect("client options for mock server")
        .with_timeout(timeout);

    QuoteClient::with_options(options).expect("quote client builds")
}

pub fn joke_client(server: &MockUpstreamServer, timeout: Duration) -> MistralClient {
    let options = ClientOptions::for_mock_server(server, COMPLETIONS_PATH)
        .expect("client options for mock server")
        .with_timeout(timeout);

    MistralClient::with_options(MistralModel::MistralMedium, TEST_KEY, options)
        .expect("mistral client builds")
}

/// Every coin flip lands on quotes.
pub fn quotes_only(client: QuoteClient) -> ContentSelector {
    let client = Arc::new(client);
    ContentSelector::new(client.clone(), client)
}

/// Every coin flip lands on jokes.
pub fn jokes_only(client: MistralClient) -> ContentSelector {
    let client = Arc::new(client);
    ContentSelector::new(client.clone(), client)
}

/// A loopback address nothing listens on.
pub async fn closed_port_url(path: &str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    format!("http://{}{}", addr, path)
}

pub async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("full body never fails")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("response body is json")
}
