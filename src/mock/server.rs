use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Mutex};
use tracing::warn;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn body_as_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    pub fn body_as_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Responses served for requests to `path` or anything below it.
#[derive(Clone, Debug)]
pub struct MockRoute {
    path: String,
    responders: Vec<MockResponse>,
}

impl MockRoute {
    pub fn new(path: impl Into<String>, responders: Vec<MockResponse>) -> Self {
        Self {
            path: path.into(),
            responders,
        }
    }

    pub fn single(path: impl Into<String>, responder: MockResponse) -> Self {
        Self::new(path, vec![responder])
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    status: u16,
    content_type: &'static str,
    body: String,
    delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/plain",
            body: body.into(),
            delay: None,
        }
    }

    pub fn quotes<I, Q, A>(quotes: I) -> Self
    where
        I: IntoIterator<Item = (Q, A)>,
        Q: Into<String>,
        A: Into<String>,
    {
        let quotes = quotes
            .into_iter()
            .map(|(q, a)| {
                let (q, a): (String, String) = (q.into(), a.into());
                let h = format!(
                    "<blockquote>&ldquo;{}&rdquo; &mdash; <footer>{}</footer></blockquote>",
                    q, a
                );
                serde_json::json!({ "q": q, "a": a, "h": h })
            })
            .collect();

        Self::json(serde_json::Value::Array(quotes))
    }

    pub fn chat_completion(content: impl Into<String>) -> Self {
        Self::json(serde_json::json!({
            "id": "cmpl-mock",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": content.into(),
                    },
                    "finish_reason": "stop"
                }
            ],
            "usage": {
                "prompt_tokens": 3,
                "completion_tokens": 2,
                "total_tokens": 5
            }
        }))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Holds the response back for `delay` before writing anything.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Clone, Debug)]
struct RouteState {
    responders: Vec<MockResponse>,
    call_count: usize,
}

impl RouteState {
    fn next(&mut self) -> Option<MockResponse> {
        if self.responders.is_empty() {
            return None;
        }

        let idx = self.call_count.min(self.responders.len() - 1);
        self.call_count += 1;
        Some(self.responders[idx].clone())
    }
}

struct MockServerState {
    routes: Mutex<HashMap<String, RouteState>>,
    recordings: Mutex<Vec<RecordedRequest>>,
}

impl MockServerState {
    async fn next_response(&self, path: &str) -> Option<MockResponse> {
        let mut routes = self.routes.lock().await;
        let key = routes
            .keys()
            .filter(|route| route_matches(route, path))
            .max_by_key(|route| route.len())
            .cloned()?;

        routes.get_mut(&key).and_then(|route| route.next())
    }

    async fn record_request(&self, record: RecordedRequest) {
        let mut recordings = self.recordings.lock().await;
        recordings.push(record);
    }

    async fn recordings(&self) -> Vec<RecordedRequest> {
        let recordings = self.recordings.lock().await;
        recordings.clone()
    }
}

fn route_matches(route: &str, path: &str) -> bool {
    path == route
        || path
            .strip_prefix(route.trim_end_matches('/'))
            .is_some_and(|rest| rest.starts_with('/'))
}

pub struct MockUpstreamServer {
    addr: SocketAddr,
    state: Arc<MockServerState>,
    shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    join_handle: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl MockUpstreamServer {
    pub async fn start(routes: Vec<MockRoute>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(MockServerState {
            routes: Mutex::new(
                routes
                    .into_iter()
                    .map(|route| {
                        (
                            route.path,
                            RouteState {
                                responders: route.responders,
                                call_count: 0,
                            },
                        )
                    })
                    .collect(),
            ),
            recordings: Mutex::new(Vec::new()),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let state_clone = state.clone();
        let join_handle = tokio::spawn(async move {
            run_server(listener, state_clone, shutdown_rx).await;
        });

        Ok(Self {
            addr,
            state,
            shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
            join_handle: Arc::new(Mutex::new(Some(join_handle))),
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.join_handle.lock().await.take() {
            let _ = handle.await;
        }
    }

    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.state.recordings().await
    }

    pub async fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .recordings()
            .await
            .into_iter()
            .filter(|record| route_matches(path, &record.path))
            .collect()
    }
}

impl Drop for MockUpstreamServer {
    fn drop(&mut self) {
        if let Ok(mut tx_opt) = self.shutdown_tx.try_lock() {
            if let Some(tx) = tx_opt.take() {
                let _ = tx.send(());
            }
        }

        if let Ok(mut handle_opt) = self.join_handle.try_lock() {
            if let Some(handle) = handle_opt.take() {
                handle.abort();
            }
        }
    }
}

async fn run_server(
    listener: TcpListener,
    state: Arc<MockServerState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => {
                break;
            }
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _)) => {
                        let state_clone = state.clone();
                        tokio::spawn(async move {
                            let _ = handle_connection(stream, state_clone).await;
                        });
                    }
                    Err(err) => {
                        warn!("mock server accept error: {}", err);
                        break;
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    state: Arc<MockServerState>,
) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut temp = [0u8; 1024];
    let mut head: Option<(usize, ParsedHead)> = None;

    loop {
        let n = stream.read(&mut temp).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&temp[..n]);

        if head.is_none() {
            if let Some(end) = find_header_end(&buffer) {
                head = Some((end, parse_request_head(&buffer[..end])));
            }
        }

        if let Some((end, parsed)) = &head {
            if buffer.len() >= end + parsed.content_length {
                break;
            }
        }
    }

    let Some((header_end, head)) = head else {
        return Ok(());
    };

    let body = if buffer.len() >= header_end + head.content_length {
        buffer[header_end..header_end + head.content_length].to_vec()
    } else {
        Vec::new()
    };

    state
        .record_request(RecordedRequest {
            method: head.method,
            path: head.path.clone(),
            headers: head.headers,
            body,
        })
        .await;

    match state.next_response(&head.path).await {
        Some(response) => send_response(response, &mut stream).await,
        None => send_not_found(&mut stream).await,
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|idx| idx + 4)
}

struct ParsedHead {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    content_length: usize,
}

fn parse_request_head(buffer: &[u8]) -> ParsedHead {
    let head = String::from_utf8_lossy(buffer);
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();

    let mut headers = HashMap::new();
    let mut content_length = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let key = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if key == "content-length" {
                content_length = value.parse().unwrap_or(0);
            }
            headers.insert(key, value);
        }
    }

    ParsedHead {
        method,
        path,
        headers,
        content_length,
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}

async fn send_not_found(stream: &mut TcpStream) -> std::io::Result<()> {
    let body = b"Not Found";
    let response = format!(
        "HTTP/1.1 404 Not Found\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.write_all(body).await
}

async fn send_response(response: MockResponse, stream: &mut TcpStream) -> std::io::Result<()> {
    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }

    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason_phrase(response.status),
        response.content_type,
        response.body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(response.body.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_match_exact_and_nested_paths() {
        assert!(route_matches("/api/random", "/api/random"));
        assert!(route_matches("/api/random", "/api/random/Love"));
        assert!(route_matches("/api/random/", "/api/random/Love"));
        assert!(!route_matches("/api/random", "/api/randomness"));
        assert!(!route_matches("/v1/chat/completions", "/api/random/Love"));
    }

    #[tokio::test]
    async fn serves_and_records_requests() {
        let server = MockUpstreamServer::start(vec![MockRoute::single(
            "/v1/chat/completions",
            MockResponse::chat_completion("hello").with_status(201),
        )])
        .await
        .expect("server starts");

        let mut stream = TcpStream::connect(server.address()).await.expect("connects");
        stream
            .write_all(
                b"POST /v1/chat/completions HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2\r\n\r\nok",
            )
            .await
            .expect("writes request");

        let mut response = String::new();
        let mut reader = tokio::io::BufReader::new(stream);
        reader
            .read_to_string(&mut response)
            .await
            .expect("reads response");

        assert!(response.starts_with("HTTP/1.1 201"));
        assert!(response.contains("\"content\":\"hello\""));

        let records = server.requests_for("/v1/chat/completions").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, "POST");
        assert_eq!(records[0].body_as_string().unwrap(), "ok");

        server.shutdown().await;
    }
}
