//! End-to-end tests over a real TCP socket.
//!
//! A listener is bound on an ephemeral localhost port and driven with raw
//! HTTP/1.1 requests, so the framing, form decoding, routing, and status
//! mapping are all exercised together with the controller.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use hookcfg_server::domain::ServerConfig;
use hookcfg_server::infrastructure::{build_state, serve, MAX_LINE_BYTES};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ── Helpers ───────────────────────────────────────────────────────────────────

struct TestServer {
    addr: std::net::SocketAddr,
    running: Arc<AtomicBool>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

fn admin_config() -> ServerConfig {
    ServerConfig {
        administrators: vec!["alice".to_string()],
        ..ServerConfig::default()
    }
}

async fn start() -> TestServer {
    start_with(admin_config()).await
}

async fn start_with(config: ServerConfig) -> TestServer {
    let state = Arc::new(build_state(&config, true).expect("state builds"));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(serve(listener, state, Arc::clone(&running)));
    TestServer { addr, running }
}

/// Sends `raw` and returns the full response text.
async fn exchange(server: &TestServer, raw: &str) -> String {
    exchange_bytes(server, raw.as_bytes()).await
}

async fn exchange_bytes(server: &TestServer, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

fn get(path: &str, user: Option<&str>) -> String {
    let user_line = user
        .map(|u| format!("X-Remote-User: {u}\r\n"))
        .unwrap_or_default();
    format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n{user_line}\r\n")
}

fn post(path: &str, user: &str, body: &str) -> String {
    format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nX-Remote-User: {user}\r\n\
         Content-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

const ADMIN_PATH: &str = "/plugins/servlet/yacc/admin";

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_anonymous_get_is_401() {
    let server = start().await;

    let response = exchange(&server, &get(ADMIN_PATH, None)).await;

    assert!(response.starts_with("HTTP/1.1 401 Unauthorized\r\n"), "{response}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_admin_get_renders_form() {
    let server = start().await;

    let response = exchange(&server, &get(ADMIN_PATH, Some("alice"))).await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    assert!(response.contains("Content-Type: text/html;charset=UTF-8\r\n"));
    assert!(response.contains(r#"name="issueKeyPattern""#));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bad_pattern_post_redisplays_form() {
    // Arrange
    let server = start().await;

    // Act
    let response = exchange(
        &server,
        &post(ADMIN_PATH, "alice", "issueKeyPattern=BADPATTERN%28&submit=Save"),
    )
    .await;

    // Assert
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    assert!(response.contains("not a valid pattern"));
    assert!(response.contains(r#"value="BADPATTERN(""#));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_valid_post_redirects_and_get_shows_saved_value() {
    // Arrange
    let server = start().await;

    // Act
    let saved = exchange(
        &server,
        &post(ADMIN_PATH, "alice", "requireMatchingAuthorEmail=true&submit=Save"),
    )
    .await;
    let shown = exchange(&server, &get("/", Some("alice"))).await;

    // Assert
    assert!(saved.starts_with("HTTP/1.1 302 Found\r\n"), "{saved}");
    assert!(saved.contains("Location: /plugins/servlet/upm\r\n"));
    assert!(shown.contains(r#"name="requireMatchingAuthorEmail" value="true""#));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_path_is_404_and_unknown_method_is_405() {
    let server = start().await;

    let not_found = exchange(&server, &get("/favicon.ico", Some("alice"))).await;
    let not_allowed = exchange(
        &server,
        "DELETE / HTTP/1.1\r\nHost: localhost\r\nX-Remote-User: alice\r\n\r\n",
    )
    .await;

    assert!(not_found.starts_with("HTTP/1.1 404 Not Found\r\n"), "{not_found}");
    assert!(not_allowed.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
    assert!(not_allowed.contains("Allow: GET, POST\r\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_post_is_415() {
    let server = start().await;
    let raw = "POST / HTTP/1.1\r\nX-Remote-User: alice\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}";

    let response = exchange(&server, raw).await;

    assert!(response.starts_with("HTTP/1.1 415 "), "{response}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_body_is_413() {
    let server = start().await;
    let raw = "POST / HTTP/1.1\r\nX-Remote-User: alice\r\nContent-Length: 10000000\r\n\r\n";

    let response = exchange(&server, raw).await;

    assert!(response.starts_with("HTTP/1.1 413 "), "{response}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chunked_post_is_400_and_keeps_saved_settings() {
    // Arrange: save a known snapshot first
    let server = start().await;
    let seeded = exchange(&server, &post(ADMIN_PATH, "alice", "issueKeyPattern=ABC")).await;
    assert!(seeded.starts_with("HTTP/1.1 302 Found\r\n"), "{seeded}");
    let chunked = "POST / HTTP/1.1\r\nX-Remote-User: alice\r\n\
                   Content-Type: application/x-www-form-urlencoded\r\n\
                   Transfer-Encoding: chunked\r\n\r\n\
                   1f\r\nrequireMatchingAuthorEmail=true\r\n0\r\n\r\n";

    // Act
    let response = exchange(&server, chunked).await;
    let shown = exchange(&server, &get("/", Some("alice"))).await;

    // Assert
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{response}");
    assert!(shown.contains(r#"name="issueKeyPattern" value="ABC""#), "{shown}");
    assert!(shown.contains(r#"name="requireMatchingAuthorEmail" value="""#));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_utf8_request_is_400() {
    let server = start().await;

    let response = exchange_bytes(&server, b"GET /\xff HTTP/1.1\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{response}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_header_is_400() {
    let server = start().await;
    let raw = format!(
        "GET / HTTP/1.1\r\nX-Remote-User: alice\r\nX-Filler: {}\r\n\r\n",
        "a".repeat(MAX_LINE_BYTES * 4)
    );

    let response = exchange(&server, &raw).await;

    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{response}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_silent_client_gets_408() {
    // Arrange
    let server = start_with(ServerConfig {
        request_timeout_ms: 200,
        ..admin_config()
    })
    .await;

    // Act: connect and send nothing
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    // Assert
    assert!(response.starts_with("HTTP/1.1 408 Request Timeout\r\n"), "{response}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_anonymous_json_post_is_401() {
    let server = start().await;
    let raw = "POST / HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}";

    let response = exchange(&server, raw).await;

    assert!(response.starts_with("HTTP/1.1 401 Unauthorized\r\n"), "{response}");
}
