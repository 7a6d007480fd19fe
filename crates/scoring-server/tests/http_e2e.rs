//! HTTP round trips against a live server on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use scoring_api::MethodDispatcher;
use scoring_config::ServerConfig;
use scoring_server::{Server, ShutdownSignal};
use scoring_store::MemoryStore;

const USER_TOKEN: &str = "55cc9ce545bcd144300fe9efc28e65d415b923ebb6be1e19d2750a2c03e80dd209a27954dca045e5bb12418e7d89b6d718a9e35af34e14e1d5bcd5a08f21fc95";

struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownSignal,
    handle: JoinHandle<()>,
    store: Arc<MemoryStore>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ServerConfig {
            http_addr: "127.0.0.1:0".to_string(),
            shutdown_timeout_secs: 1,
            ..ServerConfig::default()
        })
        .await
    }

    async fn start_with(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let now = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let dispatcher = MethodDispatcher::new(store.clone()).with_fixed_time(now);

        let server = Server::bind(&config, dispatcher).await.unwrap();
        let addr = server.local_addr();
        let shutdown = ShutdownSignal::new();
        let handle = tokio::spawn(server.serve(shutdown.clone()));

        Self {
            addr,
            shutdown,
            handle,
            store,
        }
    }

    async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server should stop")
            .expect("server task should not panic");
    }
}

struct HttpReply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl HttpReply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    extra: &[(&str, &str)],
    body: &[u8],
) -> HttpReply {
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let mut head = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for (name, value) in extra {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    stream.write_all(head.as_bytes()).await.unwrap();
    stream.write_all(body).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let mut lines = head.lines();
    let status = lines
        .next()
        .unwrap()
        .split_whitespace()
        .nth(1)
        .unwrap()
        .parse()
        .unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    HttpReply {
        status,
        headers,
        body: body.to_string(),
    }
}

async fn post_method(addr: SocketAddr, body: &Value) -> HttpReply {
    send(addr, "POST", "/method", &[], body.to_string().as_bytes()).await
}

fn online_score_call() -> Value {
    json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "method": "online_score",
        "token": USER_TOKEN,
        "arguments": {
            "phone": "79175002040",
            "email": "stupnikov@otus.ru",
            "first_name": "Stanislav",
            "last_name": "Stupnikov",
            "birthday": "01.01.1990",
            "gender": 1
        }
    })
}

#[tokio::test]
async fn online_score_over_http() {
    let server = TestServer::start().await;

    let reply = post_method(server.addr, &online_score_call()).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("content-type"), Some("application/json"));
    assert!(reply.header("x-request-id").is_some());

    let body = reply.json();
    assert_eq!(body["code"], 200);
    assert!(body["response"]["score"].is_number());
    assert_eq!(body["response"]["score"], 5.0);

    server.stop().await;
}

#[tokio::test]
async fn missing_token_is_422() {
    let server = TestServer::start().await;

    let mut call = online_score_call();
    call.as_object_mut().unwrap().remove("token");

    let reply = post_method(server.addr, &call).await;
    assert_eq!(reply.status, 422);
    assert_eq!(
        reply.json(),
        json!({"error": "token: field is required", "code": 422})
    );

    server.stop().await;
}

#[tokio::test]
async fn bad_token_is_403() {
    let server = TestServer::start().await;

    let mut call = online_score_call();
    call["token"] = json!("nope");

    let reply = post_method(server.addr, &call).await;
    assert_eq!(reply.status, 403);
    assert_eq!(reply.json(), json!({"error": "Forbidden", "code": 403}));

    server.stop().await;
}

#[tokio::test]
async fn clients_interests_over_http() {
    let server = TestServer::start().await;
    server.store.insert("i:1", br#"["books"]"#.to_vec());

    let call = json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "method": "clients_interests",
        "token": USER_TOKEN,
        "arguments": {"client_ids": [1, 7]}
    });
    let reply = post_method(server.addr, &call).await;
    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.json(),
        json!({"response": {"1": ["books"], "7": []}, "code": 200})
    );

    server.store.set_available(false);
    let reply = post_method(server.addr, &call).await;
    assert_eq!(reply.status, 500);
    assert_eq!(
        reply.json(),
        json!({"error": "Internal Server Error", "code": 500})
    );

    server.stop().await;
}

#[tokio::test]
async fn request_id_is_echoed() {
    let server = TestServer::start().await;

    for request_id in [
        "0190f3b2c4d57e8f9a0b1c2d3e4f5a6b",
        "0190f3b2-c4d5-7e8f-9a0b-1c2d3e4f5a6b",
        "req-42",
    ] {
        let reply = send(
            server.addr,
            "POST",
            "/method",
            &[("X-Request-Id", request_id)],
            online_score_call().to_string().as_bytes(),
        )
        .await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.header("x-request-id"), Some(request_id));
    }

    // errors carry the caller's id too
    let reply = send(server.addr, "POST", "/nowhere", &[("X-Request-Id", "trace.7")], b"{}").await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.header("x-request-id"), Some("trace.7"));

    server.stop().await;
}

#[tokio::test]
async fn missing_request_id_is_generated() {
    let server = TestServer::start().await;

    let reply = post_method(server.addr, &online_score_call()).await;
    let generated = reply.header("x-request-id").unwrap();
    assert_eq!(generated.len(), 32);
    assert!(generated.bytes().all(|b| b.is_ascii_hexdigit()));

    server.stop().await;
}

#[tokio::test]
async fn malformed_bodies_are_400() {
    let server = TestServer::start().await;

    let bodies: [&[u8]; 4] = [b"", b"{not json", b"[1, 2]", b"\"text\""];
    for body in bodies {
        let reply = send(server.addr, "POST", "/method", &[], body).await;
        assert_eq!(reply.status, 400, "body {:?}", String::from_utf8_lossy(body));
        assert_eq!(reply.json(), json!({"error": "Bad Request", "code": 400}));
    }

    server.stop().await;
}

#[tokio::test]
async fn oversized_body_is_400() {
    let server = TestServer::start_with(ServerConfig {
        http_addr: "127.0.0.1:0".to_string(),
        max_body_bytes: 64,
        shutdown_timeout_secs: 1,
        ..ServerConfig::default()
    })
    .await;

    let reply = post_method(server.addr, &online_score_call()).await;
    assert_eq!(reply.status, 400);

    server.stop().await;
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let server = TestServer::start().await;

    let reply = send(server.addr, "POST", "/nowhere", &[], b"{}").await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.json(), json!({"error": "Not Found", "code": 404}));

    let reply = send(server.addr, "GET", "/method", &[], b"").await;
    assert_eq!(reply.status, 404);

    server.stop().await;
}

#[tokio::test]
async fn health_endpoint() {
    let server = TestServer::start().await;

    let reply = send(server.addr, "GET", "/health", &[], b"").await;
    assert_eq!(reply.status, 200);
    let body = reply.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], scoring_server::VERSION);

    server.stop().await;
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let server = TestServer::start().await;
    let addr = server.addr;
    server.stop().await;

    assert!(TcpStream::connect(addr).await.is_err());
}
