//! Shared utilities for integration tests.
//!
//! Backends are raw TCP listeners on `127.0.0.1:0` that parse just enough
//! HTTP/1.1 to record the request and write a canned response.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use service_gateway::config::{GatewayConfig, RouteConfig, RunMode};
use service_gateway::health::HealthMonitor;
use service_gateway::{GatewayServer, Registry, Shutdown};

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
    /// Wait before writing anything.
    pub delay: Duration,
    /// Write this many body bytes, then pause before the rest.
    pub stall_after: Option<(usize, Duration)>,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "application/json",
            delay: Duration::ZERO,
            stall_after: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn stalling_after(mut self, bytes: usize, pause: Duration) -> Self {
        self.stall_after = Some((bytes, pause));
        self
    }

    pub fn health(status: &str) -> Self {
        Self::json(200, format!(r#"{{"status":"{}"}}"#, status))
    }
}

type Responder = dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync;

pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder: Arc<Responder> = Arc::new(responder);

        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let responder = responder.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let _ = serve_one(socket, responder, recorded).await;
                });
            }
        });

        Self { addr, requests }
    }

    /// Healthy backend that echoes its name and the path it received.
    pub async fn named(name: &'static str) -> Self {
        Self::start(move |req| {
            if req.target == "/health" {
                MockResponse::health("ok")
            } else {
                MockResponse::json(
                    200,
                    format!(r#"{{"backend":"{}","path":"{}"}}"#, name, req.target),
                )
            }
        })
        .await
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests other than health probes.
    pub fn hits(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.target != "/health")
            .count()
    }
}

async fn serve_one(
    mut socket: TcpStream,
    responder: Arc<Responder>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    let request = RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    };
    let response = responder(&request);
    recorded.lock().unwrap().push(request);

    tokio::time::sleep(response.delay).await;

    let reason = StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.content_type,
        response.body.len(),
    );
    socket.write_all(head.as_bytes()).await?;

    let body = response.body.as_bytes();
    match response.stall_after {
        Some((bytes, pause)) if bytes < body.len() => {
            socket.write_all(&body[..bytes]).await?;
            socket.flush().await?;
            tokio::time::sleep(pause).await;
            socket.write_all(&body[bytes..]).await?;
        }
        _ => socket.write_all(body).await?,
    }
    socket.shutdown().await
}

/// A base URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Development mode, periodic checks off (tests drive cycles by hand), and
/// two unprotected routes: `/api/tasks` and `/api/users`.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.mode = RunMode::Development;
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.health_check.enabled = false;
    config.health_check.timeout_ms = 500;
    config.timeouts.request_ms = 2_000;
    config.timeouts.connect_ms = 500;
    config.routes = vec![
        route("tasks", "/api/tasks", "task-service", false),
        route("users", "/api/users", "user-service", false),
    ];
    config
}

pub fn route(name: &str, prefix: &str, service: &str, protected: bool) -> RouteConfig {
    RouteConfig {
        name: name.to_string(),
        path_prefix: prefix.to_string(),
        service: service.to_string(),
        strip_prefix: Some("/api".to_string()),
        protected,
    }
}

/// A running gateway on an ephemeral port. Dropping it shuts the server down.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub registry: Arc<Registry>,
    pub monitor: Arc<HealthMonitor>,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestGateway {
    pub async fn start(config: GatewayConfig) -> Self {
        let listener = TcpListener::bind(&config.listener.bind_address)
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();

        let server = GatewayServer::new(config);
        let registry = server.registry();
        let monitor = server.monitor();
        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            addr,
            registry,
            monitor,
            client,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
