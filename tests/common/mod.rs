//! Shared utilities for gateway integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use admin_gateway::config::GatewayConfig;
use admin_gateway::{GatewayServer, Shutdown};
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower::ServiceExt;

/// Default config pointed at `backend` (catalog operations).
pub fn config_for(backend: Option<&str>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.backend.base_url = backend.map(String::from);
    config.backend.request_timeout_secs = 2;
    config.backend.connect_timeout_secs = 1;
    config
}

/// Send one request through the in-process router.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

pub fn json(body: &Bytes) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

/// An address nothing is listening on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A gateway served on a local port.
pub struct Served {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<GatewayConfig>,
    shutdown: Shutdown,
    task: JoinHandle<std::io::Result<()>>,
}

impl Served {
    /// Trigger shutdown and wait for the server to drain.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}

pub async fn serve(server: GatewayServer) -> Served {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (updates, rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, rx, shutdown.subscribe()));

    Served {
        addr,
        updates,
        shutdown,
        task,
    }
}
