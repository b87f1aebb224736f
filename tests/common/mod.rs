//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use collect_proxy::config::ProxyConfig;
use collect_proxy::privacy::PrivacySetting;
use collect_proxy::registry::{ProxyRoute, VendorProxyConfig, VendorRegistry};
use collect_proxy::rewrite::RewriteRule;
use collect_proxy::{HttpServer, Shutdown};

/// Start a mock upstream that returns a fixed response and counts hits.
pub async fn start_mock_upstream(
    status: u16,
    content_type: &'static str,
    body: &'static str,
) -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let _ = read_request(&mut socket, &mut buf).await;
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nSet-Cookie: upstream=1\r\nX-Upstream: mock\r\nConnection: close\r\n\r\n{}",
                    status,
                    content_type,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, hits)
}

/// Start a mock upstream that captures the raw request text and replies 200.
pub async fn start_capturing_upstream() -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 64 * 1024];
                let request = read_request(&mut socket, &mut buf).await;
                let _ = tx.send(request);
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// Start a mock upstream that accepts connections but never responds.
pub async fn start_hanging_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            held.push(socket);
        }
    });
    addr
}

/// Read one HTTP request (headers plus content-length body) into a string.
async fn read_request(socket: &mut tokio::net::TcpStream, buf: &mut [u8]) -> String {
    let mut filled = 0;
    loop {
        let Ok(n) = socket.read(&mut buf[filled..]).await else {
            break;
        };
        if n == 0 {
            break;
        }
        filled += n;
        let text = String::from_utf8_lossy(&buf[..filled]);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text
                .lines()
                .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(str::trim).map(String::from))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            if filled >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf[..filled]).to_string()
}

/// Vendor config pointing the GA-shaped routes at a local mock upstream.
pub fn test_vendor(upstream: SocketAddr) -> VendorProxyConfig {
    VendorProxyConfig {
        vendor: "google-analytics".to_string(),
        rewrite: vec![
            RewriteRule::new("www.google-analytics.com", "/_scripts/c/ga"),
            RewriteRule::new(".google-analytics.com", "/_scripts/c/ga"),
        ],
        routes: vec![
            ProxyRoute {
                local_prefix: "/_scripts/c/ga".to_string(),
                upstream_origin: format!("http://{upstream}"),
            },
            ProxyRoute {
                local_prefix: "/_scripts/c/ga-legacy".to_string(),
                upstream_origin: format!("http://{upstream}"),
            },
        ],
        privacy_defaults: Some(PrivacySetting::All(true)),
    }
}

/// Spawn a proxy bound to an ephemeral port, returning its base URL, a
/// shutdown handle, and the server's diagnostics sink subscription.
pub async fn start_proxy(
    config: ProxyConfig,
    vendors: Vec<VendorProxyConfig>,
) -> (
    String,
    Shutdown,
    broadcast::Receiver<collect_proxy::http::ProxyDiagnostic>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let registry = VendorRegistry::from_vendors(vendors);
    let server = HttpServer::with_registry(config, registry);
    let diagnostics = server.diagnostics().subscribe();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (format!("http://{addr}"), shutdown, diagnostics)
}

/// Plain client without connection pooling, so each test sees fresh sockets.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
