//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use rackgate::http::{Handler, HttpServer};
use rackgate::lifecycle::Shutdown;

/// Start a mock backend that answers every request with its own request head.
///
/// Each connection serves one request and is closed.
#[allow(dead_code)]
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            head.len()
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.write_all(&head).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Serve `handler` on an ephemeral port. Returns the address and the
/// shutdown handle; triggering it closes the handler chain.
#[allow(dead_code)]
pub async fn start_server(handler: Arc<dyn Handler>) -> (SocketAddr, Arc<Shutdown>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Shutdown::new());

    let server = HttpServer::new(handler);
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    (addr, shutdown)
}

/// A body-less GET for `host` and `target`.
#[allow(dead_code)]
pub fn get(host: &str, target: &str) -> Request<Body> {
    Request::builder()
        .uri(target)
        .header("host", host)
        .body(Body::empty())
        .unwrap()
}

/// Collect a response body as text.
#[allow(dead_code)]
pub async fn body_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
