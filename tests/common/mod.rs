//! Shared utilities for the failover integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Counts requests a mock backend has served, split by path.
#[derive(Default)]
pub struct HitCounter {
    health: AtomicUsize,
    other: AtomicUsize,
}

impl HitCounter {
    pub fn health_hits(&self) -> usize {
        self.health.load(Ordering::SeqCst)
    }

    pub fn other_hits(&self) -> usize {
        self.other.load(Ordering::SeqCst)
    }
}

/// A mock backend bound to an ephemeral port.
pub struct MockBackend {
    pub addr: SocketAddr,
    pub hits: Arc<HitCounter>,
    /// Raw request heads, in arrival order, for header assertions.
    pub heads: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections; subsequent connects are refused.
    pub fn stop(self) {
        self.handle.abort();
    }
}

/// Start a mock backend whose handler maps request path -> (status, body).
pub async fn start_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(HitCounter::default());
    let heads = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let task_hits = hits.clone();
    let task_heads = heads.clone();
    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let hits = task_hits.clone();
                    let heads = task_heads.clone();
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 4096];
                        loop {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => {
                                    buf.extend_from_slice(&chunk[..n]);
                                    if request_complete(&buf) {
                                        break;
                                    }
                                }
                            }
                        }
                        let head = String::from_utf8_lossy(&buf).to_string();
                        let path = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("/")
                            .to_string();

                        if path.starts_with("/health") {
                            hits.health.fetch_add(1, Ordering::SeqCst);
                        } else {
                            hits.other.fetch_add(1, Ordering::SeqCst);
                        }
                        heads.lock().unwrap().push(head);

                        let (status, body) = f(path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend {
        addr,
        hits,
        heads,
        handle,
    }
}

/// True once the head and any Content-Length body have fully arrived.
fn request_complete(buf: &[u8]) -> bool {
    let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&buf[..head_end]);
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    buf.len() >= head_end + 4 + content_length
}

/// A healthy backend answering 200 everywhere with a fixed body.
pub async fn start_healthy_backend(body: &'static str) -> MockBackend {
    start_backend(move |_path| async move { (200, body.to_string()) }).await
}

/// An address with nothing listening on it; connections are refused.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
