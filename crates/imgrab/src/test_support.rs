//! Stub HTTP server for fetch tests.
//!
//! This module is available for local tests and optionally for downstream
//! crate tests when the `test-utils` feature is enabled. The server runs on its
//! own thread and runtime so blocking schedulers can be exercised from plain
//! `#[test]` functions.
//!
//! Routes:
//! - `/images/{name}` → 200, body `image:{name}`
//! - `/alt/{name}` → 200, body `alt:{name}`
//! - `/slow/{name}` → 200 after [`StubServer::SLOW_DELAY`], body `image:{name}`
//! - `/large/{name}` → 200, [`StubServer::LARGE_BODY_LEN`] deterministic bytes
//! - `/missing/{name}` → 404, body [`StubServer::NOT_FOUND_BODY`]
//! - `/trickle/{name}` → 200, [`StubServer::trickle_body`] sent in
//!   [`StubServer::TRICKLE_CHUNKS`] chunks, [`StubServer::TRICKLE_INTERVAL`] apart
//! - `/broken/{name}` → 200, one chunk then the connection is aborted

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::StreamExt;
use tokio::sync::oneshot;

pub struct StubServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubServer {
    pub const NOT_FOUND_BODY: &'static str = "<html><body>404 Not Found</body></html>";
    pub const LARGE_BODY_LEN: usize = 512 * 1024;
    pub const SLOW_DELAY: Duration = Duration::from_millis(150);
    pub const TRICKLE_CHUNKS: usize = 4;
    pub const TRICKLE_CHUNK_LEN: usize = 64 * 1024;
    pub const TRICKLE_INTERVAL: Duration = Duration::from_millis(100);

    /// Bind to an ephemeral port on 127.0.0.1 and serve until dropped.
    pub fn start() -> Self {
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .expect("stub server runtime");

            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind stub server");
                addr_tx
                    .send(listener.local_addr().expect("stub server address"))
                    .expect("report stub server address");

                axum::serve(listener, router())
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("stub server");
            });
        });

        let addr = addr_rx.recv().expect("stub server did not start");
        Self {
            addr,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn image_body(name: &str) -> Vec<u8> {
        format!("image:{name}").into_bytes()
    }

    pub fn alt_body(name: &str) -> Vec<u8> {
        format!("alt:{name}").into_bytes()
    }

    pub fn large_body() -> Vec<u8> {
        (0..Self::LARGE_BODY_LEN).map(|i| (i % 251) as u8).collect()
    }

    pub fn trickle_body() -> Vec<u8> {
        vec![b'A'; Self::TRICKLE_CHUNKS * Self::TRICKLE_CHUNK_LEN]
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn router() -> Router {
    Router::new()
        .route("/images/{name}", get(image))
        .route("/alt/{name}", get(alt))
        .route("/slow/{name}", get(slow))
        .route("/large/{name}", get(large))
        .route("/missing/{name}", get(missing))
        .route("/trickle/{name}", get(trickle))
        .route("/broken/{name}", get(broken))
}

async fn image(Path(name): Path<String>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], StubServer::image_body(&name))
}

async fn alt(Path(name): Path<String>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], StubServer::alt_body(&name))
}

async fn slow(Path(name): Path<String>) -> impl IntoResponse {
    tokio::time::sleep(StubServer::SLOW_DELAY).await;
    ([(header::CONTENT_TYPE, "image/png")], StubServer::image_body(&name))
}

async fn large(Path(_name): Path<String>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        StubServer::large_body(),
    )
}

async fn missing(Path(_name): Path<String>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html")],
        StubServer::NOT_FOUND_BODY,
    )
}

async fn trickle(Path(_name): Path<String>) -> impl IntoResponse {
    let chunks = futures::stream::iter(0..StubServer::TRICKLE_CHUNKS).then(|i| async move {
        if i > 0 {
            tokio::time::sleep(StubServer::TRICKLE_INTERVAL).await;
        }
        Ok::<_, std::io::Error>(vec![b'A'; StubServer::TRICKLE_CHUNK_LEN])
    });
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(chunks),
    )
}

async fn broken(Path(_name): Path<String>) -> impl IntoResponse {
    let chunks = futures::stream::iter(0..2).then(|i| async move {
        if i == 0 {
            Ok(vec![b'B'; 1024])
        } else {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(std::io::Error::other("stream aborted"))
        }
    });
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(chunks),
    )
}
