//! Shared utilities for integration tests.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request};
use axum::response::Response;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use pattern_router::{Dispatcher, HttpServer, RouterConfig};

/// Build a request with an empty body.
#[allow(dead_code)]
pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "example.test")
        .body(Body::empty())
        .unwrap()
}

/// Collect a response body as UTF-8.
#[allow(dead_code)]
pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A running server and the handle that stops it.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// Serve `dispatcher` (or the config's static routes) on an ephemeral local port.
#[allow(dead_code)]
pub async fn spawn_server(config: RouterConfig, dispatcher: Option<Dispatcher>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = match dispatcher {
        Some(dispatcher) => HttpServer::with_dispatcher(config, dispatcher),
        None => HttpServer::new(config).unwrap(),
    };

    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = server
            .run_until(listener, async {
                let _ = stopped.await;
            })
            .await;
    });

    TestServer {
        addr,
        stop: Some(stop),
    }
}

/// HTTP client that never pools or proxies.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
