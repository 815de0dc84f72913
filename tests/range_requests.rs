//! End-to-end tests over a real TCP listener

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Request, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use media_range_server::config::{AppState, Config};
use media_range_server::server;

const CONTENT: &[u8] = b"fake mkv content for testing range requests";

struct TestServer {
    base: String,
    client: Client<HttpConnector, Empty<Bytes>>,
    shutdown: Arc<Notify>,
    handle: JoinHandle<usize>,
    big: Vec<u8>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test.mkv"), CONTENT).unwrap();
        let big: Vec<u8> = (0..(2 * 1024 * 1024 + 777)).map(|i: usize| (i % 241) as u8).collect();
        std::fs::write(dir.path().join("big.mp4"), &big).unwrap();

        let mut config = Config::load_from("no-such-config-file").unwrap();
        config.media.root = dir.path().to_string_lossy().into_owned();
        config.logging.access_log = false;
        let state = Arc::new(AppState::new(config).unwrap());

        let listener = server::create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(server::run(listener, state, Arc::clone(&shutdown)));

        Self {
            base: format!("http://{addr}"),
            client: Client::builder(TokioExecutor::new()).build_http(),
            shutdown,
            handle,
            big,
            _dir: dir,
        }
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        range: Option<&str>,
    ) -> (StatusCode, HeaderMap, Bytes) {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{path}", self.base));
        if let Some(r) = range {
            builder = builder.header("Range", r);
        }
        let resp = self.client.request(builder.body(Empty::new()).unwrap()).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    async fn get(&self, path: &str, range: Option<&str>) -> (StatusCode, HeaderMap, Bytes) {
        self.request(Method::GET, path, range).await
    }

    async fn stop(self) {
        self.shutdown.notify_one();
        self.handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_full_and_partial_over_tcp() {
    let server = TestServer::start().await;

    let (status, headers, body) = server.get("/test.mkv", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-length"], "43");
    assert_eq!(headers["accept-ranges"], "bytes");
    assert_eq!(body.as_ref(), CONTENT);

    let (status, headers, body) = server.get("/test.mkv", Some("bytes=0-3")).await;
    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(headers["content-range"], "bytes 0-3/43");
    assert_eq!(body.as_ref(), b"fake");

    server.stop().await;
}

#[tokio::test]
async fn test_window_spanning_chunks_over_tcp() {
    let server = TestServer::start().await;
    let total = server.big.len();
    let start = 1024 * 1024 - 10;
    let end = total - 5;

    let header = format!("bytes={start}-{end}");
    let (status, headers, body) = server.get("/big.mp4", Some(&header)).await;
    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        headers["content-range"],
        format!("bytes {start}-{end}/{total}").as_str()
    );
    assert_eq!(body.len(), end - start + 1);
    assert_eq!(body.as_ref(), &server.big[start..=end]);

    server.stop().await;
}

#[tokio::test]
async fn test_errors_over_tcp() {
    let server = TestServer::start().await;

    let (status, headers, _) = server.get("/test.mkv", Some("bytes=50-60")).await;
    assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(headers["content-range"], "bytes */43");

    let (status, _, _) = server.get("/test.mkv", Some("bytes=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = server.get("/%2e%2e/%2e%2e/etc/passwd", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.as_ref(), b"Access denied");

    let (status, _, _) = server.get("/missing.mkv", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = server.request(Method::DELETE, "/test.mkv", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    server.stop().await;
}

#[tokio::test]
async fn test_keep_alive_reuses_connection() {
    let server = TestServer::start().await;
    for _ in 0..5 {
        let (status, _, body) = server.get("/test.mkv", Some("bytes=5-7")).await;
        assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(body.as_ref(), b"mkv");
    }
    let (status, headers, _) = server.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "text/html; charset=utf-8");
    server.stop().await;
}
