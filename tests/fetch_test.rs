//! Fetch proxy tests
//!
//! Exercises the proxy end to end: requests go through a real reqwest
//! client against a throwaway local server, or through fakes when the
//! transport itself is under test.

mod common;

use async_trait::async_trait;
use beacon_bridge::config::FetchSettings;
use beacon_bridge::fetch::{
    FetchProxy, FetchRequest, HttpClient, HttpRequest, HttpResponse, ReqwestClient,
};
use beacon_bridge::script::OutboundQueue;
use beacon_bridge::{BridgeError, Result};
use common::{wait_for, RecordingExecutor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::Notify;

/// Client whose transport always fails
struct BrokenClient;

#[async_trait]
impl HttpClient for BrokenClient {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse> {
        Err(BridgeError::Http("connection refused".to_string()))
    }
}

/// Client that echoes the request back as the response body
struct EchoClient;

#[async_trait]
impl HttpClient for EchoClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: 201,
            headers: vec![
                ("Set-Cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
            ],
            body: format!("{} {}", request.method, request.url),
        })
    }
}

/// Client that answers only after its gate opens
struct GatedClient {
    gate: Arc<Notify>,
    calls: AtomicUsize,
}

impl GatedClient {
    fn new(gate: Arc<Notify>) -> Self {
        Self {
            gate,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HttpClient for GatedClient {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "late".to_string(),
        })
    }
}

fn proxy(client: Arc<dyn HttpClient>) -> (FetchProxy, Arc<RecordingExecutor>) {
    let (proxy, executor, _) = proxy_with_queue(client);
    (proxy, executor)
}

fn proxy_with_queue(
    client: Arc<dyn HttpClient>,
) -> (FetchProxy, Arc<RecordingExecutor>, Arc<OutboundQueue>) {
    let executor = Arc::new(RecordingExecutor::default());
    let queue = Arc::new(OutboundQueue::new(executor.clone()));
    queue.on_ready();
    let proxy = FetchProxy::new(client, Arc::clone(&queue), Handle::current());
    (proxy, executor, queue)
}

/// Decode the payload of a `resolveFetch('<id>', '<json>');` call
fn payload(script: &str, callback_id: &str) -> serde_json::Value {
    let prefix = format!("window.beaconBridge.resolveFetch('{}', '", callback_id);
    let json = script
        .strip_prefix(&prefix)
        .and_then(|rest| rest.strip_suffix("');"))
        .unwrap_or_else(|| panic!("unexpected script: {}", script));
    serde_json::from_str(&json.replace("\\'", "'").replace("\\\\", "\\")).unwrap()
}

/// Serve one canned HTTP response on a local port
async fn serve_once(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{}/status", addr)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reqwest_round_trip() {
    let url = serve_once(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nX-Trace: 7\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
    )
    .await;
    let client = ReqwestClient::new(&FetchSettings::default()).unwrap();
    let (proxy, executor) = proxy(Arc::new(client));

    proxy.request(FetchRequest::get(url), "cb1");
    assert!(wait_for(|| executor.scripts().len() == 1));

    let response = payload(&executor.scripts()[0], "cb1");
    assert_eq!(response["status"], 200);
    assert_eq!(response["body"], "ok");
    assert_eq!(response["contentType"], "text/plain");
    assert_eq!(response["headers"]["x-trace"], "7");
    assert!(proxy.correlations().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_url_resolves_immediately() {
    let (proxy, executor) = proxy(Arc::new(EchoClient));
    proxy.request(FetchRequest::get("not a url"), "cb2");
    proxy.request(FetchRequest::get("ftp://example.com/file"), "cb3");

    // No network round trip, so both are already delivered
    let scripts = executor.scripts();
    assert_eq!(scripts.len(), 2);
    assert_eq!(payload(&scripts[0], "cb2")["status"], 500);
    assert_eq!(payload(&scripts[1], "cb3")["status"], 500);
    assert!(proxy.correlations().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_transport_failure_becomes_500() {
    let (proxy, executor) = proxy(Arc::new(BrokenClient));
    proxy.request(FetchRequest::get("https://example.com/"), "cb4");
    assert!(wait_for(|| executor.scripts().len() == 1));

    let response = payload(&executor.scripts()[0], "cb4");
    assert_eq!(response["status"], 500);
    assert!(response["body"]
        .as_str()
        .unwrap()
        .starts_with("Error: "));
    assert!(response["body"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unparseable_request_json() {
    let (proxy, executor) = proxy(Arc::new(EchoClient));
    proxy.request_json("{\"method\": \"GET\"}", "cb5");
    proxy.request_json("garbage", "cb6");

    let scripts = executor.scripts();
    assert_eq!(scripts.len(), 2);
    assert_eq!(payload(&scripts[0], "cb5")["status"], 500);
    assert_eq!(payload(&scripts[1], "cb6")["status"], 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_method_and_repeated_headers() {
    let (proxy, executor) = proxy(Arc::new(EchoClient));
    proxy.request_json(
        r#"{"url": "https://example.com/items", "method": "delete"}"#,
        "cb7",
    );
    assert!(wait_for(|| executor.scripts().len() == 1));

    let response = payload(&executor.scripts()[0], "cb7");
    assert_eq!(response["status"], 201);
    assert_eq!(response["body"], "DELETE https://example.com/items");
    assert_eq!(response["headers"]["set-cookie"], "a=1, b=2");
    assert_eq!(response["contentType"], "application/json");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_suppressed_response_is_dropped() {
    // A server that never answers keeps the request in flight
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/hang", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let settings = FetchSettings {
        timeout: Duration::from_millis(300),
        ..FetchSettings::default()
    };
    let client = ReqwestClient::new(&settings).unwrap();
    let (proxy, executor) = proxy(Arc::new(client));

    proxy.request(FetchRequest::get(url), "cb8");
    assert!(proxy.correlations().contains("cb8"));
    assert_eq!(proxy.suppress_in_flight(), 1);

    // The timeout fires, but nobody is waiting any more
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(executor.scripts().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_response_for_reset_page_is_never_flushed() {
    let gate = Arc::new(Notify::new());
    let client = Arc::new(GatedClient::new(gate.clone()));
    let (proxy, executor, queue) = proxy_with_queue(client.clone());

    proxy.request(FetchRequest::get("https://example.com/slow"), "cb9");
    assert!(wait_for(|| client.calls.load(Ordering::SeqCst) == 1));

    // The page goes away while the entry is still tracked
    queue.reset();
    gate.notify_one();
    assert!(wait_for(|| proxy.correlations().is_empty()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(queue.pending_len(), 0);

    // The next page must not receive the old response
    queue.on_ready();
    assert!(executor.scripts().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reused_callback_id_is_rejected() {
    let gate = Arc::new(Notify::new());
    let client = Arc::new(GatedClient::new(gate.clone()));
    let (proxy, executor) = proxy(client.clone());

    proxy.request(FetchRequest::get("https://example.com/a"), "cb10");
    proxy.request(FetchRequest::get("https://example.com/b"), "cb10");

    // The duplicate is answered at once and never reaches the client
    let scripts = executor.scripts();
    assert_eq!(scripts.len(), 1);
    let rejected = payload(&scripts[0], "cb10");
    assert_eq!(rejected["status"], 500);
    assert!(rejected["body"].as_str().unwrap().contains("already in flight"));

    gate.notify_one();
    assert!(wait_for(|| executor.scripts().len() == 2));
    assert_eq!(payload(&executor.scripts()[1], "cb10")["body"], "late");
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}
