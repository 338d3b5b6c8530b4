use std::sync::Arc;
use std::time::Duration;

use restglue::handler::{HandlerResult, Request};
use restglue::http::Response;
use restglue::server::{create_reusable_listener, serve_listener, ConnectionSettings};
use restglue::{AppConfig, Application};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test]
async fn test_serves_requests_over_tcp() {
    let mut app = Application::new(&AppConfig::default());
    app.route("GET", "/ping", |_: &Request| -> HandlerResult {
        Ok(Response::ok("pong"))
    })
    .unwrap();

    let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let settings = ConnectionSettings {
        keep_alive: true,
        timeout: Duration::from_secs(5),
    };
    let server = tokio::spawn(serve_listener(listener, Arc::new(app), settings, async move {
        let _ = stopped.await;
    }));

    let response = roundtrip(
        addr,
        "GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.contains("content-type: text/plain; charset=utf-8"));
    assert!(response.ends_with("pong"));

    let response = roundtrip(
        addr,
        "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found"), "{response}");

    stop.send(()).unwrap();
    server.await.unwrap();
}
