use super::helpers::*;
use hyper::{Body, Client, Method, Request, StatusCode};
use sharecloud::infrastructure::server;
use std::net::{SocketAddr, TcpListener};

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let ctx = test_context();

    tokio::spawn(async move {
        if let Err(e) = server::serve(listener, ctx, std::future::pending()).await {
            eprintln!("Test server error: {}", e);
        }
    });

    addr
}

#[tokio::test]
async fn test_share_link_over_http() {
    let addr = start_server().await;
    let client = Client::new();

    let payload = create_upload_payload(b"Hello, ShareCloud!", "hello.txt", Some("text/plain"));
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("http://{}/", addr))
        .header("content-type", "application/json")
        .body(Body::from(payload))
        .unwrap();
    let response = client.request(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let id = json["file"]["id"].as_str().unwrap();

    let uri = format!("http://{}/file/{}/download", addr, id).parse().unwrap();
    let response = client.get(uri).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert_eq!(bytes.as_ref(), b"Hello, ShareCloud!");
}

#[tokio::test]
async fn test_session_cookie_is_issued_once() {
    let addr = start_server().await;
    let client = Client::new();

    let uri = format!("http://{}/", addr).parse().unwrap();
    let response = client.get(uri).await.unwrap();
    let cookie = response
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("sharecloud_session="));

    let session = cookie.split(';').next().unwrap().to_string();
    let request = Request::builder()
        .uri(format!("http://{}/", addr))
        .header("cookie", session)
        .body(Body::empty())
        .unwrap();
    let response = client.request(request).await.unwrap();
    assert!(response.headers().get("set-cookie").is_none());
}
