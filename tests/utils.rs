#![allow(dead_code)]

use std::net::TcpListener;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Renders `(response, done)` pairs as an NDJSON body.
pub fn ndjson(frames: &[(&str, bool)]) -> String {
    frames
        .iter()
        .map(|(response, done)| {
            let mut line = serde_json::json!({ "response": response, "done": done }).to_string();
            line.push('\n');
            line
        })
        .collect()
}

/// An endpoint nothing is listening on.
pub fn unused_endpoint() -> String {
    let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// Serves a single connection: writes `head` frames, then keeps the
/// connection open without sending anything else for `stall`.
pub async fn stalling_server(head: String, stall: Duration) -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/x-ndjson\r\nconnection: close\r\n\r\n{head}"
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(stall).await;
    });
    format!("http://{addr}")
}
