#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Minimal HTTP/1.1 server on 127.0.0.1 with a few fixed routes:
///
/// - `/ping` answers 200 `pong`
/// - `/login` answers 200 `{"token":"abc123"}`
/// - `/echo` answers 200 with a JSON echo of method, path, query, authorization and body
/// - `/slow` answers 200 after 300ms
/// - anything else answers 404
pub async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(handle(stream));
        }
    });
    format!("http://{}", addr)
}

struct Incoming {
    method: String,
    target: String,
    authorization: Option<String>,
    body: String,
}

async fn read_request(stream: &mut TcpStream) -> Option<Incoming> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim().to_string();
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "authorization" => authorization = Some(value),
                _ => {}
            }
        }
    }

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some(Incoming {
        method,
        target,
        authorization,
        body,
    })
}

async fn handle(mut stream: TcpStream) {
    let Some(req) = read_request(&mut stream).await else {
        return;
    };
    let (path, query) = match req.target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (req.target.clone(), String::new()),
    };

    let (status, body) = match path.as_str() {
        "/ping" => ("200 OK", "pong".to_string()),
        "/login" => ("200 OK", json!({"token": "abc123"}).to_string()),
        "/echo" => (
            "200 OK",
            json!({
                "method": req.method,
                "path": path,
                "query": query,
                "authorization": req.authorization,
                "body": req.body,
            })
            .to_string(),
        ),
        "/slow" => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            ("200 OK", "slow".to_string())
        }
        _ => ("404 Not Found", "not found".to_string()),
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
