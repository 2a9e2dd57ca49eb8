//! Exercises the real `ureq` transport against a one-shot local server.

use cfclient::{Client, ClientConfig, ErrorCategory, RequestOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

/// Captured request head and body.
struct Captured {
    request_line: String,
    headers: Vec<String>,
    body: Vec<u8>,
}

/// Serve exactly one request with a fixed status and body.
fn serve_once(status_line: &'static str, body: &'static str) -> (String, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = Vec::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end().to_string();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':')
                && name.eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse().unwrap();
            }
            headers.push(line);
        }

        let mut request_body = vec![0; content_length];
        reader.read_exact(&mut request_body).unwrap();

        let mut stream = stream;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();

        tx.send(Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: request_body,
        })
        .unwrap();
    });

    (format!("http://{addr}"), rx)
}

#[test]
fn test_not_found_surfaces_status_and_body() {
    let (url, rx) = serve_once("404 Not Found", r#"{"message":"not found"}"#);
    let client = Client::new(ClientConfig::new(url, "token-123"));

    let err = client
        .execute(&RequestOptions::get("/pipelines/missing"))
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("404 Not Found"), "got: {message}");
    assert!(message.contains(r#"{"message":"not found"}"#), "got: {message}");
    assert_eq!(err.category(), ErrorCategory::NotFound);

    let captured = rx.recv().unwrap();
    assert_eq!(captured.request_line, "GET /pipelines/missing HTTP/1.1");
}

#[test]
fn test_success_sends_raw_token_and_body() {
    let (url, rx) = serve_once("200 OK", r#"{"ok":true}"#);
    let client = Client::new(ClientConfig::new(url, "token-123"));

    let options = RequestOptions::post("/contexts")
        .query_param("x", "1")
        .json(&serde_json::json!({"metadata": {"name": "c"}}))
        .unwrap();
    let body = client.execute(&options).unwrap();
    assert_eq!(body, br#"{"ok":true}"#);

    let captured = rx.recv().unwrap();
    assert_eq!(captured.request_line, "POST /contexts?x=1 HTTP/1.1");
    assert!(
        captured
            .headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case("authorization: token-123"))
    );
    assert!(captured.headers.iter().any(|h| {
        h.to_ascii_lowercase()
            .starts_with("content-type: application/json; charset=utf-8")
    }));
    assert_eq!(captured.body, br#"{"metadata":{"name":"c"}}"#);
}

#[test]
fn test_connection_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::new(ClientConfig::new(format!("http://{addr}"), "t"));
    let err = client.execute(&RequestOptions::get("/x")).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Network);
}
