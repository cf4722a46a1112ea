use beacon::http::parser::ParseSink;
use beacon::http::request::{Method, Request, RequestAccumulator};
use std::collections::HashMap;

#[test]
fn test_request_header_retrieval() {
    let mut headers = HashMap::new();
    headers.insert("Host".to_string(), "example.com".to_string());
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    let req = Request {
        method: Method::GET,
        url: "/".to_string(),
        headers,
        body: vec![],
        bytes_read: 0,
    };

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_content_length_parsing() {
    let mut headers = HashMap::new();
    headers.insert("Content-Length".to_string(), "42".to_string());

    let req = Request {
        method: Method::POST,
        url: "/api".to_string(),
        headers,
        body: vec![],
        bytes_read: 0,
    };

    assert_eq!(req.content_length(), 42);
}

#[test]
fn test_request_content_length_missing() {
    let req = Request {
        method: Method::GET,
        url: "/".to_string(),
        headers: HashMap::new(),
        body: vec![],
        bytes_read: 0,
    };

    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_content_length_invalid() {
    let mut headers = HashMap::new();
    headers.insert("Content-Length".to_string(), "not-a-number".to_string());

    let req = Request {
        method: Method::POST,
        url: "/api".to_string(),
        headers,
        body: vec![],
        bytes_read: 0,
    };

    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_method_from_string() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("POST"), Some(Method::POST));
    assert_eq!(Method::from_str("INVALID"), None);
    assert_eq!(Method::from_str("get"), None); // Case-sensitive
}

#[test]
fn test_accumulator_builds_request_from_events() {
    let mut acc = RequestAccumulator::new();

    acc.on_message_begin();
    acc.on_url(Method::POST, "/upload");
    acc.on_header("Host", "example.com");
    acc.on_headers_complete();
    acc.on_body_chunk(b"ab");
    acc.on_body_chunk(b"c");
    acc.on_message_complete();

    let request = acc.take().unwrap();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url, "/upload");
    assert_eq!(request.headers.get("Host").unwrap(), "example.com");
    assert_eq!(request.body, b"abc".to_vec());
    assert_eq!(request.bytes_read, 3);
}

#[test]
fn test_accumulator_last_header_value_wins() {
    let mut acc = RequestAccumulator::new();

    acc.on_message_begin();
    acc.on_url(Method::GET, "/");
    acc.on_header("X-Foo", "1");
    acc.on_header("X-Foo", "2");
    acc.on_headers_complete();
    acc.on_message_complete();

    let request = acc.take().unwrap();
    assert_eq!(request.headers.get("X-Foo").unwrap(), "2");
    assert_eq!(request.headers.len(), 1);
}

#[test]
fn test_accumulator_resets_on_message_begin() {
    let mut acc = RequestAccumulator::new();

    acc.on_message_begin();
    acc.on_url(Method::GET, "/first");
    acc.on_header("X-Stale", "yes");
    acc.on_body_chunk(b"old");

    // a new message discards everything accumulated so far
    acc.on_message_begin();
    acc.on_url(Method::GET, "/second");
    acc.on_message_complete();

    let request = acc.take().unwrap();
    assert_eq!(request.url, "/second");
    assert!(request.headers.is_empty());
    assert!(request.body.is_empty());
    assert_eq!(request.bytes_read, 0);
}

#[test]
fn test_accumulator_take_without_request_line() {
    let mut acc = RequestAccumulator::new();
    assert!(acc.take().is_none());

    acc.on_message_begin();
    acc.on_header("Host", "example.com");
    assert!(acc.take().is_none());
}

#[test]
fn test_accumulator_take_leaves_it_empty() {
    let mut acc = RequestAccumulator::new();

    acc.on_message_begin();
    acc.on_url(Method::GET, "/");
    acc.on_message_complete();

    assert!(acc.take().is_some());
    assert!(acc.take().is_none());
}
