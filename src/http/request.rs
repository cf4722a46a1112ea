use std::collections::HashMap;
use std::mem;

use crate::http::parser::ParseSink;

/// HTTP request methods.
///
/// Represents the HTTP method/verb of a request. Methods outside this
/// set are rejected by the parser as malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive, typically uppercase)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a known method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use beacon::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }
}

/// Represents a completed HTTP request delivered to the handler.
///
/// All fields are accumulated from parser events as bytes arrive on the
/// connection; a `Request` only exists once its message is complete.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request URL as it appeared on the request line
    pub url: String,
    /// Request headers; a repeated header name keeps its last value
    pub headers: HashMap<String, String>,
    /// Request body bytes
    pub body: Vec<u8>,
    /// Number of body bytes read off the wire for this request
    pub bytes_read: usize,
}

impl Request {
    /// Retrieves a header value by name.
    ///
    /// # Arguments
    ///
    /// * `key` - Header name to look up
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the header value if present, `None` otherwise.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Retrieves the Content-Length header value and parses it as a usize.
    ///
    /// Returns 0 if the header is missing or not a valid number.
    pub fn content_length(&self) -> usize {
        self.header("Content-Length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

/// Accumulates one request from parser events.
///
/// This is the sink the connection hands to the incremental parser.
/// A repeated header name overwrites the previous value (last value
/// wins, in byte-arrival order). `message-begin` resets the whole
/// accumulator, so one instance serves every request of a keep-alive
/// connection.
#[derive(Debug, Default)]
pub struct RequestAccumulator {
    method: Option<Method>,
    url: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    bytes_read: usize,
}

impl RequestAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the accumulated request out, leaving the accumulator empty.
    ///
    /// Returns `None` if no request line was ever seen.
    pub fn take(&mut self) -> Option<Request> {
        let method = self.method.take()?;
        Some(Request {
            method,
            url: mem::take(&mut self.url),
            headers: mem::take(&mut self.headers),
            body: mem::take(&mut self.body),
            bytes_read: mem::replace(&mut self.bytes_read, 0),
        })
    }
}

impl ParseSink for RequestAccumulator {
    fn on_message_begin(&mut self) {
        *self = Self::default();
    }

    fn on_url(&mut self, method: Method, url: &str) {
        self.method = Some(method);
        self.url = url.to_string();
    }

    fn on_header(&mut self, name: &str, value: &str) {
        // last value wins on duplicate field names
        self.headers.insert(name.to_string(), value.to_string());
    }

    fn on_headers_complete(&mut self) {}

    fn on_body_chunk(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
        self.bytes_read += chunk.len();
    }

    fn on_message_complete(&mut self) {}
}
