//! Incremental request parser driver.
//!
//! Wraps the `httparse` request parser into a streaming shape: bytes are
//! fed in as they arrive and structural events (message-begin, url,
//! header, headers-complete, body-chunk, message-complete) are emitted
//! into a [`ParseSink`] as soon as they can be recognized. Body framing
//! is `Content-Length` or its absence (no chunked encoding).
//!
//! Bytes past the end of a completed message stay buffered so pipelined
//! requests on a keep-alive connection are not lost; [`RequestParser::reset`]
//! rearms the parser for the next message without dropping them.

use std::fmt;

use bytes::BytesMut;

use crate::http::request::Method;

/// Parser limits, constructed once and handed to each connection.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum number of headers accepted per request.
    pub max_headers: usize,
    /// Maximum size of the request head (request line + headers).
    pub max_header_bytes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_headers: 32,
            max_header_bytes: 16 * 1024,
        }
    }
}

/// Receives structural events as the parser recognizes them.
///
/// Header events carry complete `(name, value)` pairs; a repeated name
/// is delivered once per occurrence, in byte-arrival order.
pub trait ParseSink {
    fn on_message_begin(&mut self);
    fn on_url(&mut self, method: Method, url: &str);
    fn on_header(&mut self, name: &str, value: &str);
    fn on_headers_complete(&mut self);
    fn on_body_chunk(&mut self, chunk: &[u8]);
    fn on_message_complete(&mut self);
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Request line carried a method outside the supported set.
    InvalidMethod,
    /// More headers than `ParserConfig::max_headers`.
    TooManyHeaders,
    /// Request head grew past `ParserConfig::max_header_bytes` without completing.
    HeadersTooLarge,
    /// Content-Length header present but not a valid length.
    InvalidContentLength,
    /// The underlying parser rejected the bytes.
    Malformed(httparse::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidMethod => write!(f, "invalid request method"),
            ParseError::TooManyHeaders => write!(f, "too many request headers"),
            ParseError::HeadersTooLarge => write!(f, "request head too large"),
            ParseError::InvalidContentLength => write!(f, "invalid Content-Length header"),
            ParseError::Malformed(e) => write!(f, "malformed request: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

/// Outcome of feeding bytes to the parser.
#[derive(Debug, PartialEq, Eq)]
pub enum Progress {
    /// More bytes are needed to complete the current message.
    Incomplete,
    /// The current message is complete; events have been delivered.
    Complete,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Headers,
    Body { remaining: usize },
    Complete,
}

/// Incremental parser state for one connection.
///
/// One instance persists across every request of a keep-alive
/// connection; call [`reset`](Self::reset) after each completed message.
pub struct RequestParser {
    config: ParserConfig,
    state: State,
    buf: BytesMut,
    begun: bool,
    upgrade: bool,
}

impl RequestParser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            state: State::Headers,
            buf: BytesMut::new(),
            begun: false,
            upgrade: false,
        }
    }

    /// Whether the current message asked for a protocol upgrade.
    pub fn upgrade_requested(&self) -> bool {
        self.upgrade
    }

    /// Bytes buffered past the current position (pipelined data).
    pub fn buffered_bytes(&self) -> usize {
        self.buf.len()
    }

    /// Drops all buffered bytes, returning how many were discarded.
    pub fn discard_buffered(&mut self) -> usize {
        let n = self.buf.len();
        self.buf.clear();
        n
    }

    /// Rearms the parser for the next message on the same connection.
    /// Buffered pipelined bytes are preserved.
    pub fn reset(&mut self) {
        self.state = State::Headers;
        self.begun = false;
        self.upgrade = false;
    }

    /// Feeds bytes and drives the parser as far as they allow, emitting
    /// events into `sink`. Stops after at most one complete message;
    /// surplus bytes stay buffered. An empty `input` drains buffered
    /// bytes only.
    pub fn advance(&mut self, input: &[u8], sink: &mut dyn ParseSink) -> Result<Progress, ParseError> {
        self.buf.extend_from_slice(input);

        loop {
            match self.state {
                State::Headers => {
                    if self.buf.is_empty() {
                        return Ok(Progress::Incomplete);
                    }
                    if !self.begun {
                        sink.on_message_begin();
                        self.begun = true;
                    }

                    let mut headers = vec![httparse::EMPTY_HEADER; self.config.max_headers];
                    let mut req = httparse::Request::new(&mut headers);
                    let consumed = match req.parse(&self.buf) {
                        Ok(httparse::Status::Complete(n)) => n,
                        Ok(httparse::Status::Partial) => {
                            if self.buf.len() > self.config.max_header_bytes {
                                return Err(ParseError::HeadersTooLarge);
                            }
                            return Ok(Progress::Incomplete);
                        }
                        Err(httparse::Error::TooManyHeaders) => {
                            return Err(ParseError::TooManyHeaders);
                        }
                        Err(e) => return Err(ParseError::Malformed(e)),
                    };

                    let (Some(method_str), Some(url)) = (req.method, req.path) else {
                        return Err(ParseError::Malformed(httparse::Error::Token));
                    };
                    let method =
                        Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;
                    sink.on_url(method, url);

                    // absence of Content-Length means an empty body
                    let mut content_length = 0usize;
                    for h in req.headers.iter() {
                        let value = String::from_utf8_lossy(h.value);
                        sink.on_header(h.name, &value);
                        if h.name.eq_ignore_ascii_case("content-length") {
                            content_length = value
                                .trim()
                                .parse()
                                .map_err(|_| ParseError::InvalidContentLength)?;
                        }
                        if h.name.eq_ignore_ascii_case("upgrade") {
                            self.upgrade = true;
                        }
                    }
                    sink.on_headers_complete();

                    let _ = self.buf.split_to(consumed);
                    self.state = State::Body {
                        remaining: content_length,
                    };
                }
                State::Body { remaining: 0 } => {
                    sink.on_message_complete();
                    self.state = State::Complete;
                    return Ok(Progress::Complete);
                }
                State::Body { remaining } => {
                    if self.buf.is_empty() {
                        return Ok(Progress::Incomplete);
                    }
                    let take = remaining.min(self.buf.len());
                    let chunk = self.buf.split_to(take);
                    sink.on_body_chunk(&chunk);
                    self.state = State::Body {
                        remaining: remaining - take,
                    };
                }
                State::Complete => return Ok(Progress::Complete),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::RequestAccumulator;

    #[test]
    fn parse_simple_get() {
        let mut parser = RequestParser::new(ParserConfig::default());
        let mut acc = RequestAccumulator::new();

        let progress = parser
            .advance(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n", &mut acc)
            .unwrap();
        assert_eq!(progress, Progress::Complete);

        let request = acc.take().unwrap();
        assert_eq!(request.url, "/");
        assert_eq!(request.headers.get("Host").unwrap(), "example.com");
        assert_eq!(parser.buffered_bytes(), 0);
    }
}
