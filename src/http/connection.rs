use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;

use crate::handler::RequestHandler;
use crate::http::parser::{ParserConfig, Progress, RequestParser};
use crate::http::request::{Request, RequestAccumulator};
use crate::http::writer::ResponseWriter;
use crate::server::registry::{ConnId, Registry};

/// Wire protocol a connection is speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    /// Reserved for protocol upgrade, which is not implemented; no
    /// connection ever enters this mode.
    Upgraded,
}

enum ConnState {
    Reading,
    AwaitingResponse(Request),
    Writing(ResponseWriter),
    Closing,
    Closed,
}

/// One accepted socket and its request/response lifecycle.
///
/// The connection owns its socket, its parser instance, and the request
/// being accumulated; the same instances persist across every request of
/// a keep-alive exchange. The connection is owned by its task: dropping
/// at the end of [`run`](Self::run), after the socket has shut down, is
/// the final release.
pub struct Connection<S> {
    id: ConnId,
    stream: S,
    protocol: Protocol,
    parser: RequestParser,
    acc: RequestAccumulator,
    read_buf: BytesMut,
    state: ConnState,
    registry: Rc<RefCell<Registry>>,
    handler: Rc<dyn RequestHandler>,
    close_rx: oneshot::Receiver<()>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        id: ConnId,
        stream: S,
        registry: Rc<RefCell<Registry>>,
        handler: Rc<dyn RequestHandler>,
        parser_config: ParserConfig,
        read_buffer_size: usize,
        close_rx: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            id,
            stream,
            protocol: Protocol::Http,
            parser: RequestParser::new(parser_config),
            acc: RequestAccumulator::new(),
            read_buf: BytesMut::with_capacity(read_buffer_size),
            state: ConnState::Reading,
            registry,
            handler,
            close_rx,
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Drives the connection until it is closed.
    pub async fn run(mut self) {
        loop {
            match &mut self.state {
                ConnState::Reading => self.read_step().await,

                ConnState::AwaitingResponse(request) => {
                    tracing::debug!(
                        conn = %self.id,
                        method = ?request.method,
                        url = %request.url,
                        "request complete"
                    );
                    let response = self.handler.handle(request);
                    self.state = ConnState::Writing(ResponseWriter::new(response));
                }

                ConnState::Writing(writer) => {
                    match writer.write_to(&mut self.stream).await {
                        Ok(()) => {
                            tracing::debug!(conn = %self.id, bytes = writer.len(), "response written");
                        }
                        // A failed write is logged but does not close the
                        // connection; only read-side errors do.
                        Err(e) => {
                            tracing::error!(conn = %self.id, context = "write", error = %e, "error writing response");
                        }
                    }
                    self.parser.reset();
                    self.state = ConnState::Reading;
                }

                ConnState::Closing => self.finish_close().await,

                ConnState::Closed => break,
            }
        }
    }

    async fn read_step(&mut self) {
        // Drain pipelined bytes left over from the previous message
        // before touching the socket.
        match self.parser.advance(&[], &mut self.acc) {
            Ok(Progress::Complete) => {
                self.message_complete();
                return;
            }
            Ok(Progress::Incomplete) => {}
            Err(e) => {
                self.fatal_error("parse", &e);
                self.request_close();
                return;
            }
        }

        self.read_buf.clear();
        tokio::select! {
            biased;
            _ = &mut self.close_rx => {
                tracing::debug!(conn = %self.id, "close requested");
                self.request_close();
            }
            result = self.stream.read_buf(&mut self.read_buf) => match result {
                Ok(0) => {
                    tracing::debug!(conn = %self.id, "connection closed by peer");
                    self.request_close();
                }
                Ok(n) => {
                    tracing::trace!(conn = %self.id, bytes = n, "read");
                    self.feed();
                }
                Err(e) => {
                    self.fatal_error("read", &e);
                    self.request_close();
                }
            }
        }
    }

    /// Runs the incremental parser over the bytes just read.
    fn feed(&mut self) {
        match self.protocol {
            Protocol::Http => match self.parser.advance(&self.read_buf, &mut self.acc) {
                Ok(Progress::Complete) => self.message_complete(),
                Ok(Progress::Incomplete) => {}
                Err(e) => {
                    self.fatal_error("parse", &e);
                    self.request_close();
                }
            },
            Protocol::Upgraded => {
                // Mode switching is never performed; see the module docs.
            }
        }
    }

    fn message_complete(&mut self) {
        if self.parser.upgrade_requested() {
            let discarded = self.parser.discard_buffered();
            tracing::warn!(
                conn = %self.id,
                discarded_bytes = discarded,
                "protocol upgrade requested but not supported, staying on http"
            );
        }
        match self.acc.take() {
            Some(request) => self.state = ConnState::AwaitingResponse(request),
            None => {
                self.fatal_error("parse", &"message completed without a request line");
                self.request_close();
            }
        }
    }

    /// Requests that the connection close. Idempotent: a connection
    /// already closing or closed is left untouched.
    fn request_close(&mut self) {
        if matches!(self.state, ConnState::Closing | ConnState::Closed) {
            return;
        }
        self.state = ConnState::Closing;
    }

    /// Deregisters from the owning registry, then shuts the socket down.
    /// The connection itself is released when its task drops it.
    async fn finish_close(&mut self) {
        self.registry.borrow_mut().deregister(self.id);
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(conn = %self.id, error = %e, "error shutting down socket");
        }
        tracing::debug!(conn = %self.id, "closed");
        self.state = ConnState::Closed;
    }

    fn fatal_error(&self, context: &str, message: &dyn fmt::Display) {
        tracing::error!(conn = %self.id, context, error = %message, "connection error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::Response;

    struct NullHandler;

    impl RequestHandler for NullHandler {
        fn handle(&self, _request: &Request) -> Response {
            Response::ok("")
        }
    }

    fn test_connection(
        registry: &Rc<RefCell<Registry>>,
    ) -> (
        Connection<tokio::io::DuplexStream>,
        tokio::io::DuplexStream,
        oneshot::Sender<()>,
    ) {
        let (client, server_io) = tokio::io::duplex(1024);
        let id = registry.borrow_mut().allocate_id();
        let (close_tx, close_rx) = oneshot::channel();
        let conn = Connection::new(
            id,
            server_io,
            Rc::clone(registry),
            Rc::new(NullHandler),
            ParserConfig::default(),
            1024,
            close_rx,
        );
        (conn, client, close_tx)
    }

    #[tokio::test]
    async fn request_close_is_idempotent() {
        let registry = Rc::new(RefCell::new(Registry::new()));
        let (mut conn, _client, _close_tx) = test_connection(&registry);

        conn.request_close();
        assert!(matches!(conn.state, ConnState::Closing));
        conn.request_close();
        assert!(matches!(conn.state, ConnState::Closing));

        conn.finish_close().await;
        assert!(matches!(conn.state, ConnState::Closed));
        conn.request_close();
        assert!(matches!(conn.state, ConnState::Closed));
    }

    #[tokio::test]
    async fn close_deregisters_from_registry() {
        let registry = Rc::new(RefCell::new(Registry::new()));
        let (mut conn, _client, close_tx) = test_connection(&registry);
        let task = tokio::spawn(async {});
        registry.borrow_mut().insert(crate::server::registry::Entry {
            id: conn.id(),
            close_tx,
            task,
        });
        assert!(registry.borrow().contains(conn.id()));

        conn.request_close();
        conn.finish_close().await;
        assert!(!registry.borrow().contains(conn.id()));
        // deregistering an absent connection is a no-op
        assert!(!registry.borrow_mut().deregister(conn.id()));
    }
}
