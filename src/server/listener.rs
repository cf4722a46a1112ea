use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tracing::info;

use crate::config::Config;
use crate::handler::RequestHandler;
use crate::http::connection::Connection;
use crate::http::parser::ParserConfig;
use crate::server::registry::{Entry, Registry};

/// One bound listening socket and the set of connections it accepted.
///
/// Connections run as tasks on the current thread; [`run`](Self::run)
/// must therefore be driven from within a [`tokio::task::LocalSet`].
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Rc<RefCell<Registry>>,
    handler: Rc<dyn RequestHandler>,
    parser_config: ParserConfig,
    read_buffer_size: usize,
}

impl Server {
    /// Binds and listens. On failure nothing is leaked: no socket, no
    /// registry entry, and no task survive an error return.
    pub async fn bind(config: &Config, handler: Rc<dyn RequestHandler>) -> anyhow::Result<Server> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.listen_addr))?;
        let local_addr = listener
            .local_addr()
            .context("failed to read bound address")?;
        info!("Listening on {}", local_addr);

        Ok(Server {
            listener,
            local_addr,
            registry: Rc::new(RefCell::new(Registry::new())),
            handler,
            parser_config: ParserConfig {
                max_headers: config.max_headers,
                max_header_bytes: config.max_header_bytes,
            },
            read_buffer_size: config.read_buffer_size,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of currently active connections.
    pub fn active_connections(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Accepts connections until the future is dropped. An accept
    /// failure skips that one attempt and leaves the listener running.
    pub async fn run(&mut self) {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer)) => {
                    info!("Accepted connection from {}", peer);
                    self.spawn_connection(socket, peer);
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }

    fn spawn_connection(&self, socket: TcpStream, peer: SocketAddr) {
        // The accepted socket is prepared before it is registered; a
        // failure here discards it without it ever entering the set.
        if let Err(e) = socket.set_nodelay(true) {
            tracing::error!(peer = %peer, error = %e, "failed to prepare accepted socket");
            return;
        }

        let mut registry = self.registry.borrow_mut();
        let id = registry.allocate_id();
        let (close_tx, close_rx) = oneshot::channel();
        let conn = Connection::new(
            id,
            socket,
            Rc::clone(&self.registry),
            Rc::clone(&self.handler),
            self.parser_config.clone(),
            self.read_buffer_size,
            close_rx,
        );
        let task = tokio::task::spawn_local(conn.run());
        registry.insert(Entry { id, close_tx, task });
    }

    /// Closes every active connection in reverse registration order
    /// (last accepted first), waiting for each to finish, then closes
    /// the listening socket itself.
    pub async fn shutdown(self) {
        let entries = self.registry.borrow_mut().drain_reverse();
        let closed = entries.len();

        for entry in entries {
            tracing::debug!(conn = %entry.id, "closing connection");
            let _ = entry.close_tx.send(());
            if let Err(e) = entry.task.await {
                tracing::error!(conn = %entry.id, error = %e, "connection task failed during shutdown");
            }
        }

        // The listening socket closes only now, after every connection
        // has finished closing.
        drop(self.listener);
        info!(
            "Listener on {} shut down, {} connections closed",
            self.local_addr, closed
        );
    }
}
