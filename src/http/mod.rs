//! HTTP protocol implementation.
//!
//! This module implements the per-connection request/response lifecycle of
//! an HTTP/1.1 server with keep-alive connections.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The main connection handler implementing the request-response state machine
//! - **`parser`**: Incremental request parser driver emitting structural events as bytes arrive
//! - **`request`**: HTTP request representation, accumulated from parser events
//! - **`response`**: HTTP response representation and head serialization
//! - **`writer`**: Writes serialized responses to the client as a single vectored write
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Message complete
//!               ▼
//!        ┌──────────────────┐
//!        │ AwaitingResponse │ ← Handler produces a response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               └─ Keep-Alive → Reading (same connection, same parser)
//!
//!        Parse error, read error, EOF, or server shutdown from any
//!        state forces:
//!
//!        ┌─────────────┐      ┌─────────────┐
//!        │   Closing   │ ───▶ │   Closed    │
//!        └─────────────┘      └─────────────┘
//! ```
//!
//! A write failure does not close the connection; it is logged and the
//! connection returns to `Reading`. Only read-side failures close.
//!
//! Protocol upgrade (e.g. WebSocket) is detected but not implemented:
//! the upgrade request itself is answered normally, any trailing bytes
//! of the proposed protocol are discarded, and the connection stays in
//! HTTP mode.

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
