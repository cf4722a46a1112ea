//! Beacon - Minimal Non-Blocking HTTP Server Core
//!
//! Core library for the connection and request lifecycle of a
//! single-threaded, event-driven HTTP/1.1 server: accepting sockets,
//! driving an incremental parser over arriving bytes, producing and
//! writing responses, and tearing connections down individually or in
//! bulk.

pub mod config;
pub mod handler;
pub mod http;
pub mod server;
