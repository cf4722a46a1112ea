//! Application-facing request handling capability.

use crate::http::request::Request;
use crate::http::response::Response;

/// Produces a [`Response`] for every completed request.
///
/// Implementations are invoked synchronously on the server thread once
/// per fully parsed request, and must always return a response; there
/// is no error channel across this boundary.
pub trait RequestHandler {
    fn handle(&self, request: &Request) -> Response;

    /// Hook for messages arriving on an upgraded protocol. Protocol
    /// upgrade is not implemented; nothing in this crate calls this.
    fn on_upgrade_message(&self, _binary: bool, _payload: &[u8]) {}

    /// Hook for an upgraded protocol closing. Protocol upgrade is not
    /// implemented; nothing in this crate calls this.
    fn on_upgrade_close(&self) {}
}
