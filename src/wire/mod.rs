//! Wire model shared with the transport: request, per-request context and
//! response.
//!
//! The transport decodes sockets and multipart framing; the dispatcher only
//! sees these values.

mod context;
mod request;
mod response;

pub use context::RequestContext;
pub use request::{Body, Part, Request};
pub use response::Response;
