//! Routing and the request lifecycle.

mod dispatcher;
mod router;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use router::RoutePath;
