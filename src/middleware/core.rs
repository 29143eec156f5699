use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Hook around versioned dispatch
///
/// `before` runs only once a handler has been negotiated; returning `Some` answers the
/// request without invoking the handler. `after` observes every response, including
/// dispatcher-generated faults.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}
