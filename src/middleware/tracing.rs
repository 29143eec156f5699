use std::time::Duration;

use tracing::{debug, info, warn};

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Emits one structured event per dispatched request
///
/// Server errors are logged at WARN so they survive log sampling.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            resource_action = %req.resource_action,
            requested = %req.requested_version,
            "Request negotiated"
        );
        None
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        let effective_version = res
            .api_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let latency_ms = latency.as_millis() as u64;
        if res.status >= 500 {
            warn!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                resource_action = %req.resource_action,
                requested = %req.requested_version,
                effective_version = %effective_version,
                status = res.status,
                latency_ms,
                "Request failed"
            );
        } else {
            info!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                resource_action = %req.resource_action,
                requested = %req.requested_version,
                effective_version = %effective_version,
                status = res.status,
                latency_ms,
                "Request complete"
            );
        }
    }
}
