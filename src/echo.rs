use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::registry::HandlerFn;
use serde_json::{json, Value};
use std::sync::Arc;

/// Reports what the dispatcher negotiated for the request
pub fn echo_handler(req: &HandlerRequest, status: u16) -> HandlerResponse {
    HandlerResponse::json(
        status,
        json!({
            "resource_action": req.resource_action,
            "method": req.method.as_str(),
            "path": req.path,
            "requested_version": req.requested_version.to_string(),
            "api_version": req.api_version,
            "body": req.body,
        }),
    )
}

/// Handler for a configured binding: canned `body` when given, otherwise an echo
pub fn configured_handler(status: u16, body: Option<Value>) -> HandlerFn {
    if let Some(body) = body {
        return Arc::new(move |_req: &HandlerRequest| HandlerResponse::json(status, body.clone()));
    }
    Arc::new(move |req: &HandlerRequest| echo_handler(req, status))
}
