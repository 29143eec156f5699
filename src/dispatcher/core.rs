//! Dispatcher core module - request path for versioned dispatch.
//!
//! Everything here runs per request. The registry and negotiator are read-only, so
//! `Dispatcher::dispatch` only needs `&self` and is safe to call from any number of
//! threads at once.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::middleware::Middleware;
use crate::negotiation::{NegotiationResult, Negotiator};
use crate::registry::{HandlerBinding, HandlerRegistry};
use crate::version::{ApiVersion, RequestedVersion, VersionError};

/// Header the client uses to request a microversion unless configured otherwise
pub const DEFAULT_VERSION_HEADER: &str = "X-OpenStack-Compute-API-Version";

/// Top-level key of dispatcher-generated fault bodies unless configured otherwise
pub const DEFAULT_FAULT_KEY: &str = "computeFault";

/// Fault message for requests that no binding covers
pub const NOT_FOUND_MESSAGE: &str = "The resource could not be found.";

/// Maximum inline headers before heap allocation
/// Most requests have ≤16 headers (no heap in hot path)
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path
///
/// Header names use `Arc<str>`: they repeat across requests and cloning is an atomic
/// increment instead of a string copy.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Fixed sentence reported when a request is outside the service envelope
#[must_use]
pub fn out_of_range_message(requested: ApiVersion, min: ApiVersion, max: ApiVersion) -> String {
    format!(
        "Version {requested} is not supported by the API. Minimum is {min} and maximum is {max}."
    )
}

/// Request context handed to a versioned handler
///
/// `requested_version` and `api_version` are filled in by the dispatcher before the
/// handler runs.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Correlation id, reused from `X-Request-Id` when valid
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path
    pub path: String,
    /// Resource action key used for handler lookup (e.g. `"servers:index"`)
    pub resource_action: String,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    /// What the client asked for
    pub requested_version: RequestedVersion,
    /// Negotiated version the handler must honour
    pub api_version: Option<ApiVersion>,
}

impl HandlerRequest {
    #[must_use]
    pub fn new(method: Method, path: &str, resource_action: &str) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            resource_action: resource_action.to_string(),
            headers: HeaderVec::new(),
            body: None,
            requested_version: RequestedVersion::Unspecified,
            api_version: None,
        }
    }

    /// Add a header; an `X-Request-Id` header also sets the correlation id
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            self.request_id = RequestId::from_header_or_new(Some(value));
        }
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response produced by a handler or by the dispatcher itself
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code, chosen by the handler on success
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
    /// Effective version the response was produced for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<ApiVersion>,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
            api_version: None,
        }
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, body)
    }

    /// Fault body: `{"<fault_key>": {"code": <status>, "message": "<message>"}}`
    #[must_use]
    pub fn fault(status: u16, fault_key: &str, message: &str) -> Self {
        Self::json(
            status,
            serde_json::json!({ fault_key: { "code": status, "message": message } }),
        )
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Write the negotiated version back under `header_name`, plus a matching `Vary`
    ///
    /// For transports that echo the effective version to the client. No-op when the
    /// response carries no version. A `Vary` set by the handler is extended, not replaced.
    pub fn echo_version(&mut self, header_name: &str) {
        let Some(version) = self.api_version else {
            return;
        };
        self.set_header(header_name, version.to_string());

        let vary = match self.get_header("vary") {
            None => header_name.to_string(),
            Some(existing)
                if existing
                    .split(',')
                    .any(|v| v.trim() == "*" || v.trim().eq_ignore_ascii_case(header_name)) =>
            {
                return;
            }
            Some(existing) => format!("{existing}, {header_name}"),
        };
        self.set_header("vary", vary);
    }
}

/// Versioned request dispatcher
///
/// Reads the version header, negotiates against the sealed registry and runs the
/// selected handler. Negotiation failures become fault responses:
///
/// | Outcome | Status |
/// |---------|--------|
/// | malformed version header | 400 |
/// | no binding covers the version | 404 |
/// | version outside the envelope | 406 |
/// | handler panicked | 500 |
pub struct Dispatcher {
    negotiator: Negotiator,
    registry: Arc<HandlerRegistry>,
    version_header: Arc<str>,
    fault_key: Arc<str>,
    /// Ordered list of middleware to apply to requests/responses
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    /// Build a dispatcher over a sealed registry
    ///
    /// Bindings whose range never meets the envelope are logged: they are legal but no
    /// request can reach them.
    #[must_use]
    pub fn new(negotiator: Negotiator, registry: HandlerRegistry) -> Self {
        let envelope = negotiator.envelope();
        for binding in registry.iter().filter(|b| !b.range().overlaps(&envelope)) {
            warn!(
                resource_action = %binding.resource_action(),
                range = %binding.range(),
                envelope = %envelope,
                "Handler binding is outside the supported envelope and can never be selected"
            );
        }
        info!(
            envelope = %envelope,
            bindings = registry.len(),
            "Dispatcher ready"
        );
        Self {
            negotiator,
            registry: Arc::new(registry),
            version_header: Arc::from(DEFAULT_VERSION_HEADER),
            fault_key: Arc::from(DEFAULT_FAULT_KEY),
            middlewares: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version_header(mut self, header_name: &str) -> Self {
        self.version_header = Arc::from(header_name);
        self
    }

    #[must_use]
    pub fn with_fault_key(mut self, fault_key: &str) -> Self {
        self.fault_key = Arc::from(fault_key);
        self
    }

    /// Add middleware to the processing pipeline
    ///
    /// Middleware runs in the order it's added. `before` only runs for requests that
    /// negotiated a handler; `after` runs for every response.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    #[must_use]
    pub fn negotiator(&self) -> &Negotiator {
        &self.negotiator
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    #[must_use]
    pub fn version_header(&self) -> &str {
        &self.version_header
    }

    #[must_use]
    pub fn fault_key(&self) -> &str {
        &self.fault_key
    }

    /// Version requested by `req`, from the configured header
    pub fn requested_version(&self, req: &HandlerRequest) -> Result<RequestedVersion, VersionError> {
        RequestedVersion::from_header(req.get_header(&self.version_header))
    }

    /// Negotiate and run `req`
    pub fn dispatch(&self, mut req: HandlerRequest) -> HandlerResponse {
        let start = Instant::now();

        let mut resp = match self.requested_version(&req) {
            Err(err) => {
                warn!(
                    request_id = %req.request_id,
                    resource_action = %req.resource_action,
                    error = %err,
                    "Malformed version header"
                );
                self.fault(400, &err.to_string())
            }
            Ok(requested) => {
                req.requested_version = requested;
                let candidates = self.registry.candidates_for(&req.resource_action);
                match self.negotiator.negotiate(requested, candidates) {
                    NegotiationResult::Selected {
                        binding,
                        effective_version,
                    } => {
                        req.api_version = Some(effective_version);
                        self.run_handler(binding, &req)
                    }
                    NegotiationResult::NotFound { effective_version } => {
                        debug!(
                            request_id = %req.request_id,
                            resource_action = %req.resource_action,
                            requested = %requested,
                            effective_version = %effective_version,
                            candidates = candidates.len(),
                            "No handler binding covers version"
                        );
                        req.api_version = Some(effective_version);
                        let mut resp = self.fault(404, NOT_FOUND_MESSAGE);
                        resp.api_version = Some(effective_version);
                        resp
                    }
                    NegotiationResult::OutOfRange {
                        requested,
                        min,
                        max,
                    } => {
                        info!(
                            request_id = %req.request_id,
                            resource_action = %req.resource_action,
                            requested = %requested,
                            min = %min,
                            max = %max,
                            "Requested version outside supported envelope"
                        );
                        self.fault(406, &out_of_range_message(requested, min, max))
                    }
                }
            }
        };

        let latency = start.elapsed();
        for mw in &self.middlewares {
            mw.after(&req, &mut resp, latency);
        }
        resp
    }

    fn run_handler(&self, binding: &HandlerBinding, req: &HandlerRequest) -> HandlerResponse {
        let effective_version = req.api_version;

        let mut early_resp: Option<HandlerResponse> = None;
        for mw in &self.middlewares {
            if early_resp.is_none() {
                early_resp = mw.before(req);
            } else {
                let _ = mw.before(req);
            }
        }

        let mut resp = match early_resp {
            Some(r) => {
                debug!(
                    request_id = %req.request_id,
                    status = r.status,
                    "Middleware returned early response"
                );
                r
            }
            None => {
                let execution_start = Instant::now();
                match catch_unwind(AssertUnwindSafe(|| binding.invoke(req))) {
                    Ok(resp) => {
                        debug!(
                            request_id = %req.request_id,
                            resource_action = %req.resource_action,
                            precedence = binding.precedence(),
                            status = resp.status,
                            execution_time_ms = execution_start.elapsed().as_millis() as u64,
                            "Handler execution complete"
                        );
                        resp
                    }
                    Err(panic) => {
                        let panic_message = panic
                            .downcast_ref::<&str>()
                            .map(|s| (*s).to_string())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "unknown panic payload".to_string());
                        error!(
                            request_id = %req.request_id,
                            resource_action = %req.resource_action,
                            panic_message = %panic_message,
                            "Handler panicked"
                        );
                        self.fault(500, &format!("Handler '{}' failed.", req.resource_action))
                    }
                }
            }
        };

        resp.api_version = effective_version;
        resp
    }

    fn fault(&self, status: u16, message: &str) -> HandlerResponse {
        HandlerResponse::fault(status, &self.fault_key, message)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("negotiator", &self.negotiator)
            .field("registry", &self.registry)
            .field("version_header", &self.version_header)
            .field("fault_key", &self.fault_key)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
