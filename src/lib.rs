//! # microversion
//!
//! **microversion** negotiates API microversions and dispatches each request to the
//! handler registered for the negotiated version.
//!
//! ## Overview
//!
//! A microversioned service advertises a global version envelope `[min, max]`. Clients ask
//! for a version through a request header (`X-OpenStack-Compute-API-Version` by default);
//! requests without the header get the envelope minimum. Each resource action (for
//! example `servers:index`) may have several implementations, each bound to a closed
//! version range. The dispatcher picks the implementation whose range contains the
//! negotiated version, or answers with a fault.
//!
//! ## Architecture
//!
//! - **[`version`]** - `MAJOR.MINOR` parsing, ordering and closed ranges
//! - **[`registry`]** - handler registration with overlap rejection, sealed into a read-only table
//! - **[`negotiation`]** - pure selection algorithm over a registry's candidates
//! - **[`dispatcher`]** - request entry point: header parsing, fault mapping, handler invocation
//! - **[`middleware`]** - hooks around dispatch (tracing, metrics)
//! - **[`runtime_config`]** - YAML service description with environment overrides
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - the `microversion` binary's commands
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Dispatcher
//!     participant Negotiator
//!     participant Registry as HandlerRegistry
//!     participant Handler
//!
//!     Client->>Dispatcher: HandlerRequest<br/>X-OpenStack-Compute-API-Version: 3.1
//!     Dispatcher->>Dispatcher: Parse version header
//!     alt Malformed
//!         Dispatcher-->>Client: 400 computeFault
//!     end
//!     Dispatcher->>Registry: candidates_for("servers:index")
//!     Registry-->>Dispatcher: bindings in registration order
//!     Dispatcher->>Negotiator: negotiate(3.1, bindings)
//!     alt 3.1 outside envelope
//!         Negotiator-->>Dispatcher: OutOfRange
//!         Dispatcher-->>Client: 406 computeFault
//!     else no binding contains 3.1
//!         Negotiator-->>Dispatcher: NotFound
//!         Dispatcher-->>Client: 404 computeFault
//!     else
//!         Negotiator-->>Dispatcher: Selected(binding, 3.1)
//!         Dispatcher->>Handler: invoke(request @ 3.1)
//!         Handler-->>Dispatcher: HandlerResponse (own status)
//!         Dispatcher-->>Client: response, api_version = 3.1
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use microversion::{
//!     Dispatcher, HandlerRequest, HandlerResponse, Negotiator, RegistryBuilder, VersionRange,
//! };
//! use serde_json::json;
//!
//! let mut builder = RegistryBuilder::new();
//! builder
//!     .register("servers:index", VersionRange::parse("2.1", "2.9").unwrap(), |_req| {
//!         HandlerResponse::json(200, json!({ "servers": [] }))
//!     })
//!     .unwrap()
//!     .register("servers:index", VersionRange::parse("2.10", "3.5").unwrap(), |_req| {
//!         HandlerResponse::json(200, json!({ "servers": [], "links": [] }))
//!     })
//!     .unwrap();
//!
//! let envelope = VersionRange::parse("2.1", "3.5").unwrap();
//! let dispatcher = Dispatcher::new(Negotiator::new(envelope), builder.seal());
//!
//! let req = HandlerRequest::new(Method::GET, "/servers", "servers:index")
//!     .with_header("X-OpenStack-Compute-API-Version", "2.10");
//! let resp = dispatcher.dispatch(req);
//! assert_eq!(resp.status, 200);
//! assert_eq!(resp.api_version.unwrap().to_string(), "2.10");
//! assert!(resp.body.get("links").is_some());
//! ```
//!
//! ## Concurrency
//!
//! A sealed [`HandlerRegistry`] has no mutating API, and [`Dispatcher::dispatch`] takes
//! `&self`: share one dispatcher across threads (for example behind an `Arc`) and call it
//! concurrently.

pub mod cli;
pub mod dispatcher;
pub mod echo;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod negotiation;
pub mod registry;
pub mod runtime_config;
pub mod version;

pub use dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
pub use negotiation::{NegotiationResult, Negotiator};
pub use registry::{HandlerBinding, HandlerRegistry, RegistryBuilder, RegistryError};
pub use runtime_config::ServiceConfig;
pub use version::{ApiVersion, RequestedVersion, VersionError, VersionRange};
