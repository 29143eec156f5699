//! # Dispatcher Module
//!
//! The dispatcher is the request-handling entry point of a microversioned service.
//!
//! ## Overview
//!
//! For each request the dispatcher:
//! - reads the version header (absent means "unspecified", unparsable is a 400)
//! - asks the [`Negotiator`](crate::negotiation::Negotiator) to pick a binding from the
//!   sealed [`HandlerRegistry`](crate::registry::HandlerRegistry)
//! - runs the selected handler with the negotiated version attached to the request
//! - maps negotiation failures to fault responses (404 / 406)
//!
//! The handler's own status code is returned untouched: a handler answering `202` for a
//! newer microversion keeps its `202`.
//!
//! ## Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant Dispatcher
//!     participant Negotiator
//!     participant Registry
//!     participant Handler
//!
//!     Transport->>Dispatcher: HandlerRequest
//!     Dispatcher->>Dispatcher: Read version header
//!     alt Malformed header
//!         Dispatcher-->>Transport: 400 fault
//!     end
//!     Dispatcher->>Registry: candidates_for(resource_action)
//!     Dispatcher->>Negotiator: negotiate(requested, candidates)
//!     alt Outside envelope
//!         Dispatcher-->>Transport: 406 fault
//!     else No binding covers version
//!         Dispatcher-->>Transport: 404 fault
//!     else Selected
//!         Dispatcher->>Handler: invoke(request @ effective version)
//!         Handler-->>Dispatcher: HandlerResponse
//!         Dispatcher-->>Transport: response + api_version
//!     end
//! ```
//!
//! ## Echoing the Version
//!
//! Responses carry the effective version in [`HandlerResponse::api_version`]. Writing it
//! to a response header is the transport's job; [`HandlerResponse::echo_version`] does
//! it for transports that want the conventional header plus `Vary`.

mod core;

pub use self::core::{
    out_of_range_message, Dispatcher, HandlerRequest, HandlerResponse, HeaderVec,
    DEFAULT_FAULT_KEY, DEFAULT_VERSION_HEADER, MAX_INLINE_HEADERS, NOT_FOUND_MESSAGE,
};
