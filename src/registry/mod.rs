//! # Registry Module
//!
//! The registry holds every versioned handler binding known to the service.
//!
//! ## Overview
//!
//! A binding associates a resource action key (e.g. `"servers:index"`), a
//! [`VersionRange`](crate::version::VersionRange) and the handler serving requests in
//! that range. Bindings for one key are kept in registration order.
//!
//! ## Lifecycle
//!
//! Registration only exists on [`RegistryBuilder`]. Calling
//! [`RegistryBuilder::seal`] consumes the builder and yields a [`HandlerRegistry`],
//! which has no mutating API at all. The sealed registry is shared across request
//! threads without locks:
//!
//! ```rust
//! use microversion::dispatcher::HandlerResponse;
//! use microversion::registry::RegistryBuilder;
//! use microversion::version::VersionRange;
//! use serde_json::json;
//!
//! let mut builder = RegistryBuilder::new();
//! builder
//!     .register("servers:index", VersionRange::parse("2.1", "2.9")?, |_req| {
//!         HandlerResponse::json(200, json!({ "servers": [] }))
//!     })?
//!     .register("servers:index", VersionRange::parse("2.10", "3.5")?, |_req| {
//!         HandlerResponse::json(200, json!({ "servers": [], "links": [] }))
//!     })?;
//! let registry = builder.seal();
//! assert_eq!(registry.candidates_for("servers:index").len(), 2);
//! assert!(registry.candidates_for("unknown").is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Overlap Rule
//!
//! Two bindings for the same key must not share any version. Overlaps are rejected at
//! registration time with [`RegistryError::OverlapConflict`]; the service must abort
//! startup rather than serve ambiguous bindings.

mod core;
mod error;

pub use self::core::{
    BindingVec, HandlerBinding, HandlerFn, HandlerRegistry, RegistryBuilder, MAX_INLINE_BINDINGS,
};
pub use self::error::RegistryError;
