//! # Negotiation Module
//!
//! Pure version negotiation: decides which handler binding serves a request, or why
//! none can.
//!
//! ## Algorithm
//!
//! 1. An unspecified version resolves to the envelope minimum (the service baseline).
//! 2. A concrete version outside the envelope is [`NegotiationResult::OutOfRange`].
//!    This check runs before any handler lookup, so an out-of-envelope request is
//!    reported as such even when the action has no handlers at all.
//! 3. Candidates are scanned in registration order and the first binding whose range
//!    contains the effective version is [`NegotiationResult::Selected`].
//! 4. Otherwise the result is [`NegotiationResult::NotFound`]. This includes versions
//!    inside the envelope that sit below every binding's minimum.
//!
//! The global envelope is a value owned by the [`Negotiator`], injected at
//! construction; nothing is read from process-wide state.
//!
//! ```rust
//! use microversion::negotiation::{NegotiationResult, Negotiator};
//! use microversion::version::{RequestedVersion, VersionRange};
//!
//! let negotiator = Negotiator::new(VersionRange::parse("2.1", "3.5")?);
//! let outcome = negotiator.negotiate(RequestedVersion::Exact("3.7".parse()?), &[]);
//! assert!(matches!(outcome, NegotiationResult::OutOfRange { .. }));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod core;

pub use self::core::{NegotiationResult, Negotiator};
