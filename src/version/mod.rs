//! # Version Module
//!
//! Value types for API microversions.
//!
//! ## Overview
//!
//! - [`ApiVersion`] - a concrete `major.minor` token, totally ordered by numeric
//!   component comparison (`2.10 > 2.9`)
//! - [`RequestedVersion`] - what the client asked for: a concrete token or
//!   [`RequestedVersion::Unspecified`] when no version header was sent
//! - [`VersionRange`] - closed interval of versions, used both for the service-wide
//!   envelope and for each handler's applicability window
//!
//! `RequestedVersion` is intentionally not ordered. "Unspecified" is neither lower nor
//! higher than any concrete version; the negotiator resolves it explicitly to the
//! envelope minimum.
//!
//! ## Parsing
//!
//! ```rust
//! use microversion::version::ApiVersion;
//!
//! let v: ApiVersion = "2.03".parse().unwrap();
//! assert_eq!(v, ApiVersion::new(2, 3));
//! assert_eq!(v.to_string(), "2.3");
//! assert!("2.10".parse::<ApiVersion>().unwrap() > "2.9".parse::<ApiVersion>().unwrap());
//! ```

mod core;
mod error;
mod range;

pub use self::core::{ApiVersion, RequestedVersion};
pub use self::error::VersionError;
pub use self::range::VersionRange;
