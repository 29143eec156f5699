use std::fmt;

use super::ApiVersion;

/// Error produced while parsing versions or building version ranges
///
/// `Malformed` is a client-input error surfaced per request. `InvalidRange` is a
/// configuration error and only occurs while the service is starting up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Text is not two non-negative integers separated by a single `.`
    Malformed {
        /// The rejected input, verbatim
        input: String,
    },
    /// Range lower bound is above its upper bound
    InvalidRange {
        /// Requested lower bound
        min: ApiVersion,
        /// Requested upper bound
        max: ApiVersion,
    },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::Malformed { input } => {
                write!(f, "Invalid API version '{input}': expected MAJOR.MINOR.")
            }
            VersionError::InvalidRange { min, max } => {
                write!(
                    f,
                    "Invalid version range: minimum {min} is greater than maximum {max}."
                )
            }
        }
    }
}

impl std::error::Error for VersionError {}
