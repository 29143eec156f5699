use std::fmt;

use crate::version::{VersionError, VersionRange};

/// Startup-time registration error
///
/// Every variant is fatal: the service must not accept traffic with a registry that
/// failed to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// New binding shares at least one version with an existing binding for the key
    OverlapConflict {
        /// Resource action both bindings are registered under
        resource_action: String,
        /// Range of the binding already registered
        existing: VersionRange,
        /// Range of the rejected binding
        rejected: VersionRange,
    },
    /// Resource action key is empty or whitespace
    EmptyResourceAction,
    /// Binding range could not be built
    InvalidRange(VersionError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::OverlapConflict {
                resource_action,
                existing,
                rejected,
            } => write!(
                f,
                "Handler for '{resource_action}' with range {rejected} overlaps the already \
                registered range {existing}."
            ),
            RegistryError::EmptyResourceAction => {
                write!(f, "Resource action key must not be empty.")
            }
            RegistryError::InvalidRange(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::InvalidRange(err) => Some(err),
            _ => None,
        }
    }
}

impl From<VersionError> for RegistryError {
    fn from(err: VersionError) -> Self {
        RegistryError::InvalidRange(err)
    }
}
