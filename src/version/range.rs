use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use super::{ApiVersion, RequestedVersion, VersionError};

/// Closed interval of API versions, `min <= max`, both bounds inclusive
///
/// Ranges are plain `Copy` values; once built they are never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct VersionRange {
    min: ApiVersion,
    max: ApiVersion,
}

impl VersionRange {
    /// Build a range, rejecting `min > max`
    pub fn new(min: ApiVersion, max: ApiVersion) -> Result<Self, VersionError> {
        if min > max {
            return Err(VersionError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Range covering exactly one version
    #[must_use]
    pub const fn single(version: ApiVersion) -> Self {
        Self {
            min: version,
            max: version,
        }
    }

    /// Parse both bounds from text, e.g. `VersionRange::parse("2.1", "3.5")`
    pub fn parse(min: &str, max: &str) -> Result<Self, VersionError> {
        Self::new(min.parse()?, max.parse()?)
    }

    #[must_use]
    pub const fn min(&self) -> ApiVersion {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> ApiVersion {
        self.max
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, version: ApiVersion) -> bool {
        self.min <= version && version <= self.max
    }

    /// Membership for a client request; `Unspecified` is never contained
    #[inline]
    #[must_use]
    pub fn contains_requested(&self, requested: RequestedVersion) -> bool {
        match requested {
            RequestedVersion::Exact(v) => self.contains(v),
            RequestedVersion::Unspecified => false,
        }
    }

    /// True when the two ranges share at least one version
    #[must_use]
    pub fn overlaps(&self, other: &VersionRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

impl Display for VersionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[derive(Deserialize)]
struct RawRange {
    min: ApiVersion,
    max: ApiVersion,
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRange::deserialize(deserializer)?;
        VersionRange::new(raw.min, raw.max).map_err(serde::de::Error::custom)
    }
}
