use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use super::VersionError;

// ASCII digits only; `\d` would also accept other Unicode decimal digits.
static VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^([0-9]+)\.([0-9]+)$").expect("version pattern is a valid regex")
});

/// A concrete `major.minor` API microversion
///
/// Ordering is lexicographic on `(major, minor)` with numeric components, so
/// `2.10` sorts after `2.9`. Leading zeros are accepted when parsing and dropped on
/// display: `"2.03"` parses to the same value as `"2.3"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    major: u32,
    minor: u32,
}

impl ApiVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    #[must_use]
    pub const fn major(&self) -> u32 {
        self.major
    }

    #[must_use]
    pub const fn minor(&self) -> u32 {
        self.minor
    }
}

impl Display for ApiVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || VersionError::Malformed {
            input: s.to_string(),
        };
        let caps = VERSION_REGEX.captures(s).ok_or_else(malformed)?;
        // Components longer than u32 are malformed rather than truncated.
        let major = caps[1].parse::<u32>().map_err(|_| malformed())?;
        let minor = caps[2].parse::<u32>().map_err(|_| malformed())?;
        Ok(Self::new(major, minor))
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<ApiVersion>().map_err(serde::de::Error::custom)
    }
}

/// The version a client asked for
///
/// There is no ordering between `Unspecified` and concrete versions; callers must
/// branch on it explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RequestedVersion {
    /// No version header was sent
    #[default]
    Unspecified,
    /// A concrete, well-formed version
    Exact(ApiVersion),
}

impl RequestedVersion {
    /// Interpret an optional header value
    ///
    /// Absence is valid and means `Unspecified`. A present but unparsable value is an
    /// error; it is never silently treated as absent.
    pub fn from_header(value: Option<&str>) -> Result<Self, VersionError> {
        match value {
            None => Ok(RequestedVersion::Unspecified),
            Some(raw) => raw.parse().map(RequestedVersion::Exact),
        }
    }

    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        matches!(self, RequestedVersion::Unspecified)
    }

    #[must_use]
    pub fn exact(&self) -> Option<ApiVersion> {
        match self {
            RequestedVersion::Exact(v) => Some(*v),
            RequestedVersion::Unspecified => None,
        }
    }
}

impl From<ApiVersion> for RequestedVersion {
    fn from(v: ApiVersion) -> Self {
        RequestedVersion::Exact(v)
    }
}

impl Display for RequestedVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestedVersion::Unspecified => f.write_str("unspecified"),
            RequestedVersion::Exact(v) => Display::fmt(v, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> ApiVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_canonicalises_leading_zeros() {
        assert_eq!(v("2.03"), v("2.3"));
        assert_eq!(v("02.3").to_string(), "2.3");
        assert_eq!(v("0.0"), ApiVersion::new(0, 0));
    }

    #[test]
    fn test_numeric_not_lexicographic_ordering() {
        assert!(v("2.10") > v("2.9"));
        assert!(v("10.0") > v("9.99"));
        assert!(v("3.0") > v("2.99"));
        assert_eq!(v("2.9").cmp(&v("2.9")), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "", "2", "2.", ".3", "2.3.1", " 2.3", "2.3 ", "2 .3", "-2.3", "+2.3", "2,3", "v2.3",
            "2..3", "latest", "2.x", "٢.٣", "4294967296.0",
        ] {
            let err = bad.parse::<ApiVersion>().unwrap_err();
            assert_eq!(
                err,
                VersionError::Malformed {
                    input: bad.to_string()
                },
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_parse_accepts_u32_max() {
        assert_eq!(v("4294967295.1").major(), u32::MAX);
    }

    #[test]
    fn test_requested_from_header() {
        assert_eq!(
            RequestedVersion::from_header(None).unwrap(),
            RequestedVersion::Unspecified
        );
        assert_eq!(
            RequestedVersion::from_header(Some("2.3")).unwrap(),
            RequestedVersion::Exact(ApiVersion::new(2, 3))
        );
        assert!(RequestedVersion::from_header(Some("")).is_err());
    }

    #[test]
    fn test_unspecified_never_equals_concrete() {
        let unspecified = RequestedVersion::Unspecified;
        assert_ne!(unspecified, RequestedVersion::Exact(ApiVersion::new(0, 0)));
        assert!(unspecified.is_unspecified());
        assert_eq!(unspecified.exact(), None);
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&ApiVersion::new(2, 10)).unwrap();
        assert_eq!(json, "\"2.10\"");
        let back: ApiVersion = serde_json::from_str("\"2.010\"").unwrap();
        assert_eq!(back, ApiVersion::new(2, 10));
        assert!(serde_json::from_str::<ApiVersion>("\"two\"").is_err());
    }

    proptest! {
        #[test]
        fn test_zero_padded_text_parses_to_same_version(
            major in any::<u32>(),
            minor in any::<u32>(),
            major_width in 0usize..14,
            minor_width in 0usize..14,
        ) {
            let text = format!("{major:0major_width$}.{minor:0minor_width$}");
            let parsed: ApiVersion = text.parse().unwrap();
            prop_assert_eq!(parsed, ApiVersion::new(major, minor));
            prop_assert_eq!(parsed.to_string(), format!("{major}.{minor}"));
        }

        #[test]
        fn test_ordering_matches_numeric_pairs(
            a in (any::<u32>(), any::<u32>()),
            b in (any::<u32>(), any::<u32>()),
        ) {
            let (va, vb) = (ApiVersion::new(a.0, a.1), ApiVersion::new(b.0, b.1));
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }

        #[test]
        fn test_text_outside_grammar_is_rejected(s in "[0-9.]{0,3}[^0-9.][0-9.]{0,3}") {
            prop_assert!(s.parse::<ApiVersion>().is_err());
        }
    }
}
