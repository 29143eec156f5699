use tracing::trace;

use crate::registry::HandlerBinding;
use crate::version::{ApiVersion, RequestedVersion, VersionRange};

/// Outcome of negotiating one request
#[derive(Debug, Clone, Copy)]
pub enum NegotiationResult<'a> {
    /// A binding covers the effective version
    Selected {
        binding: &'a HandlerBinding,
        effective_version: ApiVersion,
    },
    /// The version is acceptable to the service but no binding for this action covers it
    NotFound { effective_version: ApiVersion },
    /// The requested version lies outside the service envelope
    OutOfRange {
        requested: ApiVersion,
        min: ApiVersion,
        max: ApiVersion,
    },
}

impl NegotiationResult<'_> {
    /// Short label for logs and metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            NegotiationResult::Selected { .. } => "selected",
            NegotiationResult::NotFound { .. } => "not_found",
            NegotiationResult::OutOfRange { .. } => "out_of_range",
        }
    }
}

/// Negotiates requested versions against a fixed service envelope
///
/// Holds only `Copy` data, so a single instance is shared freely between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiator {
    envelope: VersionRange,
}

impl Negotiator {
    #[must_use]
    pub const fn new(envelope: VersionRange) -> Self {
        Self { envelope }
    }

    /// The service-wide supported version range
    #[must_use]
    pub const fn envelope(&self) -> VersionRange {
        self.envelope
    }

    /// Select a binding from `candidates` for `requested`
    ///
    /// `candidates` must be the bindings of a single resource action in registration
    /// order, as returned by
    /// [`HandlerRegistry::candidates_for`](crate::registry::HandlerRegistry::candidates_for).
    #[must_use]
    pub fn negotiate<'a>(
        &self,
        requested: RequestedVersion,
        candidates: &'a [HandlerBinding],
    ) -> NegotiationResult<'a> {
        let effective_version = match requested {
            RequestedVersion::Unspecified => self.envelope.min(),
            RequestedVersion::Exact(v) if self.envelope.contains(v) => v,
            RequestedVersion::Exact(v) => {
                return NegotiationResult::OutOfRange {
                    requested: v,
                    min: self.envelope.min(),
                    max: self.envelope.max(),
                };
            }
        };

        let selected = candidates
            .iter()
            .find(|b| b.range().contains(effective_version));

        trace!(
            requested = %requested,
            effective_version = %effective_version,
            candidates = candidates.len(),
            selected = ?selected.map(HandlerBinding::precedence),
            "Negotiated version"
        );

        match selected {
            Some(binding) => NegotiationResult::Selected {
                binding,
                effective_version,
            },
            None => NegotiationResult::NotFound { effective_version },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{HandlerRequest, HandlerResponse};
    use crate::registry::{HandlerRegistry, RegistryBuilder};
    use serde_json::json;

    fn range(min: &str, max: &str) -> VersionRange {
        VersionRange::parse(min, max).unwrap()
    }

    fn exact(s: &str) -> RequestedVersion {
        RequestedVersion::Exact(s.parse().unwrap())
    }

    fn registry(bindings: &[(&str, &str, &str)]) -> HandlerRegistry {
        let mut builder = RegistryBuilder::new();
        for (action, min, max) in bindings {
            let label = format!("{min}-{max}");
            builder
                .register(action, range(min, max), move |_req: &HandlerRequest| {
                    HandlerResponse::json(200, json!({ "binding": label }))
                })
                .unwrap();
        }
        builder.seal()
    }

    #[test]
    fn test_unspecified_resolves_to_envelope_minimum() {
        let negotiator = Negotiator::new(range("2.1", "2.3"));
        let reg = registry(&[("a", "2.1", "2.3")]);
        match negotiator.negotiate(RequestedVersion::Unspecified, reg.candidates_for("a")) {
            NegotiationResult::Selected {
                effective_version, ..
            } => assert_eq!(effective_version, ApiVersion::new(2, 1)),
            other => panic!("expected selection, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_check_precedes_lookup() {
        let negotiator = Negotiator::new(range("2.1", "3.5"));
        let outcome = negotiator.negotiate(exact("3.7"), &[]);
        match outcome {
            NegotiationResult::OutOfRange {
                requested,
                min,
                max,
            } => {
                assert_eq!(requested, ApiVersion::new(3, 7));
                assert_eq!(min, ApiVersion::new(2, 1));
                assert_eq!(max, ApiVersion::new(3, 5));
            }
            other => panic!("expected out of range, got {other:?}"),
        }
        // Below the envelope too, and even when a binding would cover it.
        let reg = registry(&[("a", "1.0", "9.0")]);
        assert_eq!(
            negotiator.negotiate(exact("2.0"), reg.candidates_for("a")).kind(),
            "out_of_range"
        );
    }

    #[test]
    fn test_below_every_binding_is_not_found() {
        let negotiator = Negotiator::new(range("2.1", "3.5"));
        let reg = registry(&[("b", "2.2", "3.0"), ("b", "3.1", "3.5")]);
        match negotiator.negotiate(exact("2.1"), reg.candidates_for("b")) {
            NegotiationResult::NotFound { effective_version } => {
                assert_eq!(effective_version, ApiVersion::new(2, 1));
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_action_inside_envelope_is_not_found() {
        let negotiator = Negotiator::new(range("2.1", "3.5"));
        let reg = registry(&[]);
        assert_eq!(
            negotiator
                .negotiate(RequestedVersion::Unspecified, reg.candidates_for("missing"))
                .kind(),
            "not_found"
        );
    }

    #[test]
    fn test_first_matching_binding_in_registration_order_wins() {
        // Bindings for different keys may overlap; scanning a merged slice must still
        // be deterministic and pick the earliest registration.
        let reg = registry(&[("x", "2.1", "3.0"), ("y", "2.5", "3.5")]);
        let mut merged: Vec<HandlerBinding> = reg.candidates_for("y").to_vec();
        merged.insert(0, reg.candidates_for("x")[0].clone());
        let negotiator = Negotiator::new(range("2.1", "3.5"));
        match negotiator.negotiate(exact("2.7"), &merged) {
            NegotiationResult::Selected { binding, .. } => assert_eq!(binding.precedence(), 0),
            other => panic!("expected selection, got {other:?}"),
        }
    }
}
