use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::RegistryError;
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::version::VersionRange;

/// Maximum bindings per resource action before heap allocation.
/// Most actions carry one to three microversion variants.
pub const MAX_INLINE_BINDINGS: usize = 4;

/// Handler implementation shared between threads
pub type HandlerFn = Arc<dyn Fn(&HandlerRequest) -> HandlerResponse + Send + Sync>;

/// Ordered bindings for one resource action (stack-allocated for ≤4 bindings)
pub type BindingVec = SmallVec<[HandlerBinding; MAX_INLINE_BINDINGS]>;

/// One versioned handler for a resource action
///
/// Immutable once registered. Cloning is cheap: the key and the handler are both
/// reference counted.
#[derive(Clone)]
pub struct HandlerBinding {
    resource_action: Arc<str>,
    range: VersionRange,
    handler: HandlerFn,
    precedence: usize,
}

impl HandlerBinding {
    #[must_use]
    pub fn resource_action(&self) -> &str {
        &self.resource_action
    }

    #[must_use]
    pub fn range(&self) -> VersionRange {
        self.range
    }

    /// Position in global registration order, starting at 0
    #[must_use]
    pub fn precedence(&self) -> usize {
        self.precedence
    }

    /// Run the bound implementation
    pub fn invoke(&self, req: &HandlerRequest) -> HandlerResponse {
        (self.handler)(req)
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("resource_action", &self.resource_action)
            .field("range", &self.range)
            .field("precedence", &self.precedence)
            .finish_non_exhaustive()
    }
}

/// Mutable registration phase of the handler table
///
/// Only exists during startup. [`RegistryBuilder::seal`] turns it into the read-only
/// [`HandlerRegistry`] used on the request path.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    bindings: HashMap<Arc<str>, BindingVec>,
    next_precedence: usize,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding for `resource_action`
    ///
    /// Fails with [`RegistryError::OverlapConflict`] when `range` shares any version with
    /// a range already registered for the same key. Adjacent ranges such as
    /// `[2.1, 3.0]` and `[3.1, 3.5]` are accepted.
    pub fn register<F>(
        &mut self,
        resource_action: &str,
        range: VersionRange,
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.register_handler(resource_action, range, Arc::new(handler))
    }

    /// Same as [`RegistryBuilder::register`] for an already shared handler
    pub fn register_handler(
        &mut self,
        resource_action: &str,
        range: VersionRange,
        handler: HandlerFn,
    ) -> Result<&mut Self, RegistryError> {
        if resource_action.trim().is_empty() {
            return Err(RegistryError::EmptyResourceAction);
        }

        if let Some(existing) = self
            .bindings
            .get(resource_action)
            .and_then(|bound| bound.iter().find(|b| b.range.overlaps(&range)))
        {
            warn!(
                resource_action = %resource_action,
                existing = %existing.range,
                rejected = %range,
                "Overlapping handler range rejected"
            );
            return Err(RegistryError::OverlapConflict {
                resource_action: resource_action.to_string(),
                existing: existing.range,
                rejected: range,
            });
        }

        let key: Arc<str> = match self.bindings.get_key_value(resource_action) {
            Some((k, _)) => Arc::clone(k),
            None => Arc::from(resource_action),
        };
        let binding = HandlerBinding {
            resource_action: Arc::clone(&key),
            range,
            handler,
            precedence: self.next_precedence,
        };
        self.next_precedence += 1;

        debug!(
            resource_action = %resource_action,
            range = %range,
            precedence = binding.precedence,
            "Handler binding registered"
        );
        self.bindings.entry(key).or_default().push(binding);
        Ok(self)
    }

    /// Number of bindings registered so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.next_precedence
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next_precedence == 0
    }

    /// Finish registration
    ///
    /// The returned registry exposes lookups only, so no writer can exist once the
    /// service starts accepting traffic.
    #[must_use]
    pub fn seal(self) -> HandlerRegistry {
        info!(
            resource_actions = self.bindings.len(),
            bindings = self.next_precedence,
            "Handler registry sealed"
        );
        HandlerRegistry {
            bindings: self.bindings,
            binding_count: self.next_precedence,
        }
    }
}

/// Read-only handler table, indexed by resource action
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    bindings: HashMap<Arc<str>, BindingVec>,
    binding_count: usize,
}

impl HandlerRegistry {
    /// Bindings for `resource_action` in registration order; empty when unknown
    #[inline]
    #[must_use]
    pub fn candidates_for(&self, resource_action: &str) -> &[HandlerBinding] {
        self.bindings
            .get(resource_action)
            .map(|b| b.as_slice())
            .unwrap_or(&[])
    }

    /// Resource action keys, sorted for stable output
    #[must_use]
    pub fn resource_actions(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.bindings.keys().map(|k| k.as_ref()).collect();
        keys.sort_unstable();
        keys
    }

    /// Iterate every binding in global registration order
    pub fn iter(&self) -> impl Iterator<Item = &HandlerBinding> {
        let mut all: Vec<&HandlerBinding> = self.bindings.values().flatten().collect();
        all.sort_by_key(|b| b.precedence);
        all.into_iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.binding_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binding_count == 0
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("resource_actions", &self.resource_actions())
            .field("bindings", &self.binding_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(_req: &HandlerRequest) -> HandlerResponse {
        HandlerResponse::json(200, json!({}))
    }

    fn range(min: &str, max: &str) -> VersionRange {
        VersionRange::parse(min, max).unwrap()
    }

    #[test]
    fn test_precedence_follows_registration_order() {
        let mut builder = RegistryBuilder::new();
        builder.register("b", range("2.1", "2.1"), ok).unwrap();
        builder.register("a", range("2.1", "2.1"), ok).unwrap();
        builder.register("b", range("2.2", "2.5"), ok).unwrap();
        let registry = builder.seal();

        let b: Vec<usize> = registry
            .candidates_for("b")
            .iter()
            .map(HandlerBinding::precedence)
            .collect();
        assert_eq!(b, vec![0, 2]);
        let order: Vec<&str> = registry.iter().map(HandlerBinding::resource_action).collect();
        assert_eq!(order, vec!["b", "a", "b"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_rejected_binding_is_not_stored() {
        let mut builder = RegistryBuilder::new();
        builder.register("a", range("2.1", "3.0"), ok).unwrap();
        assert!(builder.register("a", range("2.5", "2.6"), ok).is_err());
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.seal().candidates_for("a").len(), 1);
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut builder = RegistryBuilder::new();
        let err = builder.register("  ", range("2.1", "2.1"), ok).unwrap_err();
        assert_eq!(err, RegistryError::EmptyResourceAction);
        assert!(builder.is_empty());
    }
}
