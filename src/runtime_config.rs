//! # Runtime Configuration Module
//!
//! Loads the service description (global version envelope and versioned bindings) from
//! YAML and turns it into a ready [`Dispatcher`].
//!
//! ## File Format
//!
//! ```yaml
//! versioning:
//!   min_version: "2.1"
//!   max_version: "3.5"
//!   header: X-OpenStack-Compute-API-Version   # optional
//!   fault_key: computeFault                    # optional
//! resources:
//!   - action: "microversions2:index"
//!     bindings:
//!       - min_version: "2.2"
//!         max_version: "3.0"
//!         status: 200
//!         body: { param: controller2_val1 }
//!       - min_version: "3.1"
//!         max_version: "3.5"
//!         status: 202
//! ```
//!
//! A binding without `body` answers with an echo of the negotiated request.
//!
//! ## Environment Variables
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `MICROVERSION_MIN_VERSION` | `versioning.min_version` |
//! | `MICROVERSION_MAX_VERSION` | `versioning.max_version` |
//! | `MICROVERSION_VERSION_HEADER` | `versioning.header` |
//!
//! Overrides go through [`ServiceConfig::apply_overrides`], which takes the lookup
//! function as a parameter so tests never touch the process environment.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::path::Path;
use tracing::{debug, info};

use crate::dispatcher::{Dispatcher, DEFAULT_FAULT_KEY, DEFAULT_VERSION_HEADER};
use crate::echo::configured_handler;
use crate::negotiation::Negotiator;
use crate::registry::{HandlerRegistry, RegistryBuilder};
use crate::version::{ApiVersion, VersionRange};

pub const ENV_MIN_VERSION: &str = "MICROVERSION_MIN_VERSION";
pub const ENV_MAX_VERSION: &str = "MICROVERSION_MAX_VERSION";
pub const ENV_VERSION_HEADER: &str = "MICROVERSION_VERSION_HEADER";

fn default_version_header() -> String {
    DEFAULT_VERSION_HEADER.to_string()
}

fn default_fault_key() -> String {
    DEFAULT_FAULT_KEY.to_string()
}

fn default_status() -> u16 {
    200
}

/// Global versioning settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersioningConfig {
    pub min_version: ApiVersion,
    pub max_version: ApiVersion,
    #[serde(default = "default_version_header")]
    pub header: String,
    #[serde(default = "default_fault_key")]
    pub fault_key: String,
}

impl VersioningConfig {
    /// The global envelope; fails when `min_version > max_version`
    pub fn envelope(&self) -> Result<VersionRange> {
        VersionRange::new(self.min_version, self.max_version)
            .context("invalid global version envelope")
    }
}

/// One versioned implementation of a resource action
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    pub min_version: ApiVersion,
    pub max_version: ApiVersion,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: Option<Value>,
}

/// All bindings of one resource action, in registration order
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    pub action: String,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

/// Complete service description
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub versioning: VersioningConfig,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

impl ServiceConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("failed to parse service configuration")
    }

    /// Read and parse a YAML file, without environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        debug!(
            path = %path.display(),
            resources = config.resources.len(),
            "Service configuration loaded"
        );
        Ok(config)
    }

    /// Read a YAML file and apply overrides from the process environment
    pub fn from_env(path: &Path) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `MICROVERSION_*` overrides looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MIN_VERSION) {
            self.versioning.min_version = raw
                .parse()
                .with_context(|| format!("invalid {ENV_MIN_VERSION}"))?;
        }
        if let Some(raw) = lookup(ENV_MAX_VERSION) {
            self.versioning.max_version = raw
                .parse()
                .with_context(|| format!("invalid {ENV_MAX_VERSION}"))?;
        }
        if let Some(header) = lookup(ENV_VERSION_HEADER).filter(|h| !h.trim().is_empty()) {
            self.versioning.header = header;
        }
        Ok(())
    }

    /// Validate every binding and seal the registry
    pub fn registry(&self) -> Result<HandlerRegistry> {
        let mut builder = RegistryBuilder::new();
        for resource in &self.resources {
            for binding in &resource.bindings {
                let range = VersionRange::new(binding.min_version, binding.max_version)
                    .with_context(|| format!("invalid binding for '{}'", resource.action))?;
                builder
                    .register_handler(
                        &resource.action,
                        range,
                        configured_handler(binding.status, binding.body.clone()),
                    )
                    .with_context(|| format!("cannot register '{}'", resource.action))?;
            }
        }
        Ok(builder.seal())
    }

    /// Build a dispatcher from this configuration
    ///
    /// Any configuration error aborts here, before a single request is served.
    pub fn build_dispatcher(&self) -> Result<Dispatcher> {
        let envelope = self.versioning.envelope()?;
        let registry = self.registry()?;
        info!(
            envelope = %envelope,
            header = %self.versioning.header,
            resource_actions = self.resources.len(),
            "Building dispatcher from configuration"
        );
        Ok(Dispatcher::new(Negotiator::new(envelope), registry)
            .with_version_header(&self.versioning.header)
            .with_fault_key(&self.versioning.fault_key))
    }
}
