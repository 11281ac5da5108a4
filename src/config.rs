use crate::k8s::namespace::pod_namespace;
use crate::{PeerpingError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_LABEL_SELECTOR: &str = "app=peerping";

/// Selects which pods count as peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DiscoveryConfig {
    pub label_selector: String,
    /// Namespace to list peers in. Falls back to the pod's own namespace.
    pub namespace: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            label_selector: DEFAULT_LABEL_SELECTOR.to_string(),
            namespace: None,
        }
    }
}

impl DiscoveryConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)
            .map_err(|e| PeerpingError::ConfigError(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.label_selector.trim().is_empty() {
            return Err(PeerpingError::ConfigError(
                "label_selector must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies command-line overrides on top of file values.
    pub fn with_overrides(mut self, label_selector: Option<String>, namespace: Option<String>) -> Self {
        if let Some(selector) = label_selector {
            self.label_selector = selector;
        }
        if namespace.is_some() {
            self.namespace = namespace;
        }
        self
    }

    /// Namespace to query: the configured one, else the detected pod
    /// namespace. Empty means all namespaces.
    pub fn effective_namespace(&self) -> String {
        self.resolve_namespace(pod_namespace())
    }

    pub fn resolve_namespace(&self, detected: &str) -> String {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ => detected.to_string(),
        }
    }
}
