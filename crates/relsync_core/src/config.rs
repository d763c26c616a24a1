//! Configuration for the synchronization engine.

use serde::{Deserialize, Serialize};

/// Engine-wide behaviour switches.
///
/// Defaults keep the permissive behaviour: identifiers naming unknown
/// components simply keep nothing, and relations that cannot filter in the
/// store are rejected unless a synchronization hook handles them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reject identifier components that are not part of the field's
    /// identifier shape instead of letting them match nothing.
    pub strict_components: bool,
    /// When a relation cannot evaluate predicates in the store and no
    /// synchronization hook exists, fetch every member and filter in memory.
    pub client_side_filter: bool,
}

impl EngineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether unknown identifier components are rejected.
    #[must_use]
    pub const fn with_strict_components(mut self, value: bool) -> Self {
        self.strict_components = value;
        self
    }

    /// Sets whether opaque relations fall back to in-memory filtering.
    #[must_use]
    pub const fn with_client_side_filter(mut self, value: bool) -> Self {
        self.client_side_filter = value;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_components: false,
            client_side_filter: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert!(!config.strict_components);
        assert!(!config.client_side_filter);
    }

    #[test]
    fn builder_pattern() {
        let config = EngineConfig::new()
            .with_strict_components(true)
            .with_client_side_filter(true);
        assert!(config.strict_components);
        assert!(config.client_side_filter);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"client_side_filter":true}"#).unwrap();
        assert!(config.client_side_filter);
        assert!(!config.strict_components);
    }
}
