//! Manager configuration

use serde::{Deserialize, Serialize};

use crate::core::EventQueue;
use crate::error::LoadError;
use crate::path;

/// Manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Root under which input sources are mounted
    pub input_root: String,
    /// Root under which filters are registered
    pub filter_root: String,
    /// Register the built-in filters on construction
    pub default_filters: bool,
    /// Initial capacity of the per-poll transition queue
    pub event_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            input_root: String::from(path::INPUT_ROOT),
            filter_root: String::from(path::FILTER_ROOT),
            default_filters: true,
            event_capacity: EventQueue::<()>::DEFAULT_CAPACITY,
        }
    }
}

impl ManagerConfig {
    /// Set the input root
    #[must_use]
    pub fn with_input_root(mut self, root: impl Into<String>) -> Self {
        self.input_root = root.into();
        self
    }

    /// Set the filter root
    #[must_use]
    pub fn with_filter_root(mut self, root: impl Into<String>) -> Self {
        self.filter_root = root.into();
        self
    }

    /// Enable or disable registration of the built-in filters
    #[must_use]
    pub fn with_default_filters(mut self, enabled: bool) -> Self {
        self.default_filters = enabled;
        self
    }

    /// Set the transition queue capacity
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Parse a configuration from RON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid RON for this shape.
    pub fn from_ron_str(text: &str) -> Result<Self, LoadError> {
        ron::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.input_root, "/input");
        assert_eq!(config.filter_root, "/filter");
        assert!(config.default_filters);
    }

    #[test]
    fn test_builder() {
        let config = ManagerConfig::default()
            .with_input_root("/in")
            .with_default_filters(false)
            .with_event_capacity(8);
        assert_eq!(config.input_root, "/in");
        assert!(!config.default_filters);
        assert_eq!(config.event_capacity, 8);
    }

    #[test]
    fn test_from_ron() {
        let config = ManagerConfig::from_ron_str("(default_filters: false)").unwrap();
        assert!(!config.default_filters);
        assert_eq!(config.filter_root, "/filter");

        assert!(ManagerConfig::from_ron_str("(default_filters: 3)").is_err());
    }
}
