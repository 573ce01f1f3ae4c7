//! Input source contract
//!
//! An input source owns one family of devices (keyboard, gamepads, a scripted
//! table...) and answers queries for paths relative to where it is mounted.
//! Sources backed by asynchronous hardware buffer internally and answer
//! queries synchronously from the state captured by their last `poll()`.

use std::fmt;
use std::sync::Arc;

use crate::error::{DeviceError, InputError};
use crate::input::InputValue;

/// `(active, value)` pair produced by sources and filters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reading {
    /// Whether the input is currently engaged
    pub active: bool,
    /// Optional payload (axis position, key code, target element...)
    pub value: Option<InputValue>,
}

impl Reading {
    /// Create a reading from its parts.
    #[must_use]
    pub fn new(active: bool, value: Option<InputValue>) -> Self {
        Self { active, value }
    }

    /// An inactive reading with no value.
    #[must_use]
    pub fn inactive() -> Self {
        Self::default()
    }

    /// An active reading carrying `value`.
    #[must_use]
    pub fn active(value: impl Into<InputValue>) -> Self {
        Self {
            active: true,
            value: Some(value.into()),
        }
    }
}

/// Identifies the registered source that produced a reading.
///
/// Cheap to clone; stored in action state and handed to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    prefix: Arc<str>,
    name: Arc<str>,
}

impl SourceRef {
    /// Create a reference for a source mounted at `prefix`.
    #[must_use]
    pub fn new(prefix: &str, name: &str) -> Self {
        Self {
            prefix: Arc::from(prefix),
            name: Arc::from(name),
        }
    }

    /// Full path prefix the source is mounted at, like `/input/keyboard`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Human readable source name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.prefix, self.name)
    }
}

/// Result of a full-path query: the reading plus the source that answered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputReading {
    /// Whether the input is currently engaged
    pub active: bool,
    /// Optional payload
    pub value: Option<InputValue>,
    /// Source that answered, `None` if no prefix matched
    pub source: Option<SourceRef>,
}

impl InputReading {
    /// The reading without its source.
    #[must_use]
    pub fn reading(&self) -> Reading {
        Reading::new(self.active, self.value.clone())
    }
}

/// A device family mounted under a path prefix.
///
/// Only [`query_input_path`](InputSource::query_input_path) is required; the
/// rest have no-op defaults.
pub trait InputSource: Send {
    /// Human readable name for diagnostics.
    fn name(&self) -> &str {
        "InputSource"
    }

    /// Refresh internal state. Called once at the top of every poll.
    ///
    /// # Errors
    ///
    /// A failure is logged and the source keeps answering from its previous
    /// state; other sources are unaffected.
    fn poll(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Answer a query for a path relative to the mount prefix, like
    /// `/key/32` for a keyboard mounted at `/input/keyboard`.
    ///
    /// # Errors
    ///
    /// A failure disables only the bindings on this path for the current poll.
    fn query_input_path(&self, relative_path: &str) -> Result<Reading, DeviceError>;

    /// Request a haptic pulse. Returns `false` when the source has no haptics.
    fn send_haptic_pulse(&mut self, _milliseconds: u32) -> bool {
        false
    }
}

/// Full-path query capability.
///
/// Implemented by the manager's source registry and handed to action maps and
/// filters during evaluation.
pub trait InputQuery {
    /// Resolve `full_path` to a source and query it.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Source`] when the matching source fails.
    fn try_query_input_path(&self, full_path: &str) -> Result<InputReading, InputError>;

    /// Like [`try_query_input_path`](InputQuery::try_query_input_path), but a
    /// failing source is logged and reported as an inactive reading.
    fn query_input_path(&self, full_path: &str) -> InputReading {
        match self.try_query_input_path(full_path) {
            Ok(reading) => reading,
            Err(err) => {
                log::warn!("query for {full_path} failed: {err}");
                InputReading::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl InputQuery for Broken {
        fn try_query_input_path(&self, _full_path: &str) -> Result<InputReading, InputError> {
            Err(InputError::Source {
                prefix: "/input/broken".to_string(),
                error: DeviceError::new("boom"),
            })
        }
    }

    #[test]
    fn test_reading_constructors() {
        assert_eq!(Reading::inactive(), Reading::new(false, None));
        let reading = Reading::active(3.0);
        assert!(reading.active);
        assert_eq!(reading.value, Some(InputValue::Number(3.0)));
    }

    #[test]
    fn test_failing_query_reads_inactive() {
        let reading = Broken.query_input_path("/input/broken/a");
        assert!(!reading.active);
        assert!(reading.value.is_none());
        assert!(reading.source.is_none());
    }

    #[test]
    fn test_source_ref_display() {
        let source = SourceRef::new("/input/keyboard", "Keyboard");
        assert_eq!(source.to_string(), "/input/keyboard (Keyboard)");
    }
}
