//! Error types
//!
//! Three families of failure exist:
//!
//! - **Configuration**: an unknown filter, action map or action set was named.
//!   The operation becomes a no-op and a warning is logged.
//! - **Load**: a binding description could not be read or decoded. Bindings
//!   applied before the failure stay in place.
//! - **Contract**: an [`InputSource`](crate::input::InputSource) or
//!   [`Filter`](crate::filter::Filter) returned an error while being evaluated.
//!   Only the affected binding is skipped for that poll.
//!
//! None of these ever abort [`ActionManager::poll`](crate::action::ActionManager::poll).

use thiserror::Error;

/// Errors surfaced by the routing engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// A binding or lookup referenced a filter path nobody registered.
    #[error("unknown filter: {filter_path}")]
    UnknownFilter {
        /// Full semantic path of the filter, like `/filter/min-max`
        filter_path: String,
    },

    /// An action map name was not registered with the manager.
    #[error("unknown action map: {name}")]
    UnknownActionMap {
        /// Map name
        name: String,
    },

    /// An action set name was not registered with the manager.
    #[error("unknown action set: {name}")]
    UnknownActionSet {
        /// Set name
        name: String,
    },

    /// An input source failed while polling or answering a query.
    #[error("input source {prefix} failed")]
    Source {
        /// Prefix the source is mounted at
        prefix: String,
        /// What the source reported
        #[source]
        error: DeviceError,
    },

    /// A filter failed while transforming a reading.
    #[error("filter {filter_path} failed")]
    Filter {
        /// Full semantic path of the filter
        filter_path: String,
        /// What the filter reported
        #[source]
        error: FilterError,
    },

    /// A binding description could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Failure reported by an input source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DeviceError(pub String);

impl DeviceError {
    /// Create a device error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failure reported by a filter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A parameter was present but had the wrong type
    #[error("parameter `{name}` must be {expected}")]
    InvalidParameter {
        /// Parameter key
        name: String,
        /// Human readable description of the expected type
        expected: &'static str,
    },

    /// Any other filter-specific failure
    #[error("{0}")]
    Failed(String),
}

/// Errors that can occur while loading a binding description.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The file could not be read
    #[error("IO error: {0}")]
    Io(String),

    /// The document is not valid JSON / RON, or an entry has the wrong shape
    #[error("parse error: {0}")]
    Parse(String),

    /// An entry lacks a required field
    #[error("entry {index} of `{section}` is missing `{field}`")]
    MissingField {
        /// `inputs` or `filters`
        section: &'static str,
        /// Position of the entry inside its section
        index: usize,
        /// Name of the missing field
        field: &'static str,
    },

    /// The background loader went away without delivering a result
    #[error("background load was abandoned")]
    Disconnected,
}
