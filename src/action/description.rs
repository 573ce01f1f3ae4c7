//! Binding descriptions
//!
//! A binding description is the serialized form of an action map:
//!
//! ```json
//! {
//!   "inputs": [
//!     { "source": "/input/keyboard/key/32", "destination": "/action/jump" }
//!   ],
//!   "filters": [
//!     {
//!       "source": "/input/gamepad/0/axis/1",
//!       "destination": "/action/move-forward",
//!       "actionParameters": { "speed": 2 },
//!       "filter": "/filter/min-max",
//!       "filterParameters": { "minimum": 0.1, "maximum": 1 }
//!     }
//!   ]
//! }
//! ```
//!
//! JSON documents are applied entry by entry, so a malformed entry leaves
//! every entry before it bound. RON documents are decoded as a whole.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LoadError;
use crate::input::Parameters;

/// A plain input → action binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEntry {
    /// Input path
    pub source: String,
    /// Action path
    pub destination: String,
    /// Action parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

/// An input → filter → action binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterEntry {
    /// Input path
    pub source: String,
    /// Action path
    pub destination: String,
    /// Action parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_parameters: Option<Parameters>,
    /// Filter path
    pub filter: String,
    /// Filter parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_parameters: Option<Parameters>,
}

/// Decoded binding description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingDescription {
    /// Unfiltered bindings
    #[serde(default)]
    pub inputs: Vec<InputEntry>,
    /// Filtered bindings
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

/// One entry of either section, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// From `inputs`
    Input(InputEntry),
    /// From `filters`
    Filter(FilterEntry),
}

impl BindingDescription {
    /// Decode a whole JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON or an entry is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| LoadError::Parse(e.to_string()))?;
        let mut description = Self::default();
        for_each_entry(&value, |entry| match entry {
            Entry::Input(e) => description.inputs.push(e),
            Entry::Filter(e) => description.filters.push(e),
        })?;
        Ok(description)
    }

    /// Decode a whole RON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid RON for this shape.
    pub fn from_ron_str(text: &str) -> Result<Self, LoadError> {
        ron::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))
    }

    /// Encode as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self) -> Result<String, LoadError> {
        serde_json::to_string_pretty(self).map_err(|e| LoadError::Parse(e.to_string()))
    }

    /// Number of entries across both sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len() + self.filters.len()
    }

    /// Whether both sections are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.filters.is_empty()
    }

    /// Every entry in application order: all of `inputs`, then `filters`.
    pub(crate) fn into_entries(self) -> Vec<Entry> {
        self.inputs
            .into_iter()
            .map(Entry::Input)
            .chain(self.filters.into_iter().map(Entry::Filter))
            .collect()
    }
}

/// Read a binding file and decode as many entries as possible.
///
/// Returns the entries decoded before the first failure, plus that failure.
/// JSON stops at the first malformed entry; RON and unreadable files yield
/// nothing but the error.
pub(crate) fn read_entries(path: &Path) -> (Vec<Entry>, Option<LoadError>) {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return (Vec::new(), Some(LoadError::Io(e.to_string()))),
    };

    if is_ron(path) {
        return match BindingDescription::from_ron_str(&content) {
            Ok(description) => (description.into_entries(), None),
            Err(err) => (Vec::new(), Some(err)),
        };
    }

    let document: Value = match serde_json::from_str(&content) {
        Ok(document) => document,
        Err(e) => return (Vec::new(), Some(LoadError::Parse(e.to_string()))),
    };
    let mut entries = Vec::new();
    let error = for_each_entry(&document, |entry| entries.push(entry)).err();
    (entries, error)
}

pub(crate) fn is_ron(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ron"))
}

/// Decode `document` entry by entry, handing each one to `apply` as soon as it
/// is decoded: all of `inputs` first, then `filters`.
///
/// Stops at the first malformed entry; everything handed out before it stays
/// handed out. Returns the number of entries applied.
pub(crate) fn for_each_entry(
    document: &Value,
    mut apply: impl FnMut(Entry),
) -> Result<usize, LoadError> {
    let Some(object) = document.as_object() else {
        return Err(LoadError::Parse(
            "binding description must be an object".to_string(),
        ));
    };

    let mut applied = 0;
    for (index, raw) in section(object, "inputs")?.iter().enumerate() {
        require(raw, "inputs", index, &["source", "destination"])?;
        let entry: InputEntry = serde_json::from_value(raw.clone())
            .map_err(|e| LoadError::Parse(format!("inputs[{index}]: {e}")))?;
        apply(Entry::Input(entry));
        applied += 1;
    }
    for (index, raw) in section(object, "filters")?.iter().enumerate() {
        require(raw, "filters", index, &["source", "destination", "filter"])?;
        let entry: FilterEntry = serde_json::from_value(raw.clone())
            .map_err(|e| LoadError::Parse(format!("filters[{index}]: {e}")))?;
        apply(Entry::Filter(entry));
        applied += 1;
    }
    Ok(applied)
}

fn section<'a>(
    object: &'a serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<&'a [Value], LoadError> {
    match object.get(name) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(entries)) => Ok(entries),
        Some(_) => Err(LoadError::Parse(format!("`{name}` must be an array"))),
    }
}

fn require(
    raw: &Value,
    section: &'static str,
    index: usize,
    fields: &[&'static str],
) -> Result<(), LoadError> {
    for &field in fields {
        if raw.get(field).is_none_or(Value::is_null) {
            return Err(LoadError::MissingField {
                section,
                index,
                field,
            });
        }
    }
    Ok(())
}
