//! Filters
//!
//! A filter sits between an input reading and the action it is bound to and
//! transforms the `(active, value)` pair. Filters are registered once with the
//! manager under `/filter/<name>` and shared by every action map that
//! references them, so `filter` takes `&self`: it must behave as a pure
//! function of its arguments. A filter that needs timers or counters keeps
//! them behind interior mutability and is responsible for keeping its output
//! deterministic for equal inputs.
//!
//! # Built-in filters
//!
//! | Name                | Behaviour                                               |
//! |---------------------|---------------------------------------------------------|
//! | `min-max`           | active only while the value lies in a numeric range     |
//! | `reverse-active`    | invert the active flag, keep the value                  |
//! | `add-value`         | add the `value` parameter to the numeric value          |
//! | `target-resolution` | resolve the UI component under the pointer              |

mod add_value;
mod min_max;
mod reverse_active;
mod target;

use std::sync::Arc;

pub use add_value::AddValueFilter;
pub use min_max::MinMaxFilter;
pub use reverse_active::ReverseActiveFilter;
pub use target::TargetResolutionFilter;

use crate::error::FilterError;
use crate::input::{InputQuery, Parameters, Reading};

/// Transform applied to a reading before it reaches an action.
pub trait Filter: Send + Sync {
    /// Human readable name for diagnostics.
    fn name(&self) -> &str {
        "Filter"
    }

    /// Transform `reading`, taken from `input_path`, using the parameters the
    /// binding supplied for `filter_path`.
    ///
    /// `inputs` gives read access to every registered source, for filters that
    /// need to look at a related input path.
    ///
    /// # Errors
    ///
    /// An error skips this binding for the current poll only.
    fn filter(
        &self,
        input_path: &str,
        reading: Reading,
        filter_path: &str,
        parameters: Option<&Parameters>,
        inputs: &dyn InputQuery,
    ) -> Result<Reading, FilterError>;
}

/// Shared handle to a registered filter.
pub type SharedFilter = Arc<dyn Filter>;

/// The built-in filters with the names they are registered under.
#[must_use]
pub fn default_filters() -> Vec<(&'static str, SharedFilter)> {
    vec![
        ("min-max", Arc::new(MinMaxFilter)),
        ("reverse-active", Arc::new(ReverseActiveFilter)),
        ("add-value", Arc::new(AddValueFilter)),
        ("target-resolution", Arc::new(TargetResolutionFilter)),
    ]
}

/// Read an optional numeric parameter.
///
/// A missing key is `Ok(None)`; a key holding anything but a number is an error.
pub(crate) fn number_parameter(
    parameters: Option<&Parameters>,
    name: &str,
) -> Result<Option<f64>, FilterError> {
    let Some(value) = parameters.and_then(|p| p.get(name)) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| FilterError::InvalidParameter {
            name: name.to_string(),
            expected: "a number",
        })
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_filter_names() {
        let names: Vec<_> = default_filters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            ["min-max", "reverse-active", "add-value", "target-resolution"]
        );
    }

    #[test]
    fn test_number_parameter() {
        let params = json!({ "a": 2.5, "b": "x", "c": null });
        let params = params.as_object();

        assert_eq!(number_parameter(params, "a"), Ok(Some(2.5)));
        assert_eq!(number_parameter(params, "c"), Ok(None));
        assert_eq!(number_parameter(params, "missing"), Ok(None));
        assert_eq!(number_parameter(None, "a"), Ok(None));
        assert!(number_parameter(params, "b").is_err());
    }
}
