//! UI target resolution
//!
//! Pointer-like sources expose the element under the pointer at a sibling
//! `target` path: for `/input/mouse/button/0` that is `/input/mouse/target`.
//! This filter looks that element up and walks its ancestors to the first
//! one carrying a component.

use crate::error::FilterError;
use crate::filter::Filter;
use crate::input::{InputQuery, InputValue, Parameters, Reading};
use crate::path;

/// Resolves the UI component an input refers to.
///
/// The output is active when the input is active and its value (if any) is
/// truthy. The output value is the [`UiTarget`](crate::input::UiTarget) that
/// owns the component, or `None` if nothing under the pointer has one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetResolutionFilter;

impl Filter for TargetResolutionFilter {
    fn name(&self) -> &str {
        "TargetResolutionFilter"
    }

    fn filter(
        &self,
        input_path: &str,
        reading: Reading,
        _filter_path: &str,
        _parameters: Option<&Parameters>,
        inputs: &dyn InputQuery,
    ) -> Result<Reading, FilterError> {
        let active = reading.active && reading.value.as_ref().is_none_or(InputValue::is_truthy);

        let owner = path::target_path(input_path)
            .and_then(|target_path| inputs.query_input_path(&target_path).value)
            .and_then(|value| value.as_target().and_then(|t| t.component_owner()));

        Ok(Reading::new(active, owner.map(InputValue::Target)))
    }
}
