use crate::error::FilterError;
use crate::filter::{Filter, number_parameter};
use crate::input::{InputQuery, InputValue, Parameters, Reading};

/// Adds the `value` parameter to the numeric input value.
///
/// A missing or non-numeric input counts as `0`, as does a missing parameter.
/// The active flag passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddValueFilter;

impl Filter for AddValueFilter {
    fn name(&self) -> &str {
        "AddValueFilter"
    }

    fn filter(
        &self,
        _input_path: &str,
        reading: Reading,
        _filter_path: &str,
        parameters: Option<&Parameters>,
        _inputs: &dyn InputQuery,
    ) -> Result<Reading, FilterError> {
        let base = reading
            .value
            .as_ref()
            .and_then(InputValue::as_number)
            .unwrap_or(0.0);
        let offset = number_parameter(parameters, "value")?.unwrap_or(0.0);
        Ok(Reading::new(reading.active, Some(InputValue::Number(base + offset))))
    }
}
