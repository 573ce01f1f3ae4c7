//! Range gate

use crate::error::FilterError;
use crate::filter::{Filter, number_parameter};
use crate::input::{InputQuery, InputValue, Parameters, Reading};

/// Activates only while the numeric value lies within `minimum..=maximum`.
///
/// Parameters:
/// - `minimum` (default `-1`)
/// - `maximum` (default `1`)
/// - `minimum-absolute`: optional floor on `|value|`, a simple dead zone
///
/// An inactive input, or a value that is not numeric, yields an inactive
/// reading with no value. On success the output carries the parsed number.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMaxFilter;

impl MinMaxFilter {
    /// Lower bound used when `minimum` is not given
    pub const DEFAULT_MINIMUM: f64 = -1.0;
    /// Upper bound used when `maximum` is not given
    pub const DEFAULT_MAXIMUM: f64 = 1.0;
}

impl Filter for MinMaxFilter {
    fn name(&self) -> &str {
        "MinMaxFilter"
    }

    fn filter(
        &self,
        _input_path: &str,
        reading: Reading,
        _filter_path: &str,
        parameters: Option<&Parameters>,
        _inputs: &dyn InputQuery,
    ) -> Result<Reading, FilterError> {
        if !reading.active {
            return Ok(Reading::inactive());
        }
        let Some(input) = reading.value.as_ref().and_then(InputValue::as_number) else {
            return Ok(Reading::inactive());
        };

        let minimum = number_parameter(parameters, "minimum")?.unwrap_or(Self::DEFAULT_MINIMUM);
        let maximum = number_parameter(parameters, "maximum")?.unwrap_or(Self::DEFAULT_MAXIMUM);
        if input < minimum || input > maximum {
            return Ok(Reading::inactive());
        }
        if let Some(floor) = number_parameter(parameters, "minimum-absolute")?
            && input.abs() < floor
        {
            return Ok(Reading::inactive());
        }

        Ok(Reading::active(input))
    }
}
