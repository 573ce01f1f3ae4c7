use crate::error::FilterError;
use crate::filter::Filter;
use crate::input::{InputQuery, Parameters, Reading};

/// Inverts the active flag and passes the value through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseActiveFilter;

impl Filter for ReverseActiveFilter {
    fn name(&self) -> &str {
        "ReverseActiveFilter"
    }

    fn filter(
        &self,
        _input_path: &str,
        reading: Reading,
        _filter_path: &str,
        _parameters: Option<&Parameters>,
        _inputs: &dyn InputQuery,
    ) -> Result<Reading, FilterError> {
        Ok(Reading::new(!reading.active, reading.value))
    }
}
