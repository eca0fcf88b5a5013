pub mod engine;
pub mod quantitative;
pub mod screen;

use crate::error::AnalysisError;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

pub(crate) fn check_range(name: &'static str, value: f64) -> Result<f64, AnalysisError> {
    if value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value) {
        Ok(value)
    } else {
        Err(AnalysisError::ScoreOutOfRange { name, value })
    }
}
