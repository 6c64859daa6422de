//! revenue.rs — windowed views → estimated USD via an assumed RPM
//! (revenue per 1000 views). Pure; the only failure is a non-positive rate.

use crate::error::{AnalyzeError, Result};

/// Assumed USD revenue per 1k views (tuneable).
pub const DEFAULT_RPM: f64 = 5.0;

pub fn estimate_revenue(views: u64, rpm: f64) -> Result<f64> {
    if !(rpm > 0.0) || !rpm.is_finite() {
        return Err(AnalyzeError::validation(format!(
            "rpm must be a positive finite number, got {rpm}"
        )));
    }
    Ok(views as f64 / 1000.0 * rpm)
}
