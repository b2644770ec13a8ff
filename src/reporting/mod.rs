//! Read-only reporting over stored indicators, assessments and
//! follow-ups. Nothing here writes.

pub mod dashboard;
pub mod trend;

pub use dashboard::*;
pub use trend::*;

/// Round to `decimals` places, half away from zero.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
