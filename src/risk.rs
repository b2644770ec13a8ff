//! Rule-based risk classification from blood pressure and glucose.
//!
//! Tiers are evaluated High first, then Med, then Low; the first match
//! wins. Every threshold is inclusive on its lower bound.

use serde::{Deserialize, Serialize};

use crate::models::RiskLevel;

/// Clinical cut-offs. Glucose values are mmol/L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub high_systolic: i32,
    pub high_diastolic: i32,
    pub high_glucose: f64,
    pub med_systolic: i32,
    pub med_diastolic: i32,
    pub med_glucose: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_systolic: 160,
            high_diastolic: 100,
            high_glucose: 11.1,
            med_systolic: 140,
            med_diastolic: 90,
            med_glucose: 7.0,
        }
    }
}

impl RiskThresholds {
    /// Classify one reading. Total over all inputs; a NaN glucose never
    /// matches a glucose clause.
    pub fn classify(&self, systolic: i32, diastolic: i32, glucose: f64) -> RiskLevel {
        if systolic >= self.high_systolic
            || diastolic >= self.high_diastolic
            || glucose >= self.high_glucose
        {
            RiskLevel::High
        } else if systolic >= self.med_systolic
            || diastolic >= self.med_diastolic
            || (self.med_glucose..self.high_glucose).contains(&glucose)
        {
            RiskLevel::Med
        } else {
            RiskLevel::Low
        }
    }
}

/// Classify with the default thresholds.
pub fn classify(systolic: i32, diastolic: i32, glucose: f64) -> RiskLevel {
    RiskThresholds::default().classify(systolic, diastolic, glucose)
}

/// Free-text rationale stored with each assessment. Glucose always
/// carries a decimal point (`12.0`, not `12`).
pub fn rationale(systolic: i32, diastolic: i32, glucose: f64) -> String {
    format!("Auto-generated based on BP {systolic}/{diastolic} and Glucose {glucose:?}")
}
