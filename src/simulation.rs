//! Synthetic data for demos and load checks.
//!
//! Each simulated patient gets a personal baseline and a reading every
//! two to three days across the window. Every reading goes through
//! `submit_indicator`, so assessments and follow-ups are produced the
//! same way live submissions produce them.

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::intake;
use crate::models::{NewIndicator, NewPatient};
use crate::patients;

pub const DEFAULT_SEED_PATIENTS: u32 = 50;
pub const DEFAULT_SEED_DAYS: u32 = 90;

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub patients: u32,
    pub days: u32,
    /// Fixed RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            patients: DEFAULT_SEED_PATIENTS,
            days: DEFAULT_SEED_DAYS,
            rng_seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub patients: u32,
    pub indicators: u32,
}

struct Baseline {
    systolic: i32,
    diastolic: i32,
    glucose: f64,
}

impl Baseline {
    fn random(rng: &mut impl Rng) -> Self {
        Self {
            systolic: rng.gen_range(110..=150),
            diastolic: rng.gen_range(70..=95),
            glucose: rng.gen_range(4.5_f64..8.5),
        }
    }

    fn reading(&self, rng: &mut impl Rng) -> (i32, i32, f64) {
        let systolic = self.systolic + rng.gen_range(-10..=20_i32);
        let diastolic = (self.diastolic + rng.gen_range(-5..=10_i32)).min(systolic - 10);
        let glucose = ((self.glucose + rng.gen_range(-1.0_f64..3.0)) * 10.0).round() / 10.0;
        (systolic, diastolic, glucose)
    }
}

/// Populate the store with `options.patients` patients and `options.days`
/// of readings ending at `now`.
pub fn seed(
    conn: &mut Connection,
    config: &AppConfig,
    options: &SeedOptions,
    now: NaiveDateTime,
) -> Result<SeedReport, ServiceError> {
    let mut rng = match options.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let start = now - Duration::days(i64::from(options.days));
    let mut report = SeedReport::default();

    for i in 1..=options.patients {
        let patient = patients::create_patient(
            conn,
            NewPatient {
                name: format!("Patient_{i:03}"),
                age: rng.gen_range(20..=85),
                gender: if rng.gen_bool(0.5) { "Male" } else { "Female" }.to_string(),
                contact_info: Some(format!("patient{i}@example.com")),
            },
            now,
        )?;
        report.patients += 1;

        let baseline = Baseline::random(&mut rng);
        let mut current = start;
        while current < now {
            let (systolic, diastolic, glucose) = baseline.reading(&mut rng);
            // Processed as of the reading time so follow-ups supersede in order
            intake::submit_indicator(
                conn,
                NewIndicator {
                    patient_id: patient.id,
                    systolic,
                    diastolic,
                    glucose,
                    recorded_at: Some(current),
                },
                &config.risk,
                &config.follow_up,
                current,
            )?;
            report.indicators += 1;
            current += Duration::days(rng.gen_range(2..=3));
        }
    }

    tracing::info!(
        patients = report.patients,
        indicators = report.indicators,
        "Simulation complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository;
    use crate::db::repository::test_support::{at, test_db};
    use crate::models::Page;

    fn options(patients: u32, days: u32) -> SeedOptions {
        SeedOptions {
            patients,
            days,
            rng_seed: Some(7),
        }
    }

    #[test]
    fn readings_every_two_to_three_days() {
        let mut conn = test_db();
        let config = AppConfig::with_db_path("unused.db".into());
        let now = at(2026, 3, 1, 9);

        let report = seed(&mut conn, &config, &options(3, 30), now).unwrap();
        assert_eq!(report.patients, 3);
        // 30 days at one reading per 2..=3 days
        assert!((30..=45).contains(&report.indicators));

        for patient in repository::list_patients(&conn, &Page::default()).unwrap() {
            let readings = repository::get_indicators_for_patient(&conn, &patient.id).unwrap();
            assert!((10..=15).contains(&readings.len()));
            assert!(readings.iter().all(|r| r.recorded_at < now));
            assert!(readings.iter().all(|r| r.diastolic < r.systolic));

            // Close-then-create leaves exactly one open task per patient
            let follow_ups = repository::get_follow_ups_for_patient(&conn, &patient.id).unwrap();
            assert_eq!(follow_ups.len(), readings.len());
            assert_eq!(follow_ups.iter().filter(|f| f.is_pending()).count(), 1);
        }
    }

    #[test]
    fn same_seed_same_data() {
        let config = AppConfig::with_db_path("unused.db".into());
        let now = at(2026, 3, 1, 9);

        let mut a = test_db();
        let mut b = test_db();
        let ra = seed(&mut a, &config, &options(2, 20), now).unwrap();
        let rb = seed(&mut b, &config, &options(2, 20), now).unwrap();
        assert_eq!(ra.indicators, rb.indicators);
    }

    #[test]
    fn zero_patients_is_a_no_op() {
        let mut conn = test_db();
        let config = AppConfig::with_db_path("unused.db".into());
        let report = seed(&mut conn, &config, &options(0, 30), at(2026, 3, 1, 9)).unwrap();
        assert_eq!(report.indicators, 0);
    }
}
