use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository;
use crate::error::ServiceError;
use crate::models::{Patient, RiskLevel};

pub const DEFAULT_DASHBOARD_WEEKS: u32 = 8;
pub const MAX_DASHBOARD_WEEKS: u32 = 52;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
    pub high: u32,
    pub med: u32,
    pub low: u32,
    pub unassessed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeBucket {
    pub label: &'static str,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyRegistrations {
    /// ISO week, e.g. `2026-W11`.
    pub week: String,
    pub week_start: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_patients: u32,
    pub risk_distribution: RiskDistribution,
    pub age_buckets: Vec<AgeBucket>,
    pub registrations_per_week: Vec<WeeklyRegistrations>,
    pub pending_follow_ups: u32,
    pub overdue_follow_ups: u32,
    pub generated_at: NaiveDateTime,
}

const AGE_BUCKETS: [(&str, i32, i32); 4] = [
    ("under_40", 0, 39),
    ("40_59", 40, 59),
    ("60_74", 60, 74),
    ("75_plus", 75, i32::MAX),
];

pub fn dashboard_summary(
    conn: &Connection,
    weeks: u32,
    now: NaiveDateTime,
) -> Result<DashboardSummary, ServiceError> {
    if weeks == 0 || weeks > MAX_DASHBOARD_WEEKS {
        return Err(ServiceError::validation(format!(
            "Weeks must be between 1 and {MAX_DASHBOARD_WEEKS}"
        )));
    }

    let patients = repository::all_patients(conn)?;
    let latest_levels = repository::get_latest_risk_levels(conn)?;
    let (pending_follow_ups, overdue_follow_ups) = repository::count_open_follow_ups(conn, &now)?;

    let total_patients = patients.len() as u32;

    Ok(DashboardSummary {
        total_patients,
        risk_distribution: risk_distribution(total_patients, latest_levels.iter().map(|(_, l)| *l)),
        age_buckets: age_buckets(&patients),
        registrations_per_week: registrations_per_week(&patients, weeks, now.date()),
        pending_follow_ups,
        overdue_follow_ups,
        generated_at: now,
    })
}

fn risk_distribution(total: u32, levels: impl Iterator<Item = RiskLevel>) -> RiskDistribution {
    let mut dist = RiskDistribution::default();
    for level in levels {
        match level {
            RiskLevel::High => dist.high += 1,
            RiskLevel::Med => dist.med += 1,
            RiskLevel::Low => dist.low += 1,
        }
    }
    dist.unassessed = total.saturating_sub(dist.high + dist.med + dist.low);
    dist
}

fn age_buckets(patients: &[Patient]) -> Vec<AgeBucket> {
    AGE_BUCKETS
        .iter()
        .map(|&(label, lo, hi)| AgeBucket {
            label,
            count: patients
                .iter()
                .filter(|p| (lo..=hi).contains(&p.age))
                .count() as u32,
        })
        .collect()
}

/// Monday of the ISO week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// The last `weeks` ISO weeks up to and including the current one,
/// oldest first, zero-filled.
fn registrations_per_week(
    patients: &[Patient],
    weeks: u32,
    today: NaiveDate,
) -> Vec<WeeklyRegistrations> {
    let current = week_start(today);
    (0..weeks)
        .rev()
        .map(|back| {
            let start = current - Duration::weeks(i64::from(back));
            let end = start + Duration::weeks(1);
            let iso = start.iso_week();
            WeeklyRegistrations {
                week: format!("{}-W{:02}", iso.year(), iso.week()),
                week_start: start,
                count: patients
                    .iter()
                    .filter(|p| {
                        let d = p.created_at.date();
                        d >= start && d < end
                    })
                    .count() as u32,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{at, make_patient, test_db};
    use crate::db::repository::insert_patient;
    use crate::follow_up::FollowUpPolicy;
    use crate::intake::submit_indicator;
    use crate::models::NewIndicator;
    use crate::risk::RiskThresholds;

    fn add_patient(conn: &Connection, age: i32, created: NaiveDateTime) -> Patient {
        let p = make_patient("P", age, created);
        insert_patient(conn, &p).unwrap();
        p
    }

    fn record(
        conn: &mut Connection,
        p: &Patient,
        sys: i32,
        dia: i32,
        glu: f64,
        when: NaiveDateTime,
    ) {
        submit_indicator(
            conn,
            NewIndicator {
                patient_id: p.id,
                systolic: sys,
                diastolic: dia,
                glucose: glu,
                recorded_at: Some(when),
            },
            &RiskThresholds::default(),
            &FollowUpPolicy::default(),
            when,
        )
        .unwrap();
    }

    #[test]
    fn empty_store_yields_zeroes() {
        let conn = test_db();
        let summary = dashboard_summary(&conn, 4, at(2026, 3, 11, 12)).unwrap();
        assert_eq!(summary.total_patients, 0);
        assert_eq!(summary.risk_distribution, RiskDistribution::default());
        assert_eq!(summary.registrations_per_week.len(), 4);
        assert!(summary.registrations_per_week.iter().all(|w| w.count == 0));
        assert_eq!(summary.age_buckets.len(), 4);
    }

    #[test]
    fn risk_counts_use_latest_assessment() {
        let mut conn = test_db();
        let a = add_patient(&conn, 45, at(2026, 3, 2, 9));
        let b = add_patient(&conn, 70, at(2026, 3, 2, 9));
        add_patient(&conn, 30, at(2026, 3, 2, 9));

        record(&mut conn, &a, 170, 105, 12.0, at(2026, 3, 3, 9));
        record(&mut conn, &a, 120, 80, 5.0, at(2026, 3, 4, 9));
        record(&mut conn, &b, 145, 85, 6.0, at(2026, 3, 4, 9));

        let summary = dashboard_summary(&conn, 8, at(2026, 3, 5, 9)).unwrap();
        assert_eq!(
            summary.risk_distribution,
            RiskDistribution { high: 0, med: 1, low: 1, unassessed: 1 }
        );
        assert_eq!(summary.pending_follow_ups, 2);
        assert_eq!(summary.overdue_follow_ups, 0);
    }

    #[test]
    fn overdue_counted_against_now() {
        let mut conn = test_db();
        let a = add_patient(&conn, 45, at(2026, 3, 2, 9));
        record(&mut conn, &a, 170, 105, 12.0, at(2026, 3, 3, 9));

        let summary = dashboard_summary(&conn, 8, at(2026, 3, 20, 9)).unwrap();
        assert_eq!(summary.pending_follow_ups, 1);
        assert_eq!(summary.overdue_follow_ups, 1);
    }

    #[test]
    fn ages_bucketed() {
        let conn = test_db();
        for age in [20, 39, 40, 59, 60, 74, 75, 90] {
            add_patient(&conn, age, at(2026, 3, 2, 9));
        }
        let summary = dashboard_summary(&conn, 1, at(2026, 3, 5, 9)).unwrap();
        let counts: Vec<_> = summary.age_buckets.iter().map(|b| (b.label, b.count)).collect();
        assert_eq!(
            counts,
            vec![("under_40", 2), ("40_59", 2), ("60_74", 2), ("75_plus", 2)]
        );
    }

    #[test]
    fn registrations_grouped_by_iso_week() {
        let conn = test_db();
        // 2026-03-09 is a Monday (ISO week 11)
        add_patient(&conn, 50, at(2026, 3, 9, 8));
        add_patient(&conn, 50, at(2026, 3, 15, 23));
        add_patient(&conn, 50, at(2026, 3, 3, 8));
        add_patient(&conn, 50, at(2025, 12, 1, 8));

        let summary = dashboard_summary(&conn, 3, at(2026, 3, 11, 12)).unwrap();
        let weeks: Vec<_> = summary
            .registrations_per_week
            .iter()
            .map(|w| (w.week.as_str(), w.count))
            .collect();
        assert_eq!(weeks, vec![("2026-W09", 0), ("2026-W10", 1), ("2026-W11", 2)]);
        assert_eq!(
            summary.registrations_per_week[2].week_start,
            NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
        );
        assert_eq!(summary.total_patients, 4);
    }

    #[test]
    fn weeks_bounds_validated() {
        let conn = test_db();
        let now = at(2026, 3, 11, 12);
        assert!(matches!(dashboard_summary(&conn, 0, now), Err(ServiceError::Validation(_))));
        assert!(matches!(dashboard_summary(&conn, 53, now), Err(ServiceError::Validation(_))));
    }
}
