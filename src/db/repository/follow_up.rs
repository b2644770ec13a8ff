use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{FollowUp, FollowUpFilter, FollowUpStatus};

use super::{fmt_datetime, parse_datetime, parse_enum, parse_uuid};

const FOLLOW_UP_COLUMNS: &str =
    "id, patient_id, task_description, status, due_date, completed_at, created_at";

pub fn insert_follow_up(conn: &Connection, f: &FollowUp) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO follow_ups
             (id, patient_id, task_description, status, due_date, completed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            f.id.to_string(),
            f.patient_id.to_string(),
            f.task_description,
            f.status.as_str(),
            fmt_datetime(&f.due_date),
            f.completed_at.as_ref().map(fmt_datetime),
            fmt_datetime(&f.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_follow_up(conn: &Connection, id: &Uuid) -> Result<Option<FollowUp>, DatabaseError> {
    let sql = format!("SELECT {FOLLOW_UP_COLUMNS} FROM follow_ups WHERE id = ?1");
    conn.query_row(&sql, params![id.to_string()], row_to_follow_up)
        .optional()
        .map_err(DatabaseError::from)
}

/// All follow-ups of a patient, newest first.
pub fn get_follow_ups_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<FollowUp>, DatabaseError> {
    let sql = format!(
        "SELECT {FOLLOW_UP_COLUMNS} FROM follow_ups
         WHERE patient_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id.to_string()], row_to_follow_up)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Mark every pending follow-up of a patient completed at `now`.
/// Returns how many rows changed.
pub fn complete_pending_follow_ups(
    conn: &Connection,
    patient_id: &Uuid,
    now: &NaiveDateTime,
) -> Result<usize, DatabaseError> {
    let affected = conn.execute(
        "UPDATE follow_ups SET status = ?2, completed_at = ?3
         WHERE patient_id = ?1 AND status = ?4",
        params![
            patient_id.to_string(),
            FollowUpStatus::Completed.as_str(),
            fmt_datetime(now),
            FollowUpStatus::Pending.as_str(),
        ],
    )?;
    Ok(affected)
}

/// Overwrite the mutable columns of an existing follow-up.
pub fn update_follow_up(conn: &Connection, f: &FollowUp) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE follow_ups SET task_description = ?2, status = ?3, due_date = ?4, completed_at = ?5
         WHERE id = ?1",
        params![
            f.id.to_string(),
            f.task_description,
            f.status.as_str(),
            fmt_datetime(&f.due_date),
            f.completed_at.as_ref().map(fmt_datetime),
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "follow_up".into(),
            id: f.id.to_string(),
        });
    }
    Ok(())
}

/// Filtered, paginated listing ordered by due date (earliest first).
pub fn list_follow_ups(
    conn: &Connection,
    filter: &FollowUpFilter,
) -> Result<Vec<FollowUp>, DatabaseError> {
    let sql = format!(
        "SELECT {FOLLOW_UP_COLUMNS} FROM follow_ups
         WHERE (?1 IS NULL OR status = ?1)
           AND (?2 IS NULL OR patient_id = ?2)
         ORDER BY due_date ASC, rowid ASC
         LIMIT ?3 OFFSET ?4"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            filter.status.map(|s| s.as_str()),
            filter.patient_id.map(|id| id.to_string()),
            filter.page.effective_limit(),
            filter.page.skip,
        ],
        row_to_follow_up,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// (pending, overdue) counts across all patients.
pub fn count_open_follow_ups(
    conn: &Connection,
    now: &NaiveDateTime,
) -> Result<(u32, u32), DatabaseError> {
    let counts = conn.query_row(
        "SELECT
             COUNT(*),
             COALESCE(SUM(CASE WHEN due_date < ?2 THEN 1 ELSE 0 END), 0)
         FROM follow_ups WHERE status = ?1",
        params![FollowUpStatus::Pending.as_str(), fmt_datetime(now)],
        |row| Ok((row.get::<_, u32>(0)?, row.get::<_, u32>(1)?)),
    )?;
    Ok(counts)
}

fn row_to_follow_up(row: &rusqlite::Row) -> Result<FollowUp, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let patient_str: String = row.get(1)?;
    let status_str: String = row.get(3)?;
    let due_str: String = row.get(4)?;
    let completed_str: Option<String> = row.get(5)?;
    let created_str: String = row.get(6)?;

    Ok(FollowUp {
        id: parse_uuid(0, &id_str)?,
        patient_id: parse_uuid(1, &patient_str)?,
        task_description: row.get(2)?,
        status: parse_enum(3, &status_str)?,
        due_date: parse_datetime(4, &due_str)?,
        completed_at: completed_str
            .as_deref()
            .map(|s| parse_datetime(5, s))
            .transpose()?,
        created_at: parse_datetime(6, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{at, seed_patient, test_db};
    use crate::models::Page;

    fn make_follow_up(patient_id: Uuid, due: NaiveDateTime, created: NaiveDateTime) -> FollowUp {
        FollowUp {
            id: Uuid::new_v4(),
            patient_id,
            task_description: "Standard monthly health check.".into(),
            status: FollowUpStatus::Pending,
            due_date: due,
            completed_at: None,
            created_at: created,
        }
    }

    #[test]
    fn insert_and_get() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        let f = make_follow_up(p.id, at(2026, 4, 1, 8), at(2026, 3, 1, 8));
        insert_follow_up(&conn, &f).unwrap();

        let loaded = get_follow_up(&conn, &f.id).unwrap().unwrap();
        assert_eq!(loaded.status, FollowUpStatus::Pending);
        assert!(loaded.completed_at.is_none());
        assert_eq!(loaded.due_date, at(2026, 4, 1, 8));
    }

    #[test]
    fn complete_pending_only_touches_that_patient() {
        let conn = test_db();
        let a = seed_patient(&conn, "A");
        let b = seed_patient(&conn, "B");
        insert_follow_up(&conn, &make_follow_up(a.id, at(2026, 4, 1, 8), at(2026, 3, 1, 8)))
            .unwrap();
        insert_follow_up(&conn, &make_follow_up(a.id, at(2026, 4, 2, 8), at(2026, 3, 2, 8)))
            .unwrap();
        insert_follow_up(&conn, &make_follow_up(b.id, at(2026, 4, 3, 8), at(2026, 3, 3, 8)))
            .unwrap();

        let closed = complete_pending_follow_ups(&conn, &a.id, &at(2026, 3, 10, 12)).unwrap();
        assert_eq!(closed, 2);

        for f in get_follow_ups_for_patient(&conn, &a.id).unwrap() {
            assert_eq!(f.status, FollowUpStatus::Completed);
            assert_eq!(f.completed_at, Some(at(2026, 3, 10, 12)));
        }
        let b_rows = get_follow_ups_for_patient(&conn, &b.id).unwrap();
        assert!(b_rows[0].is_pending());
    }

    #[test]
    fn list_filters_by_status_and_patient() {
        let conn = test_db();
        let a = seed_patient(&conn, "A");
        let b = seed_patient(&conn, "B");
        insert_follow_up(&conn, &make_follow_up(a.id, at(2026, 4, 5, 8), at(2026, 3, 1, 8)))
            .unwrap();
        insert_follow_up(&conn, &make_follow_up(b.id, at(2026, 4, 1, 8), at(2026, 3, 1, 8)))
            .unwrap();
        complete_pending_follow_ups(&conn, &a.id, &at(2026, 3, 2, 8)).unwrap();

        let pending = list_follow_ups(
            &conn,
            &FollowUpFilter {
                status: Some(FollowUpStatus::Pending),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].patient_id, b.id);

        let for_a = list_follow_ups(
            &conn,
            &FollowUpFilter {
                patient_id: Some(a.id),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].status, FollowUpStatus::Completed);
    }

    #[test]
    fn list_orders_by_due_date_and_paginates() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        for day in [20, 5, 12] {
            insert_follow_up(&conn, &make_follow_up(p.id, at(2026, 4, day, 8), at(2026, 3, 1, 8)))
                .unwrap();
        }

        let all = list_follow_ups(&conn, &FollowUpFilter::default()).unwrap();
        let days: Vec<_> = all.iter().map(|f| f.due_date).collect();
        assert_eq!(days, vec![at(2026, 4, 5, 8), at(2026, 4, 12, 8), at(2026, 4, 20, 8)]);

        let second = list_follow_ups(
            &conn,
            &FollowUpFilter {
                page: Page { skip: 1, limit: 1 },
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].due_date, at(2026, 4, 12, 8));
    }

    #[test]
    fn update_missing_fails() {
        let conn = test_db();
        let ghost = make_follow_up(Uuid::new_v4(), at(2026, 4, 1, 8), at(2026, 3, 1, 8));
        assert!(matches!(
            update_follow_up(&conn, &ghost),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn open_counts_include_overdue() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        insert_follow_up(&conn, &make_follow_up(p.id, at(2026, 3, 1, 8), at(2026, 2, 1, 8)))
            .unwrap();
        insert_follow_up(&conn, &make_follow_up(p.id, at(2026, 5, 1, 8), at(2026, 2, 1, 8)))
            .unwrap();

        let (pending, overdue) = count_open_follow_ups(&conn, &at(2026, 4, 1, 8)).unwrap();
        assert_eq!(pending, 2);
        assert_eq!(overdue, 1);
    }
}
