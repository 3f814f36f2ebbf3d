use rusqlite::{Connection, OptionalExtension, params};

use rolo_types::api::{NewReferral, ReferralUpdate};

use super::{push_set, user_exists};
use crate::models::ReferralRow;
use crate::{Database, Result, StoreError};

const REFERRAL_COLS: &str = "id, referrer_id, company, position, application_date, \
     interview_date, status, notes, created_at, updated_at";

impl Database {
    pub fn create_referral(&self, new: &NewReferral) -> Result<ReferralRow> {
        self.with_conn(|conn| {
            if !user_exists(conn, new.referrer_id)? {
                return Err(StoreError::ForeignKeyViolation("user"));
            }

            conn.execute(
                "INSERT INTO referrals (referrer_id, company, position, application_date, \
                 interview_date, status, notes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.referrer_id,
                    new.company,
                    new.position,
                    new.application_date,
                    new.interview_date,
                    new.status.as_str(),
                    new.notes,
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_referral_by_id(conn, id)?.ok_or(StoreError::NotFound("referral"))
        })
    }

    pub fn get_referral(&self, id: i64) -> Result<ReferralRow> {
        self.with_conn(|conn| {
            query_referral_by_id(conn, id)?.ok_or(StoreError::NotFound("referral"))
        })
    }

    pub fn list_referrals(&self, limit: u32, offset: u32) -> Result<Vec<ReferralRow>> {
        self.with_conn(|conn| {
            let sql =
                format!("SELECT {REFERRAL_COLS} FROM referrals ORDER BY id LIMIT ?1 OFFSET ?2");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![limit, offset], map_referral)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn referrals_for_user(&self, referrer_id: i64) -> Result<Vec<ReferralRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {REFERRAL_COLS} FROM referrals WHERE referrer_id = ?1 ORDER BY id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([referrer_id], map_referral)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Status writes are unconstrained: any status may replace any other.
    pub fn update_referral(&self, id: i64, patch: &ReferralUpdate) -> Result<ReferralRow> {
        self.with_conn(|conn| {
            let mut sets: Vec<String> = Vec::new();
            let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();

            push_set(&mut sets, &mut values, "company", &patch.company);
            push_set(&mut sets, &mut values, "position", &patch.position);
            push_set(&mut sets, &mut values, "application_date", &patch.application_date);
            push_set(&mut sets, &mut values, "interview_date", &patch.interview_date);
            let status = patch.status.map(|s| s.as_str());
            if let Some(s) = &status {
                sets.push("status = ?".to_string());
                values.push(s);
            }
            push_set(&mut sets, &mut values, "notes", &patch.notes);

            sets.push("updated_at = datetime('now')".to_string());
            values.push(&id);

            let sql = format!("UPDATE referrals SET {} WHERE id = ?", sets.join(", "));
            let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
            if affected == 0 {
                return Err(StoreError::NotFound("referral"));
            }
            query_referral_by_id(conn, id)?.ok_or(StoreError::NotFound("referral"))
        })
    }

    pub fn delete_referral(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM referrals WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(StoreError::NotFound("referral"));
            }
            Ok(())
        })
    }
}

fn query_referral_by_id(conn: &Connection, id: i64) -> Result<Option<ReferralRow>> {
    let sql = format!("SELECT {REFERRAL_COLS} FROM referrals WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    Ok(stmt.query_row([id], map_referral).optional()?)
}

fn map_referral(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferralRow> {
    Ok(ReferralRow {
        id: row.get(0)?,
        referrer_id: row.get(1)?,
        company: row.get(2)?,
        position: row.get(3)?,
        application_date: row.get(4)?,
        interview_date: row.get(5)?,
        status: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{add_contact, test_db};
    use crate::StoreError;
    use rolo_types::api::{NewReferral, ReferralUpdate};
    use rolo_types::models::ReferralStatus;

    fn referral(referrer_id: i64) -> NewReferral {
        NewReferral {
            referrer_id,
            company: Some("Acme".to_string()),
            position: Some("Engineer".to_string()),
            application_date: None,
            interview_date: None,
            status: ReferralStatus::Pending,
            notes: None,
        }
    }

    #[test]
    fn dangling_referrer_is_foreign_key_violation() {
        let db = test_db();
        let err = db.create_referral(&referral(42)).unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation("user")), "got {err:?}");
    }

    #[test]
    fn defaults_to_pending_status() {
        let db = test_db();
        let a = add_contact(&db, "Ana", "Silva");
        let r = db.create_referral(&referral(a)).unwrap();
        assert_eq!(r.status, "pending");
    }

    #[test]
    fn any_status_is_writable_at_any_time() {
        // No transition rules: accepted can go straight back to pending.
        let db = test_db();
        let a = add_contact(&db, "Ana", "Silva");
        let r = db.create_referral(&referral(a)).unwrap();

        for status in [
            ReferralStatus::Accepted,
            ReferralStatus::Rejected,
            ReferralStatus::Offered,
            ReferralStatus::Pending,
        ] {
            let updated = db
                .update_referral(
                    r.id,
                    &ReferralUpdate { status: Some(status), ..Default::default() },
                )
                .unwrap();
            assert_eq!(updated.status, status.as_str());
        }
    }

    #[test]
    fn deleting_referrer_cascades() {
        let db = test_db();
        let a = add_contact(&db, "Ana", "Silva");
        let r = db.create_referral(&referral(a)).unwrap();
        db.delete_user(a).unwrap();
        assert!(matches!(
            db.get_referral(r.id).unwrap_err(),
            StoreError::NotFound("referral")
        ));
    }

    #[test]
    fn lists_by_referrer() {
        let db = test_db();
        let a = add_contact(&db, "Ana", "Silva");
        let b = add_contact(&db, "Bea", "Souza");
        db.create_referral(&referral(a)).unwrap();
        db.create_referral(&referral(a)).unwrap();
        db.create_referral(&referral(b)).unwrap();

        assert_eq!(db.referrals_for_user(a).unwrap().len(), 2);
        assert_eq!(db.list_referrals(10, 0).unwrap().len(), 3);
        assert_eq!(db.list_referrals(2, 2).unwrap().len(), 1);
    }

    #[test]
    fn update_missing_referral_is_not_found() {
        let db = test_db();
        assert!(matches!(
            db.update_referral(7, &ReferralUpdate::default()).unwrap_err(),
            StoreError::NotFound("referral")
        ));
        assert!(matches!(db.delete_referral(7).unwrap_err(), StoreError::NotFound("referral")));
    }
}
