use rusqlite::{Connection, OptionalExtension, params};

use rolo_types::api::{FollowUpUpdate, NewFollowUp};
use rolo_types::models::FollowUpStatus;

use super::{push_set, user_exists};
use crate::models::FollowUpRow;
use crate::{Database, Result, StoreError};

const FOLLOW_UP_COLS: &str = "id, user_id, contact_user_id, connection_id, status, due_date, \
     notes, created_at, updated_at";

impl Database {
    pub fn create_follow_up(&self, new: &NewFollowUp) -> Result<FollowUpRow> {
        self.with_conn(|conn| {
            if !user_exists(conn, new.user_id)? || !user_exists(conn, new.contact_user_id)? {
                return Err(StoreError::ForeignKeyViolation("user"));
            }
            let connection: Option<i64> = conn
                .query_row(
                    "SELECT id FROM connections WHERE id = ?1",
                    [new.connection_id],
                    |row| row.get(0),
                )
                .optional()?;
            if connection.is_none() {
                return Err(StoreError::ForeignKeyViolation("connection"));
            }

            conn.execute(
                "INSERT INTO follow_ups (user_id, contact_user_id, connection_id, status, \
                 due_date, notes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new.user_id,
                    new.contact_user_id,
                    new.connection_id,
                    new.status.as_str(),
                    new.due_date,
                    new.notes,
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_follow_up_by_id(conn, id)?.ok_or(StoreError::NotFound("follow-up"))
        })
    }

    pub fn get_follow_up(&self, id: i64) -> Result<FollowUpRow> {
        self.with_conn(|conn| {
            query_follow_up_by_id(conn, id)?.ok_or(StoreError::NotFound("follow-up"))
        })
    }

    /// Follow-ups owned by a user, optionally narrowed to one status.
    pub fn follow_ups_for_user(
        &self,
        user_id: i64,
        status: Option<FollowUpStatus>,
    ) -> Result<Vec<FollowUpRow>> {
        self.with_conn(|conn| {
            let rows = match status {
                Some(status) => {
                    let sql = format!(
                        "SELECT {FOLLOW_UP_COLS} FROM follow_ups \
                         WHERE user_id = ?1 AND status = ?2 ORDER BY id"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map(params![user_id, status.as_str()], map_follow_up)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let sql = format!(
                        "SELECT {FOLLOW_UP_COLS} FROM follow_ups WHERE user_id = ?1 ORDER BY id"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map([user_id], map_follow_up)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    pub fn follow_ups_for_connection(&self, connection_id: i64) -> Result<Vec<FollowUpRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {FOLLOW_UP_COLS} FROM follow_ups WHERE connection_id = ?1 ORDER BY id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([connection_id], map_follow_up)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_follow_up(&self, id: i64, patch: &FollowUpUpdate) -> Result<FollowUpRow> {
        self.with_conn(|conn| {
            let mut sets: Vec<String> = Vec::new();
            let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();

            let status = patch.status.map(|s| s.as_str());
            if let Some(s) = &status {
                sets.push("status = ?".to_string());
                values.push(s);
            }
            push_set(&mut sets, &mut values, "due_date", &patch.due_date);
            push_set(&mut sets, &mut values, "notes", &patch.notes);

            sets.push("updated_at = datetime('now')".to_string());
            values.push(&id);

            let sql = format!("UPDATE follow_ups SET {} WHERE id = ?", sets.join(", "));
            let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
            if affected == 0 {
                return Err(StoreError::NotFound("follow-up"));
            }
            query_follow_up_by_id(conn, id)?.ok_or(StoreError::NotFound("follow-up"))
        })
    }

    pub fn delete_follow_up(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM follow_ups WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(StoreError::NotFound("follow-up"));
            }
            Ok(())
        })
    }
}

fn query_follow_up_by_id(conn: &Connection, id: i64) -> Result<Option<FollowUpRow>> {
    let sql = format!("SELECT {FOLLOW_UP_COLS} FROM follow_ups WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    Ok(stmt.query_row([id], map_follow_up).optional()?)
}

fn map_follow_up(row: &rusqlite::Row<'_>) -> rusqlite::Result<FollowUpRow> {
    Ok(FollowUpRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        contact_user_id: row.get(2)?,
        connection_id: row.get(3)?,
        status: row.get(4)?,
        due_date: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{add_contact, test_db};
    use crate::{Database, StoreError};
    use rolo_types::api::{FollowUpUpdate, NewConnection, NewFollowUp};
    use rolo_types::models::FollowUpStatus;

    struct Fixture {
        user: i64,
        contact: i64,
        connection: i64,
    }

    fn fixture(db: &Database) -> Fixture {
        let user = add_contact(db, "Ana", "Silva");
        let contact = add_contact(db, "Bea", "Souza");
        let connection = db
            .create_connection(&NewConnection {
                person1_id: user,
                person2_id: contact,
                relationship: Some("mentor".to_string()),
                strength: Some(4),
                context: None,
                last_interaction: None,
                notes: None,
            })
            .unwrap()
            .id;
        Fixture { user, contact, connection }
    }

    fn follow_up(f: &Fixture) -> NewFollowUp {
        NewFollowUp {
            user_id: f.user,
            contact_user_id: f.contact,
            connection_id: f.connection,
            status: FollowUpStatus::Pending,
            due_date: Some("2025-07-01".to_string()),
            notes: None,
        }
    }

    #[test]
    fn dangling_references_are_foreign_key_violations() {
        let db = test_db();
        let f = fixture(&db);

        let err = db
            .create_follow_up(&NewFollowUp { user_id: 999, ..follow_up(&f) })
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation("user")), "got {err:?}");

        let err = db
            .create_follow_up(&NewFollowUp { connection_id: 999, ..follow_up(&f) })
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation("connection")), "got {err:?}");
    }

    #[test]
    fn deleting_connection_cascades_to_follow_ups() {
        let db = test_db();
        let f = fixture(&db);
        let fu = db.create_follow_up(&follow_up(&f)).unwrap();

        db.delete_connection(f.connection).unwrap();
        assert!(matches!(
            db.get_follow_up(fu.id).unwrap_err(),
            StoreError::NotFound("follow-up")
        ));
    }

    #[test]
    fn deleting_any_referenced_user_cascades() {
        let db = test_db();
        let f = fixture(&db);
        let fu = db.create_follow_up(&follow_up(&f)).unwrap();

        // Deleting the contact removes the connection (cascade) and with it
        // the follow-up, whichever FK fires first.
        db.delete_user(f.contact).unwrap();
        assert!(matches!(
            db.get_follow_up(fu.id).unwrap_err(),
            StoreError::NotFound("follow-up")
        ));
        assert!(db.follow_ups_for_user(f.user, None).unwrap().is_empty());
    }

    #[test]
    fn status_filter_narrows_listing() {
        let db = test_db();
        let f = fixture(&db);
        let a = db.create_follow_up(&follow_up(&f)).unwrap();
        db.create_follow_up(&follow_up(&f)).unwrap();

        db.update_follow_up(
            a.id,
            &FollowUpUpdate { status: Some(FollowUpStatus::Completed), ..Default::default() },
        )
        .unwrap();

        let pending = db.follow_ups_for_user(f.user, Some(FollowUpStatus::Pending)).unwrap();
        assert_eq!(pending.len(), 1);
        let all = db.follow_ups_for_user(f.user, None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn any_status_is_writable_at_any_time() {
        let db = test_db();
        let f = fixture(&db);
        let fu = db.create_follow_up(&follow_up(&f)).unwrap();

        for status in [FollowUpStatus::Skipped, FollowUpStatus::Completed, FollowUpStatus::Pending]
        {
            let updated = db
                .update_follow_up(
                    fu.id,
                    &FollowUpUpdate { status: Some(status), ..Default::default() },
                )
                .unwrap();
            assert_eq!(updated.status, status.as_str());
        }
    }

    #[test]
    fn no_orphans_after_user_deletion() {
        // Full cascade sweep: user deletion leaves no connection, referral,
        // or follow-up behind.
        let db = test_db();
        let f = fixture(&db);
        db.create_follow_up(&follow_up(&f)).unwrap();
        db.create_referral(&rolo_types::api::NewReferral {
            referrer_id: f.user,
            company: None,
            position: None,
            application_date: None,
            interview_date: None,
            status: Default::default(),
            notes: None,
        })
        .unwrap();

        db.delete_user(f.user).unwrap();

        assert!(db.connections_for_user(f.contact).unwrap().is_empty());
        assert!(db.referrals_for_user(f.user).unwrap().is_empty());
        assert!(db.follow_ups_for_user(f.user, None).unwrap().is_empty());
        assert!(db.follow_ups_for_connection(f.connection).unwrap().is_empty());
    }
}
