use rusqlite::{Connection, OptionalExtension, params};

use rolo_types::api::{NewUser, RegisterRequest, UserUpdate};

use super::push_set;
use crate::models::UserRow;
use crate::{Database, Result, StoreError};

const USER_COLS: &str = "id, first_name, last_name, company, sector, is_me, email, phone, \
     linkedin_url, how_i_know_them, when_i_met_them, notes, username, password, \
     created_at, updated_at";

impl Database {
    /// Insert a contact row. Contacts carry no credentials.
    pub fn create_contact(&self, new: &NewUser) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (first_name, last_name, company, sector, is_me, email, phone, \
                 linkedin_url, how_i_know_them, when_i_met_them, notes) \
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    new.first_name,
                    new.last_name,
                    new.company,
                    new.sector,
                    new.email,
                    new.phone,
                    new.linkedin_url,
                    new.how_i_know_them,
                    new.when_i_met_them,
                    new.notes,
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?.ok_or(StoreError::NotFound("user"))
        })
    }

    /// Insert the owner account (`is_me = 1`). Single-operator system: the
    /// owner gate lives inside the same connection lock as the insert, so
    /// two racing registrations cannot both pass it. Username and email
    /// must be unique; the explicit probes give a typed answer and the
    /// UNIQUE indexes remain the backstop against racing writers.
    pub fn create_owner(&self, reg: &RegisterRequest, password_hash: &str) -> Result<UserRow> {
        self.with_conn(|conn| {
            let owners: i64 =
                conn.query_row("SELECT COUNT(*) FROM users WHERE is_me = 1", [], |row| {
                    row.get(0)
                })?;
            if owners > 0 {
                return Err(StoreError::ConstraintViolation(
                    "owner account already exists".to_string(),
                ));
            }

            // Contacts can hold emails too, so the owner's email can still
            // collide; username cannot, since only the owner has one.
            let taken: Option<i64> = conn
                .query_row("SELECT id FROM users WHERE email = ?1", [&reg.email], |row| {
                    row.get(0)
                })
                .optional()?;
            if taken.is_some() {
                return Err(StoreError::ConstraintViolation(format!(
                    "email '{}' already registered",
                    reg.email
                )));
            }

            conn.execute(
                "INSERT INTO users (first_name, last_name, is_me, email, username, password) \
                 VALUES (?1, ?2, 1, ?3, ?4, ?5)",
                params![reg.first_name, reg.last_name, reg.email, reg.username, password_hash],
            )?;
            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?.ok_or(StoreError::NotFound("user"))
        })
    }

    pub fn get_user(&self, id: i64) -> Result<UserRow> {
        self.with_conn(|conn| query_user_by_id(conn, id)?.ok_or(StoreError::NotFound("user")))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLS} FROM users WHERE username = ?1");
            let mut stmt = conn.prepare(&sql)?;
            Ok(stmt.query_row([username], map_user).optional()?)
        })
    }

    pub fn list_users(&self, limit: u32, offset: u32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLS} FROM users ORDER BY id LIMIT ?1 OFFSET ?2");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![limit, offset], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Partial update: only supplied fields are written, `updated_at` is
    /// always touched.
    pub fn update_user(&self, id: i64, patch: &UserUpdate) -> Result<UserRow> {
        self.with_conn(|conn| {
            let mut sets: Vec<String> = Vec::new();
            let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();

            push_set(&mut sets, &mut values, "first_name", &patch.first_name);
            push_set(&mut sets, &mut values, "last_name", &patch.last_name);
            push_set(&mut sets, &mut values, "company", &patch.company);
            push_set(&mut sets, &mut values, "sector", &patch.sector);
            push_set(&mut sets, &mut values, "email", &patch.email);
            push_set(&mut sets, &mut values, "phone", &patch.phone);
            push_set(&mut sets, &mut values, "linkedin_url", &patch.linkedin_url);
            push_set(&mut sets, &mut values, "how_i_know_them", &patch.how_i_know_them);
            push_set(&mut sets, &mut values, "when_i_met_them", &patch.when_i_met_them);
            push_set(&mut sets, &mut values, "notes", &patch.notes);

            sets.push("updated_at = datetime('now')".to_string());
            values.push(&id);

            let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
            let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
            if affected == 0 {
                return Err(StoreError::NotFound("user"));
            }
            query_user_by_id(conn, id)?.ok_or(StoreError::NotFound("user"))
        })
    }

    /// Cascades: every connection, referral, and follow-up referencing the
    /// user goes with it.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(StoreError::NotFound("user"));
            }
            Ok(())
        })
    }

    pub fn owner_exists(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM users WHERE is_me = 1", [], |row| {
                    row.get(0)
                })?;
            Ok(n > 0)
        })
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        })
    }

    /// Distinct companies and sectors, for filter dropdowns.
    pub fn filter_options(&self) -> Result<(Vec<String>, Vec<String>)> {
        self.with_conn(|conn| {
            let companies = query_distinct(conn, "company")?;
            let sectors = query_distinct(conn, "sector")?;
            Ok((companies, sectors))
        })
    }
}

fn query_distinct(conn: &Connection, col: &str) -> Result<Vec<String>> {
    let sql = format!("SELECT DISTINCT {col} FROM users WHERE {col} IS NOT NULL ORDER BY {col}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLS} FROM users WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    Ok(stmt.query_row([id], map_user).optional()?)
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        company: row.get(3)?,
        sector: row.get(4)?,
        is_me: row.get(5)?,
        email: row.get(6)?,
        phone: row.get(7)?,
        linkedin_url: row.get(8)?,
        how_i_know_them: row.get(9)?,
        when_i_met_them: row.get(10)?,
        notes: row.get(11)?,
        username: row.get(12)?,
        password: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{add_contact, test_db};
    use crate::StoreError;
    use rolo_types::api::{NewUser, RegisterRequest, UserUpdate};

    fn register_req(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Demo".to_string(),
            last_name: "Owner".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: "ignored-at-this-layer".to_string(),
        }
    }

    #[test]
    fn owner_gets_credentials_and_is_me() {
        let db = test_db();
        let owner = db.create_owner(&register_req("demo", "demo@example.com"), "hash").unwrap();
        assert!(owner.is_me);
        assert_eq!(owner.username.as_deref(), Some("demo"));
        assert!(db.owner_exists().unwrap());
    }

    #[test]
    fn second_owner_is_rejected_even_with_distinct_credentials() {
        let db = test_db();
        db.create_owner(&register_req("demo", "a@example.com"), "hash").unwrap();
        let err = db
            .create_owner(&register_req("other", "b@example.com"), "hash")
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)), "got {err:?}");
        assert!(db.get_user_by_username("other").unwrap().is_none());
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn owner_email_colliding_with_contact_is_constraint_violation() {
        let db = test_db();
        db.create_contact(&NewUser {
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            company: None,
            sector: None,
            email: Some("a@example.com".to_string()),
            phone: None,
            linkedin_url: None,
            how_i_know_them: None,
            when_i_met_them: None,
            notes: None,
        })
        .unwrap();
        let err = db
            .create_owner(&register_req("demo", "a@example.com"), "hash")
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)), "got {err:?}");
    }

    #[test]
    fn contact_email_collides_with_owner_email() {
        let db = test_db();
        db.create_owner(&register_req("demo", "a@example.com"), "hash").unwrap();
        let err = db
            .create_contact(&NewUser {
                first_name: "Ana".to_string(),
                last_name: "Silva".to_string(),
                company: None,
                sector: None,
                email: Some("a@example.com".to_string()),
                phone: None,
                linkedin_url: None,
                how_i_know_them: None,
                when_i_met_them: None,
                notes: None,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)), "got {err:?}");
    }

    #[test]
    fn contacts_without_email_do_not_collide() {
        let db = test_db();
        let a = add_contact(&db, "Ana", "Silva");
        let b = add_contact(&db, "Bea", "Souza");
        assert_ne!(a, b);
        assert_eq!(db.count_users().unwrap(), 2);
    }

    #[test]
    fn update_touches_updated_at_and_only_supplied_fields() {
        let db = test_db();
        let id = add_contact(&db, "Ana", "Silva");
        let before = db.get_user(id).unwrap();
        assert!(before.updated_at.is_none());

        let updated = db
            .update_user(
                id,
                &UserUpdate {
                    company: Some("Acme".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.company.as_deref(), Some("Acme"));
        assert_eq!(updated.first_name, "Ana");
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn update_and_delete_missing_user_is_not_found() {
        let db = test_db();
        assert!(matches!(
            db.update_user(99, &UserUpdate::default()).unwrap_err(),
            StoreError::NotFound("user")
        ));
        assert!(matches!(db.delete_user(99).unwrap_err(), StoreError::NotFound("user")));
        assert!(matches!(db.get_user(99).unwrap_err(), StoreError::NotFound("user")));
    }

    #[test]
    fn list_respects_limit_and_offset() {
        let db = test_db();
        for i in 0..5 {
            add_contact(&db, &format!("C{i}"), "Contact");
        }
        let page = db.list_users(2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].first_name, "C2");
    }

    #[test]
    fn filter_options_are_distinct_and_sorted() {
        let db = test_db();
        for (company, sector) in [("Acme", "tech"), ("Acme", "finance"), ("Beta", "tech")] {
            db.create_contact(&NewUser {
                first_name: "X".to_string(),
                last_name: "Y".to_string(),
                company: Some(company.to_string()),
                sector: Some(sector.to_string()),
                email: None,
                phone: None,
                linkedin_url: None,
                how_i_know_them: None,
                when_i_met_them: None,
                notes: None,
            })
            .unwrap();
        }
        let (companies, sectors) = db.filter_options().unwrap();
        assert_eq!(companies, vec!["Acme", "Beta"]);
        assert_eq!(sectors, vec!["finance", "tech"]);
    }
}
