use rusqlite::{Connection, OptionalExtension, params};

use rolo_types::api::{ConnectionUpdate, NewConnection};

use super::{push_set, user_exists};
use crate::models::ConnectionRow;
use crate::{Database, Result, StoreError};

const CONNECTION_COLS: &str = "id, person1_id, person2_id, relationship, strength, context, \
     last_interaction, notes, created_at, updated_at";

fn check_strength(strength: Option<i64>) -> Result<()> {
    if let Some(s) = strength {
        if !(1..=5).contains(&s) {
            return Err(StoreError::InvalidRange(format!(
                "strength must be between 1 and 5, got {s}"
            )));
        }
    }
    Ok(())
}

impl Database {
    /// Insert an undirected edge. Endpoints are sorted before the write so
    /// the canonical (min, max) pair is the only stored form; the duplicate
    /// probe then covers both orientations in one lookup.
    pub fn create_connection(&self, new: &NewConnection) -> Result<ConnectionRow> {
        if new.person1_id == new.person2_id {
            return Err(StoreError::InvalidRange(
                "connection endpoints must be two distinct users".to_string(),
            ));
        }
        check_strength(new.strength)?;

        let lo = new.person1_id.min(new.person2_id);
        let hi = new.person1_id.max(new.person2_id);

        self.with_conn(|conn| {
            if !user_exists(conn, lo)? || !user_exists(conn, hi)? {
                return Err(StoreError::ForeignKeyViolation("user"));
            }

            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM connections WHERE person1_id = ?1 AND person2_id = ?2",
                    [lo, hi],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(StoreError::DuplicateEdge(lo, hi));
            }

            conn.execute(
                "INSERT INTO connections (person1_id, person2_id, relationship, strength, \
                 context, last_interaction, notes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    lo,
                    hi,
                    new.relationship,
                    new.strength,
                    new.context,
                    new.last_interaction,
                    new.notes,
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_connection_by_id(conn, id)?.ok_or(StoreError::NotFound("connection"))
        })
    }

    pub fn get_connection(&self, id: i64) -> Result<ConnectionRow> {
        self.with_conn(|conn| {
            query_connection_by_id(conn, id)?.ok_or(StoreError::NotFound("connection"))
        })
    }

    pub fn list_connections(&self, limit: u32, offset: u32) -> Result<Vec<ConnectionRow>> {
        self.with_conn(|conn| {
            let sql =
                format!("SELECT {CONNECTION_COLS} FROM connections ORDER BY id LIMIT ?1 OFFSET ?2");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![limit, offset], map_connection)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Edges touching the user on either endpoint.
    pub fn connections_for_user(&self, user_id: i64) -> Result<Vec<ConnectionRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CONNECTION_COLS} FROM connections \
                 WHERE person1_id = ?1 OR person2_id = ?1 ORDER BY id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_connection)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_connection(&self, id: i64, patch: &ConnectionUpdate) -> Result<ConnectionRow> {
        check_strength(patch.strength)?;

        self.with_conn(|conn| {
            let mut sets: Vec<String> = Vec::new();
            let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();

            push_set(&mut sets, &mut values, "relationship", &patch.relationship);
            if let Some(s) = &patch.strength {
                sets.push("strength = ?".to_string());
                values.push(s);
            }
            push_set(&mut sets, &mut values, "context", &patch.context);
            push_set(&mut sets, &mut values, "last_interaction", &patch.last_interaction);
            push_set(&mut sets, &mut values, "notes", &patch.notes);

            sets.push("updated_at = datetime('now')".to_string());
            values.push(&id);

            let sql = format!("UPDATE connections SET {} WHERE id = ?", sets.join(", "));
            let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
            if affected == 0 {
                return Err(StoreError::NotFound("connection"));
            }
            query_connection_by_id(conn, id)?.ok_or(StoreError::NotFound("connection"))
        })
    }

    /// Cascades: follow-ups on the edge go with it.
    pub fn delete_connection(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM connections WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(StoreError::NotFound("connection"));
            }
            Ok(())
        })
    }
}

fn query_connection_by_id(conn: &Connection, id: i64) -> Result<Option<ConnectionRow>> {
    let sql = format!("SELECT {CONNECTION_COLS} FROM connections WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    Ok(stmt.query_row([id], map_connection).optional()?)
}

fn map_connection(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConnectionRow> {
    Ok(ConnectionRow {
        id: row.get(0)?,
        person1_id: row.get(1)?,
        person2_id: row.get(2)?,
        relationship: row.get(3)?,
        strength: row.get(4)?,
        context: row.get(5)?,
        last_interaction: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{add_contact, test_db};
    use crate::{Database, StoreError};
    use rolo_types::api::{ConnectionUpdate, NewConnection};

    fn edge(p1: i64, p2: i64, strength: Option<i64>) -> NewConnection {
        NewConnection {
            person1_id: p1,
            person2_id: p2,
            relationship: Some("colleague".to_string()),
            strength,
            context: None,
            last_interaction: None,
            notes: None,
        }
    }

    fn two_contacts(db: &Database) -> (i64, i64) {
        (add_contact(db, "Ana", "Silva"), add_contact(db, "Bea", "Souza"))
    }

    #[test]
    fn stores_edge_in_canonical_order() {
        let db = test_db();
        let (a, b) = two_contacts(&db);
        let conn = db.create_connection(&edge(b, a, Some(3))).unwrap();
        assert_eq!(conn.person1_id, a.min(b));
        assert_eq!(conn.person2_id, a.max(b));
    }

    #[test]
    fn reversed_pair_is_duplicate_edge() {
        let db = test_db();
        let (a, b) = two_contacts(&db);
        db.create_connection(&edge(a, b, Some(3))).unwrap();
        let err = db.create_connection(&edge(b, a, Some(1))).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEdge(_, _)), "got {err:?}");
    }

    #[test]
    fn strength_bounds_are_inclusive() {
        let db = test_db();
        let (a, b) = two_contacts(&db);
        let c = add_contact(&db, "Cid", "Costa");
        db.create_connection(&edge(a, b, Some(1))).unwrap();
        db.create_connection(&edge(a, c, Some(5))).unwrap();
        db.create_connection(&edge(b, c, None)).unwrap();
    }

    #[test]
    fn strength_out_of_range_is_rejected() {
        let db = test_db();
        let (a, b) = two_contacts(&db);
        for s in [0, 6, -1] {
            let err = db.create_connection(&edge(a, b, Some(s))).unwrap_err();
            assert!(matches!(err, StoreError::InvalidRange(_)), "strength {s}: got {err:?}");
        }
    }

    #[test]
    fn self_loop_is_rejected() {
        let db = test_db();
        let a = add_contact(&db, "Ana", "Silva");
        let err = db.create_connection(&edge(a, a, Some(3))).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRange(_)), "got {err:?}");
    }

    #[test]
    fn dangling_endpoint_is_foreign_key_violation() {
        let db = test_db();
        let a = add_contact(&db, "Ana", "Silva");
        let err = db.create_connection(&edge(a, 999, Some(3))).unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation("user")), "got {err:?}");
    }

    #[test]
    fn deleting_endpoint_cascades_to_edge() {
        let db = test_db();
        let (a, b) = two_contacts(&db);
        let conn = db.create_connection(&edge(a, b, Some(3))).unwrap();
        db.delete_user(a).unwrap();
        assert!(matches!(
            db.get_connection(conn.id).unwrap_err(),
            StoreError::NotFound("connection")
        ));
    }

    #[test]
    fn lists_edges_for_either_endpoint() {
        let db = test_db();
        let (a, b) = two_contacts(&db);
        let c = add_contact(&db, "Cid", "Costa");
        db.create_connection(&edge(a, b, Some(2))).unwrap();
        db.create_connection(&edge(c, b, Some(4))).unwrap();

        assert_eq!(db.connections_for_user(b).unwrap().len(), 2);
        assert_eq!(db.connections_for_user(a).unwrap().len(), 1);
        assert!(db.connections_for_user(999).unwrap().is_empty());
    }

    #[test]
    fn update_validates_strength_and_touches_updated_at() {
        let db = test_db();
        let (a, b) = two_contacts(&db);
        let conn = db.create_connection(&edge(a, b, Some(2))).unwrap();

        let err = db
            .update_connection(conn.id, &ConnectionUpdate { strength: Some(9), ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRange(_)), "got {err:?}");

        let updated = db
            .update_connection(conn.id, &ConnectionUpdate { strength: Some(5), ..Default::default() })
            .unwrap();
        assert_eq!(updated.strength, Some(5));
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn demo_scenario_from_end_to_end() {
        // Owner "demo" + contact, edge (A,B,3); (B,A,1) must fail; deleting
        // A must delete the edge.
        let db = test_db();
        let owner = db
            .create_owner(
                &rolo_types::api::RegisterRequest {
                    first_name: "Demo".to_string(),
                    last_name: "Owner".to_string(),
                    username: "demo".to_string(),
                    email: "demo@example.com".to_string(),
                    password: "unused".to_string(),
                },
                "hash",
            )
            .unwrap();
        let contact = add_contact(&db, "Bea", "Souza");

        let conn = db.create_connection(&edge(owner.id, contact, Some(3))).unwrap();
        let err = db.create_connection(&edge(contact, owner.id, Some(1))).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEdge(_, _)), "got {err:?}");

        db.delete_user(owner.id).unwrap();
        assert!(db.connections_for_user(contact).unwrap().is_empty());
        assert!(matches!(
            db.get_connection(conn.id).unwrap_err(),
            StoreError::NotFound("connection")
        ));
    }
}
