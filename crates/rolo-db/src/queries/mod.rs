pub mod connections;
pub mod follow_ups;
pub mod referrals;
pub mod users;

use rusqlite::Connection;

use crate::Result;

/// Append `col = ?` to a dynamic SET list when the field was supplied.
/// Placeholders are auto-numbered, so params must be pushed in SET order.
fn push_set<'a>(
    sets: &mut Vec<String>,
    params: &mut Vec<&'a dyn rusqlite::ToSql>,
    col: &str,
    val: &'a Option<String>,
) {
    if let Some(v) = val {
        sets.push(format!("{col} = ?"));
        params.push(v);
    }
}

fn user_exists(conn: &Connection, id: i64) -> Result<bool> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM users WHERE id = ?1", [id], |row| {
        row.get(0)
    })?;
    Ok(n > 0)
}
