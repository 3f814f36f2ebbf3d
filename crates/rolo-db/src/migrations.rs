use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name      TEXT NOT NULL,
            last_name       TEXT NOT NULL,
            company         TEXT,
            sector          TEXT,
            is_me           INTEGER NOT NULL DEFAULT 0,
            email           TEXT,
            phone           TEXT,
            linkedin_url    TEXT,
            how_i_know_them TEXT,
            when_i_met_them TEXT,
            notes           TEXT,
            username        TEXT,
            password        TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT
        );

        -- Unique when present; contacts without credentials keep NULLs
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username
            ON users(username) WHERE username IS NOT NULL;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email
            ON users(email) WHERE email IS NOT NULL;

        -- Edges are stored canonically: person1_id < person2_id. The CHECK
        -- makes the sorted pair the only representable form, so the UNIQUE
        -- constraint covers both orientations without a second lookup.
        CREATE TABLE IF NOT EXISTS connections (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            person1_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            person2_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            relationship     TEXT,
            strength         INTEGER CHECK (strength BETWEEN 1 AND 5),
            context          TEXT,
            last_interaction TEXT,
            notes            TEXT,
            created_at       TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at       TEXT,
            UNIQUE (person1_id, person2_id),
            CHECK (person1_id < person2_id)
        );

        CREATE INDEX IF NOT EXISTS idx_connections_person2
            ON connections(person2_id);

        CREATE TABLE IF NOT EXISTS referrals (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            referrer_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            company          TEXT,
            position         TEXT,
            application_date TEXT,
            interview_date   TEXT,
            status           TEXT NOT NULL DEFAULT 'pending',
            notes            TEXT,
            created_at       TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at       TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_referrals_referrer
            ON referrals(referrer_id);

        CREATE TABLE IF NOT EXISTS follow_ups (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            contact_user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            connection_id   INTEGER NOT NULL REFERENCES connections(id) ON DELETE CASCADE,
            status          TEXT NOT NULL DEFAULT 'pending',
            due_date        TEXT,
            notes           TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_follow_ups_user
            ON follow_ups(user_id, status);
        CREATE INDEX IF NOT EXISTS idx_follow_ups_connection
            ON follow_ups(connection_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
