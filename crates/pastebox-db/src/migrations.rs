use rusqlite::Connection;
use tracing::info;

use crate::StoreError;

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, pastes)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );

            -- Timestamps are unix milliseconds. NULL expires_at means never.
            CREATE TABLE pastes (
                id                  INTEGER PRIMARY KEY,
                title               TEXT NOT NULL DEFAULT '',
                body                TEXT NOT NULL,
                created_at          INTEGER NOT NULL,
                expires_at          INTEGER,
                delete_after_read   INTEGER NOT NULL DEFAULT 0,
                privacy             TEXT NOT NULL DEFAULT 'public'
                    CHECK (privacy IN ('public', 'unlisted', 'private')),
                password            TEXT,
                syntax              TEXT NOT NULL DEFAULT '',
                owner_id            INTEGER REFERENCES users(id),
                CHECK (id >= 0),
                CHECK (expires_at IS NULL OR expires_at > created_at),
                CHECK (privacy != 'private' OR owner_id IS NOT NULL)
            );

            CREATE INDEX idx_pastes_owner ON pastes(owner_id, created_at);
            CREATE INDEX idx_pastes_expires ON pastes(expires_at)
                WHERE expires_at IS NOT NULL;

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
