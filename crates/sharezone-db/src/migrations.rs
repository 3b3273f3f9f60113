use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id               TEXT PRIMARY KEY,
            username         TEXT NOT NULL UNIQUE,
            full_name        TEXT NOT NULL,
            profile_picture  TEXT,
            password         TEXT NOT NULL,
            created_at       TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS connections (
            user_id        TEXT NOT NULL REFERENCES users(id),
            connection_id  TEXT NOT NULL REFERENCES users(id),
            created_at     TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, connection_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            from_user_id    TEXT NOT NULL REFERENCES users(id),
            to_user_id      TEXT NOT NULL REFERENCES users(id),
            text            TEXT NOT NULL DEFAULT '',
            message_type    TEXT NOT NULL CHECK (message_type IN ('text', 'image')),
            media_url       TEXT,
            created_at      TEXT NOT NULL,
            CHECK (from_user_id <> to_user_id),
            CHECK (text <> '' OR media_url IS NOT NULL)
        );

        CREATE INDEX IF NOT EXISTS idx_messages_pair
            ON messages(from_user_id, to_user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
