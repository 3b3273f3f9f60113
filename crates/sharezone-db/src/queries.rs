use crate::models::{MessageRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};

const USER_COLUMNS: &str = "id, username, full_name, profile_picture, password, created_at";

impl Database {
    // -- Users --

    /// Insert a user. Returns false if the username is already taken.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        full_name: &str,
        password_hash: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, full_name, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, full_name, password_hash),
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn user_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Connections --

    /// Connect two users in both directions. Connecting twice is a no-op.
    pub fn connect_users(&self, user_id: &str, other_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT OR IGNORE INTO connections (user_id, connection_id) VALUES (?1, ?2)",
                (user_id, other_id),
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO connections (user_id, connection_id) VALUES (?1, ?2)",
                (other_id, user_id),
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_connections(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.full_name, u.profile_picture, u.password, u.created_at
                 FROM connections c
                 JOIN users u ON u.id = c.connection_id
                 WHERE c.user_id = ?1
                 ORDER BY u.full_name",
            )?;

            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, row: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, from_user_id, to_user_id, text, message_type, media_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    row.id,
                    row.from_user_id,
                    row.to_user_id,
                    row.text,
                    row.message_type,
                    row.media_url,
                    row.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// All messages exchanged between `user_id` and `peer_id`, oldest first.
    /// Equal timestamps keep insertion order.
    pub fn get_conversation(&self, user_id: &str, peer_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_conversation(conn, user_id, peer_id))
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        profile_picture: row.get(3)?,
        password: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn query_conversation(conn: &Connection, user_id: &str, peer_id: &str) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, from_user_id, to_user_id, text, message_type, media_url, created_at
         FROM messages
         WHERE (from_user_id = ?1 AND to_user_id = ?2)
            OR (from_user_id = ?2 AND to_user_id = ?1)
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![user_id, peer_id], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                from_user_id: row.get(1)?,
                to_user_id: row.get(2)?,
                text: row.get(3)?,
                message_type: row.get(4)?,
                media_url: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_users(ids: &[&str]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for id in ids {
            db.create_user(id, &format!("user-{}", id), &format!("User {}", id), "hash")
                .unwrap();
        }
        db
    }

    fn text_row(id: &str, from: &str, to: &str, text: &str, at: &str) -> MessageRow {
        MessageRow {
            id: id.into(),
            from_user_id: from.into(),
            to_user_id: to.into(),
            text: text.into(),
            message_type: "text".into(),
            media_url: None,
            created_at: at.into(),
        }
    }

    #[test]
    fn conversation_contains_only_the_pair_in_time_order() {
        let db = db_with_users(&["a", "b", "c"]);
        db.insert_message(&text_row("m2", "b", "a", "second", "2026-01-01T00:00:02.000Z")).unwrap();
        db.insert_message(&text_row("m1", "a", "b", "first", "2026-01-01T00:00:01.000Z")).unwrap();
        db.insert_message(&text_row("m3", "a", "c", "elsewhere", "2026-01-01T00:00:03.000Z")).unwrap();

        let rows = db.get_conversation("a", "b").unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);

        let reversed = db.get_conversation("b", "a").unwrap();
        assert_eq!(reversed.len(), 2);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let db = db_with_users(&["a", "b"]);
        let at = "2026-01-01T00:00:00.000Z";
        db.insert_message(&text_row("z", "a", "b", "one", at)).unwrap();
        db.insert_message(&text_row("y", "b", "a", "two", at)).unwrap();
        db.insert_message(&text_row("x", "a", "b", "three", at)).unwrap();

        let ids: Vec<String> = db.get_conversation("a", "b").unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["z", "y", "x"]);
    }

    #[test]
    fn empty_message_violates_schema() {
        let db = db_with_users(&["a", "b"]);
        let row = text_row("m", "a", "b", "", "2026-01-01T00:00:00.000Z");
        assert!(db.insert_message(&row).is_err());
    }

    #[test]
    fn self_message_violates_schema() {
        let db = db_with_users(&["a"]);
        let row = text_row("m", "a", "a", "hi", "2026-01-01T00:00:00.000Z");
        assert!(db.insert_message(&row).is_err());
    }

    #[test]
    fn connections_are_symmetric_and_idempotent() {
        let db = db_with_users(&["a", "b"]);
        db.connect_users("a", "b").unwrap();
        db.connect_users("b", "a").unwrap();

        let of_a = db.get_connections("a").unwrap();
        assert_eq!(of_a.len(), 1);
        assert_eq!(of_a[0].id, "b");
        assert_eq!(db.get_connections("b").unwrap()[0].id, "a");
    }

    #[test]
    fn user_lookup() {
        let db = db_with_users(&["a"]);
        assert!(db.user_exists("a").unwrap());
        assert!(!db.user_exists("nobody").unwrap());
        assert_eq!(db.get_user_by_username("user-a").unwrap().unwrap().full_name, "User a");
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn taken_username_is_reported_not_raised() {
        let db = db_with_users(&["a"]);
        assert!(!db.create_user("other-id", "user-a", "Someone Else", "hash").unwrap());
        assert_eq!(db.get_user_by_username("user-a").unwrap().unwrap().id, "a");
    }
}
