use crate::models::{ConnectionRow, MessageRow, UserRow};
use crate::Database;
use anyhow::{Result, anyhow, bail};
use rusqlite::Row;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        name: Option<&str>,
        date_of_birth: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, email, name, date_of_birth)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, username, password_hash, email, name, date_of_birth],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_COLUMNS} WHERE id = ?1"))?;
            let row = stmt.query_row([id], user_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_COLUMNS} WHERE username = ?1"))?;
            let row = stmt.query_row([username], user_from_row).optional()?;
            Ok(row)
        })
    }

    /// Updates one profile column. The column name is whitelisted here so no
    /// caller input ever reaches the SQL text.
    pub fn update_user_field(&self, id: &str, column: &str, value: Option<&str>) -> Result<bool> {
        if !matches!(column, "email" | "name" | "date_of_birth") {
            bail!("not an updatable profile column: {}", column);
        }
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                &format!("UPDATE users SET {column} = ?1 WHERE id = ?2"),
                rusqlite::params![value, id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn update_user_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                rusqlite::params![password_hash, id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Connections --

    /// Inserts a pending edge unless a live (pending or accepted) edge already
    /// exists between the pair, in either direction. The probe and the insert
    /// run in one transaction so two concurrent requesters cannot both pass
    /// the probe. Returns false when the insert was skipped.
    pub fn insert_connection_if_no_live_edge(
        &self,
        id: &str,
        requester_id: &str,
        target_id: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let live: Option<String> = tx
                .query_row(
                    "SELECT id FROM connections
                     WHERE status IN ('pending', 'accepted')
                       AND ((requester_id = ?1 AND target_id = ?2)
                         OR (requester_id = ?2 AND target_id = ?1))",
                    [requester_id, target_id],
                    |row| row.get(0),
                )
                .optional()?;

            if live.is_some() {
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO connections (id, requester_id, target_id, status)
                 VALUES (?1, ?2, ?3, 'pending')",
                [id, requester_id, target_id],
            )?;
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn find_live_connection(&self, a: &str, b: &str) -> Result<Option<ConnectionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{CONNECTION_COLUMNS}
                 WHERE status IN ('pending', 'accepted')
                   AND ((requester_id = ?1 AND target_id = ?2)
                     OR (requester_id = ?2 AND target_id = ?1))"
            ))?;
            let row = stmt.query_row([a, b], connection_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn get_connection(&self, id: &str) -> Result<Option<ConnectionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{CONNECTION_COLUMNS} WHERE id = ?1"))?;
            let row = stmt.query_row([id], connection_from_row).optional()?;
            Ok(row)
        })
    }

    /// Conditional pending → terminal transition. The status and responder
    /// checks live in the WHERE clause, so a repeated respond (or a respond
    /// by the wrong user) changes nothing. Returns false when no row moved.
    pub fn set_connection_status_if_pending(
        &self,
        id: &str,
        target_id: &str,
        status: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE connections
                 SET status = ?1, decided_at = datetime('now')
                 WHERE id = ?2 AND target_id = ?3 AND status = 'pending'",
                [status, id, target_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn accepted_connections_of(&self, user_id: &str) -> Result<Vec<ConnectionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{CONNECTION_COLUMNS}
                 WHERE status = 'accepted'
                   AND (requester_id = ?1 OR target_id = ?1)
                 ORDER BY created_at"
            ))?;
            let rows = stmt
                .query_map([user_id], connection_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn pending_requests_for(&self, user_id: &str) -> Result<Vec<ConnectionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{CONNECTION_COLUMNS}
                 WHERE status = 'pending' AND target_id = ?1
                 ORDER BY created_at"
            ))?;
            let rows = stmt
                .query_map([user_id], connection_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_accepted(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM connections
                 WHERE status = 'accepted'
                   AND (requester_id = ?1 OR target_id = ?1)",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Batch-fetch the accepted neighbors of a set of users — one frontier
    /// hop of the reachability walk in a single query.
    pub fn accepted_neighbor_ids(&self, user_ids: &[String]) -> Result<Vec<String>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let n = user_ids.len();
            let lhs: Vec<String> = (1..=n).map(|i| format!("?{}", i)).collect();
            let rhs: Vec<String> = (n + 1..=2 * n).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT target_id FROM connections
                 WHERE status = 'accepted' AND requester_id IN ({})
                 UNION
                 SELECT requester_id FROM connections
                 WHERE status = 'accepted' AND target_id IN ({})",
                lhs.join(", "),
                rhs.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = user_ids
                .iter()
                .chain(user_ids.iter())
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    /// Monotonic allocator backed by the sequences table. Increment and read
    /// happen under the single writer lock, so values never repeat.
    pub fn next_sequence_value(&self, name: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE sequences SET value = value + 1 WHERE name = ?1",
                [name],
            )?;
            if changed == 0 {
                return Err(anyhow!("unknown sequence: {}", name));
            }
            let value = tx.query_row(
                "SELECT value FROM sequences WHERE name = ?1",
                [name],
                |row| row.get(0),
            )?;
            tx.commit()?;
            Ok(value)
        })
    }

    pub fn insert_message(
        &self,
        id: i64,
        sender_id: &str,
        receiver_id: &str,
        body: &str,
        sent_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, body, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, sender_id, receiver_id, body, sent_at],
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{MESSAGE_COLUMNS} WHERE id = ?1"))?;
            let row = stmt.query_row([id], message_from_row).optional()?;
            Ok(row)
        })
    }

    /// One combined view: messages the user received and has not hidden, plus
    /// messages the user sent and has not hidden. Each side's flag only
    /// affects that side.
    pub fn visible_messages_for(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_COLUMNS}
                 WHERE (receiver_id = ?1 AND receiver_deleted = 0)
                    OR (sender_id = ?1 AND sender_deleted = 0)
                 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([user_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn mark_message_deleted(&self, id: i64, for_sender: bool) -> Result<bool> {
        let column = if for_sender { "sender_deleted" } else { "receiver_deleted" };
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                &format!("UPDATE messages SET {column} = 1 WHERE id = ?1"),
                [id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Physically removes rows no party can still see.
    pub fn purge_deleted_messages(&self) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM messages WHERE sender_deleted = 1 AND receiver_deleted = 1",
                [],
            )?;
            Ok(removed)
        })
    }
}

const USER_COLUMNS: &str =
    "SELECT id, username, password, email, name, date_of_birth, created_at FROM users";

const CONNECTION_COLUMNS: &str =
    "SELECT id, requester_id, target_id, status, created_at, decided_at FROM connections";

const MESSAGE_COLUMNS: &str =
    "SELECT id, sender_id, receiver_id, body, sent_at, sender_deleted, receiver_deleted
     FROM messages";

fn user_from_row(row: &Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        email: row.get(3)?,
        name: row.get(4)?,
        date_of_birth: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn connection_from_row(row: &Row) -> rusqlite::Result<ConnectionRow> {
    Ok(ConnectionRow {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        target_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        decided_at: row.get(5)?,
    })
}

fn message_from_row(row: &Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        body: row.get(3)?,
        sent_at: row.get(4)?,
        sender_deleted: row.get(5)?,
        receiver_deleted: row.get(6)?,
    })
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
