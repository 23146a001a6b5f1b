use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            email           TEXT,
            name            TEXT,
            date_of_birth   TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS connections (
            id              TEXT PRIMARY KEY,
            requester_id    TEXT NOT NULL REFERENCES users(id),
            target_id       TEXT NOT NULL REFERENCES users(id),
            status          TEXT NOT NULL DEFAULT 'pending',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            decided_at      TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_connections_requester
            ON connections(requester_id, status);
        CREATE INDEX IF NOT EXISTS idx_connections_target
            ON connections(target_id, status);

        CREATE TABLE IF NOT EXISTS messages (
            id                  INTEGER PRIMARY KEY,
            sender_id           TEXT NOT NULL REFERENCES users(id),
            receiver_id         TEXT NOT NULL REFERENCES users(id),
            body                TEXT NOT NULL,
            sent_at             TEXT NOT NULL,
            sender_deleted      INTEGER NOT NULL DEFAULT 0,
            receiver_deleted    INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id, sender_deleted);
        CREATE INDEX IF NOT EXISTS idx_messages_receiver
            ON messages(receiver_id, receiver_deleted);

        CREATE TABLE IF NOT EXISTS sequences (
            name    TEXT PRIMARY KEY,
            value   INTEGER NOT NULL
        );

        -- Seed the message id allocator
        INSERT OR IGNORE INTO sequences (name, value) VALUES ('messages', 0);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
