use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pronet_db::Database;
use pronet_db::models::MessageRow;
use pronet_types::models::Message;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::{parse_db_time, parse_db_uuid};

pub const MAX_MESSAGE_CHARS: usize = 500;

/// Per-user message store with independent soft-delete per party. A row is
/// only ever hidden, never removed, while either side can still see it.
#[derive(Clone)]
pub struct MessagingService {
    db: Arc<Database>,
}

impl MessagingService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Stores a message with both delete flags unset. Ids come from the
    /// store's monotonic sequence.
    pub fn send(&self, sender: Uuid, receiver: Uuid, body: &str) -> Result<Message> {
        if sender == receiver {
            return Err(CoreError::InvalidArgument(
                "cannot send a message to yourself".into(),
            ));
        }
        self.ensure_exists(sender)?;
        self.ensure_exists(receiver)?;
        if body.chars().count() > MAX_MESSAGE_CHARS {
            return Err(CoreError::MessageTooLong);
        }

        let id = self.db.next_sequence_value("messages")?;
        let sent_at = Utc::now();
        self.db.insert_message(
            id,
            &sender.to_string(),
            &receiver.to_string(),
            body,
            &sent_at.to_rfc3339(),
        )?;

        info!(%sender, %receiver, message_id = id, "message stored");
        Ok(Message {
            id,
            sender_id: sender,
            receiver_id: receiver,
            body: body.to_string(),
            sent_at,
        })
    }

    /// The combined messages view: everything the user received and has not
    /// deleted, plus everything the user sent and has not deleted. Inbox and
    /// outbox are deliberately one list — a single visibility predicate, not
    /// two screens.
    pub fn list_messages(&self, user: Uuid) -> Result<Vec<Message>> {
        let rows = self.db.visible_messages_for(&user.to_string())?;
        Ok(rows.into_iter().map(message_from_row).collect())
    }

    /// Hides the message from `user`'s view only. The other party's
    /// visibility is untouched.
    pub fn delete(&self, user: Uuid, message_id: i64) -> Result<()> {
        let row = self.db.get_message(message_id)?.ok_or(CoreError::NotFound)?;
        let user_key = user.to_string();

        let for_sender = if row.sender_id == user_key {
            true
        } else if row.receiver_id == user_key {
            false
        } else {
            return Err(CoreError::Forbidden);
        };

        self.db.mark_message_deleted(message_id, for_sender)?;
        Ok(())
    }

    /// Physically removes messages both parties have deleted. Safe to call
    /// at any time; visible rows are never touched.
    pub fn purge_deleted(&self) -> Result<usize> {
        let removed = self.db.purge_deleted_messages()?;
        Ok(removed)
    }

    /// Background task that prunes fully deleted messages on an interval.
    pub async fn run_purge_loop(&self, interval_secs: u64) {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

        loop {
            interval.tick().await;

            match self.purge_deleted() {
                Ok(count) => {
                    if count > 0 {
                        info!("Purge: removed {} fully deleted messages", count);
                    }
                }
                Err(e) => {
                    warn!("Purge error: {}", e);
                }
            }
        }
    }

    fn ensure_exists(&self, user: Uuid) -> Result<()> {
        if self.db.get_user_by_id(&user.to_string())?.is_none() {
            return Err(CoreError::InvalidArgument(format!("unknown user: {user}")));
        }
        Ok(())
    }
}

fn message_from_row(row: MessageRow) -> Message {
    Message {
        id: row.id,
        sender_id: parse_db_uuid(&row.sender_id, "message"),
        receiver_id: parse_db_uuid(&row.receiver_id, "message"),
        body: row.body,
        sent_at: parse_db_time(&row.sent_at, "message"),
    }
}
