use std::sync::Arc;

use pronet_db::Database;
use pronet_db::models::ConnectionRow;
use pronet_types::models::{Connection, ConnectionStatus, Decision};
use tracing::{info, warn};
use uuid::Uuid;

use crate::eligibility::Eligibility;
use crate::error::{CoreError, Result};
use crate::{parse_db_time, parse_db_uuid};

/// The connection request lifecycle: NoEdge → Pending → Accepted | Declined.
/// Accepted and Declined are terminal; a declined edge stays behind as a
/// tombstone and never blocks a later request.
#[derive(Clone)]
pub struct ConnectionService {
    db: Arc<Database>,
    eligibility: Eligibility,
}

impl ConnectionService {
    pub fn new(db: Arc<Database>, eligibility: Eligibility) -> Self {
        Self { db, eligibility }
    }

    /// Creates a pending edge requester → target.
    ///
    /// Fails with `DuplicateRequest` while a pending or accepted edge exists
    /// between the pair (either direction), and with `CapacityExceeded` when
    /// the eligibility rules refuse the requester. The final duplicate check
    /// and the insert run as one store transaction, so two concurrent
    /// requesters cannot both get an edge in.
    pub fn send_request(&self, requester: Uuid, target: Uuid) -> Result<Connection> {
        let requester_key = requester.to_string();
        let target_key = target.to_string();

        if self.db.find_live_connection(&requester_key, &target_key)?.is_some() {
            return Err(CoreError::DuplicateRequest);
        }

        if !self.eligibility.can_request(requester, target)? {
            return Err(CoreError::CapacityExceeded);
        }

        let id = Uuid::new_v4();
        let inserted =
            self.db
                .insert_connection_if_no_live_edge(&id.to_string(), &requester_key, &target_key)?;
        if !inserted {
            // Lost the race to another request for the same pair.
            return Err(CoreError::DuplicateRequest);
        }

        info!(%requester, %target, connection_id = %id, "connection request created");
        self.get_required(id)
    }

    /// Moves a pending edge addressed to `responder` into a terminal state.
    /// Single-shot: once the edge has left Pending, further calls see
    /// `NotFound`.
    pub fn respond(&self, responder: Uuid, connection_id: Uuid, decision: Decision) -> Result<Connection> {
        let row = self
            .db
            .get_connection(&connection_id.to_string())?
            .ok_or(CoreError::NotFound)?;

        if parse_db_uuid(&row.target_id, "connection") != responder {
            return Err(CoreError::Forbidden);
        }
        if row.status != ConnectionStatus::Pending.as_str() {
            return Err(CoreError::NotFound);
        }

        let status = decision.terminal_status();
        let moved = self.db.set_connection_status_if_pending(
            &connection_id.to_string(),
            &responder.to_string(),
            status.as_str(),
        )?;
        if !moved {
            // Another respond won between our read and the update.
            return Err(CoreError::NotFound);
        }

        info!(%responder, %connection_id, status = status.as_str(), "connection request decided");
        self.get_required(connection_id)
    }

    /// The friend list: accepted edges with `user` at either endpoint,
    /// regardless of who originally asked.
    pub fn list_accepted(&self, user: Uuid) -> Result<Vec<Connection>> {
        let rows = self.db.accepted_connections_of(&user.to_string())?;
        Ok(rows.into_iter().map(connection_from_row).collect())
    }

    /// Incoming requests still awaiting this user's decision.
    pub fn list_pending_for(&self, user: Uuid) -> Result<Vec<Connection>> {
        let rows = self.db.pending_requests_for(&user.to_string())?;
        Ok(rows.into_iter().map(connection_from_row).collect())
    }

    fn get_required(&self, id: Uuid) -> Result<Connection> {
        let row = self.db.get_connection(&id.to_string())?.ok_or(CoreError::NotFound)?;
        Ok(connection_from_row(row))
    }
}

fn connection_from_row(row: ConnectionRow) -> Connection {
    let status = ConnectionStatus::parse(&row.status).unwrap_or_else(|| {
        warn!("Corrupt status '{}' on connection '{}'", row.status, row.id);
        ConnectionStatus::Pending
    });

    Connection {
        id: parse_db_uuid(&row.id, "connection"),
        requester_id: parse_db_uuid(&row.requester_id, "connection"),
        target_id: parse_db_uuid(&row.target_id, "connection"),
        status,
        created_at: parse_db_time(&row.created_at, "connection"),
        decided_at: row.decided_at.as_deref().map(|t| parse_db_time(t, "connection")),
    }
}
