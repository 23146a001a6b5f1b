/// Database row types — these map directly to SQLite rows.
/// Distinct from the pronet-types domain models to keep the DB layer
/// independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub created_at: String,
}

pub struct ConnectionRow {
    pub id: String,
    pub requester_id: String,
    pub target_id: String,
    pub status: String,
    pub created_at: String,
    pub decided_at: Option<String>,
}

pub struct MessageRow {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub body: String,
    pub sent_at: String,
    pub sender_deleted: bool,
    pub receiver_deleted: bool,
}
