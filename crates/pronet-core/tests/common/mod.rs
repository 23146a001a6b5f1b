#![allow(dead_code)] // not every suite uses every helper

use std::sync::Arc;

use pronet_core::connections::ConnectionService;
use pronet_core::eligibility::{Eligibility, EligibilityPolicy};
use pronet_core::messaging::MessagingService;
use pronet_core::users::UserService;
use pronet_db::Database;
use pronet_types::models::{Decision, NewProfile};
use uuid::Uuid;

pub struct TestEnv {
    pub db: Arc<Database>,
    pub users: UserService,
    pub eligibility: Eligibility,
    pub connections: ConnectionService,
    pub messaging: MessagingService,
}

pub fn setup() -> TestEnv {
    setup_with_policy(EligibilityPolicy::default())
}

pub fn setup_with_policy(policy: EligibilityPolicy) -> TestEnv {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pronet=debug".into()),
        )
        .try_init();

    let db = Arc::new(Database::open_in_memory().unwrap());
    let eligibility = Eligibility::new(db.clone(), policy);

    TestEnv {
        users: UserService::new(db.clone()),
        connections: ConnectionService::new(db.clone(), eligibility.clone()),
        messaging: MessagingService::new(db.clone()),
        eligibility,
        db,
    }
}

pub fn register(env: &TestEnv, username: &str) -> Uuid {
    env.users
        .register(username, "testpass123", NewProfile::default())
        .unwrap()
        .id
}

/// Full request + accept between two users.
pub fn befriend(env: &TestEnv, a: Uuid, b: Uuid) {
    let conn = env.connections.send_request(a, b).unwrap();
    env.connections.respond(b, conn.id, Decision::Accept).unwrap();
}
