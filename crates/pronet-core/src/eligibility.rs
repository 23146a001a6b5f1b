use std::collections::HashSet;
use std::sync::Arc;

use pronet_db::Database;
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Tunables for the request-eligibility rules. The hop bound is configurable
/// rather than hard-coded; 3 keeps the walk cost bounded on dense graphs.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityPolicy {
    /// Below this many accepted connections a request is always allowed.
    pub direct_limit: usize,
    /// Reach bound in accepted-edge hops once the direct limit is hit.
    pub max_hops: usize,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            direct_limit: 5,
            max_hops: 3,
        }
    }
}

/// Decides whether a user may send a connection request. Pure read over the
/// current edge snapshot — whether a relationship already exists is the
/// workflow's concern, not this one's.
#[derive(Clone)]
pub struct Eligibility {
    db: Arc<Database>,
    policy: EligibilityPolicy,
}

impl Eligibility {
    pub fn new(db: Arc<Database>, policy: EligibilityPolicy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> EligibilityPolicy {
        self.policy
    }

    /// May `requester` send a connection request to `target`?
    ///
    /// Rule A: a requester with fewer than `direct_limit` accepted
    /// connections may always ask. Rule B: otherwise the target must be
    /// reachable within `max_hops` hops over accepted edges.
    pub fn can_request(&self, requester: Uuid, target: Uuid) -> Result<bool> {
        if requester == target {
            return Err(CoreError::InvalidArgument(
                "cannot request a connection to yourself".into(),
            ));
        }
        self.ensure_exists(requester)?;
        self.ensure_exists(target)?;

        let accepted = self.db.count_accepted(&requester.to_string())?;
        if (accepted as usize) < self.policy.direct_limit {
            return Ok(true);
        }

        self.reachable_within(requester, target, self.policy.max_hops)
    }

    fn ensure_exists(&self, user: Uuid) -> Result<()> {
        if self.db.get_user_by_id(&user.to_string())?.is_none() {
            return Err(CoreError::InvalidArgument(format!("unknown user: {user}")));
        }
        Ok(())
    }

    /// Frontier-at-a-time walk over accepted edges. Each hop expands the
    /// whole frontier with one batched neighbor query, so the store sees at
    /// most `max_hops` queries per evaluation.
    fn reachable_within(&self, from: Uuid, to: Uuid, max_hops: usize) -> Result<bool> {
        let to_key = to.to_string();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(from.to_string());
        let mut frontier = vec![from.to_string()];

        for hop in 1..=max_hops {
            let neighbors = self.db.accepted_neighbor_ids(&frontier)?;
            if neighbors.iter().any(|n| *n == to_key) {
                debug!(%from, %to, hop, "target reachable within bound");
                return Ok(true);
            }

            frontier = neighbors
                .into_iter()
                .filter(|n| visited.insert(n.clone()))
                .collect();
            if frontier.is_empty() {
                break;
            }
        }

        Ok(false)
    }
}
