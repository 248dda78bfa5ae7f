//! The canonical ledger row and the frozen actor identity.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::enums::{ActionTag, EntityType, UserRole};
use crate::snapshots::EntitySnapshot;

/// The acting principal as of the moment of the action.
///
/// Frozen at record time and never re-derived: a later promotion, demotion,
/// or department move of the actor does not retroactively alter historical
/// attribution.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ActorSnapshot {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub department_id: Option<String>,
    pub department_name: Option<String>,
}

/// One immutable audit entry capturing a mutation to a business entity.
///
/// Created exactly once; never updated. Snapshot presence encodes the kind
/// of change: only `after` = creation, only `before` = deletion, both =
/// update. Records are totally ordered by `created_at`, ties broken by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ChangeRecord {
    pub id: String,
    pub entity_type: EntityType,
    /// Null only transiently, before the affected entity's id is known.
    pub entity_id: Option<String>,
    pub actor_id: String,
    /// Organizational scope for access-controlled querying. Defaults to the
    /// actor's own department when not explicitly overridden.
    pub scope_department_id: Option<String>,
    pub message: Option<String>,
    pub before: Option<EntitySnapshot>,
    pub after: Option<EntitySnapshot>,
    pub actor: ActorSnapshot,
    /// Explicit tags, when the writer supplied or derived them. Absent on
    /// rows that predate explicit tagging.
    pub actions: Option<Vec<ActionTag>>,
    pub created_at: DateTime<Utc>,
}

impl ChangeRecord {
    /// The record's action tags: stored ones when present, otherwise
    /// re-derived from the snapshots. The read path calls this so filtering
    /// by tag behaves identically for pre-tagged and legacy rows.
    #[must_use]
    pub fn effective_actions(&self) -> Vec<ActionTag> {
        self.actions
            .clone()
            .unwrap_or_else(|| classify(self.before.as_ref(), self.after.as_ref()))
    }
}
