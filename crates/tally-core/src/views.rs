//! Read-side view types returned by the query engine and propagator.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ActionTag, EntityType};
use crate::record::ActorSnapshot;
use crate::snapshots::EntitySnapshot;

/// One change record prepared for presentation.
///
/// `actions` is always materialized (stored or re-derived), and
/// `target_display` prefers the entity's *current* identifying fields so a
/// renamed entity shows up under its present name; when the entity is gone,
/// the snapshot's point-in-time name is used instead.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ChangeRecordView {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub actor: ActorSnapshot,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub target_display: Option<String>,
    pub actions: Vec<ActionTag>,
    pub message: Option<String>,
    /// Raw snapshots for detail drill-down.
    pub before: Option<EntitySnapshot>,
    pub after: Option<EntitySnapshot>,
}

/// One page of filtered change records, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ChangePage {
    pub records: Vec<ChangeRecordView>,
    /// Total matching records across all pages, after filtering.
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

/// Outcome of one propagation call. Failures are logged and swallowed, so
/// the report is the only signal a caller gets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PropagationReport {
    pub written: u32,
    pub failed: u32,
}
