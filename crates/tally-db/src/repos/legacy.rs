//! Legacy-compatible narrow ledger.
//!
//! Old readers consume a flatter table without actor snapshots, scope, or
//! action tags. The recorder dual-writes it for the four first-class entity
//! types; the canonical `change_log` remains authoritative. Snapshots are
//! kept as raw JSON here because that is what the legacy readers expect.

use chrono::{DateTime, Utc};

use tally_core::enums::EntityType;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::TallyService;

/// One row of the legacy ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyChange {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub actor_id: String,
    pub actor_name: String,
    pub message: Option<String>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Append one legacy row inside the recorder's transaction.
pub(crate) async fn append_legacy(
    tx: &libsql::Transaction,
    entry: &LegacyChange,
) -> Result<(), DatabaseError> {
    tx.execute(
        "INSERT INTO legacy_change_log
             (id, entity_type, entity_id, actor_id, actor_name, message,
              snapshot_before, snapshot_after, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        libsql::params![
            entry.id.as_str(),
            entry.entity_type.as_str(),
            entry.entity_id.as_deref(),
            entry.actor_id.as_str(),
            entry.actor_name.as_str(),
            entry.message.as_deref(),
            entry.before.as_ref().map(std::string::ToString::to_string).as_deref(),
            entry.after.as_ref().map(std::string::ToString::to_string).as_deref(),
            entry.created_at.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

fn parse_json_col(s: Option<&str>) -> Result<Option<serde_json::Value>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => {
            let val = serde_json::from_str(s)
                .map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))?;
            Ok(Some(val))
        }
        _ => Ok(None),
    }
}

impl TallyService {
    /// Read side of the legacy ledger, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_legacy_changes(
        &self,
        entity: Option<EntityType>,
        limit: u32,
    ) -> Result<Vec<LegacyChange>, DatabaseError> {
        let mut params: Vec<libsql::Value> = Vec::new();
        let where_clause = match entity {
            Some(et) => {
                params.push(libsql::Value::Text(et.as_str().to_string()));
                "WHERE entity_type = ?1".to_string()
            }
            None => String::new(),
        };

        let sql = format!(
            "SELECT id, entity_type, entity_id, actor_id, actor_name, message,
                    snapshot_before, snapshot_after, created_at
             FROM legacy_change_log {where_clause}
             ORDER BY created_at DESC, id DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(LegacyChange {
                id: row.get(0)?,
                entity_type: parse_enum(&row.get::<String>(1)?)?,
                entity_id: get_opt_string(&row, 2)?,
                actor_id: row.get(3)?,
                actor_name: row.get(4)?,
                message: get_opt_string(&row, 5)?,
                before: parse_json_col(get_opt_string(&row, 6)?.as_deref())?,
                after: parse_json_col(get_opt_string(&row, 7)?.as_deref())?,
                created_at: parse_datetime(&row.get::<String>(8)?)?,
            });
        }
        Ok(entries)
    }
}
