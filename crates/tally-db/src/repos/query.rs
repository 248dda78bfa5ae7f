//! Query/filter engine — the read side of the canonical ledger.
//!
//! Indexed narrowing (scope, entity id, date range) happens in SQL; text and
//! tag filters run in Rust because re-derived tags and live-lookup search are
//! not index-backed. Pagination is applied after all filtering. Ordering is
//! always `created_at` descending, ties broken by `id` descending.

use chrono::{DateTime, Utc};

use tally_core::enums::{ActionTag, EntityType};
use tally_core::record::ChangeRecord;
use tally_core::views::{ChangePage, ChangeRecordView};

use crate::error::DatabaseError;
use crate::helpers::{
    entity_type_to_table, get_opt_string, parse_datetime, parse_enum, parse_optional_actions,
    parse_optional_snapshot,
};
use crate::service::TallyService;

const SELECT_COLS: &str = "id, entity_type, entity_id, actor_id, scope_department_id, message, \
     snapshot_before, snapshot_after, actor_snapshot, actions, created_at";

/// Filter criteria for change-log queries. All fields combine with AND.
#[derive(Debug, Default)]
pub struct ChangeLogFilter {
    /// Free text matched against the frozen actor snapshot: id, phone, or
    /// display name.
    pub actor: Option<String>,
    /// Free text matched against identifying fields in either snapshot,
    /// with a fallback live lookup against current entity state so renamed
    /// entities remain searchable by their current values.
    pub target: Option<String>,
    /// Records whose (stored or re-derived) tag set contains this tag.
    pub action: Option<ActionTag>,
    /// Department scope.
    pub scope_department_id: Option<String>,
    /// A specific target entity.
    pub entity_id: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    /// 1-based page number; defaults to 1.
    pub page: Option<u32>,
    /// Defaults to the service's configured page size.
    pub per_page: Option<u32>,
}

fn row_to_change_record(row: &libsql::Row) -> Result<ChangeRecord, DatabaseError> {
    let actor_json: String = row.get(8)?;
    Ok(ChangeRecord {
        id: row.get(0)?,
        entity_type: parse_enum(&row.get::<String>(1)?)?,
        entity_id: get_opt_string(row, 2)?,
        actor_id: row.get(3)?,
        scope_department_id: get_opt_string(row, 4)?,
        message: get_opt_string(row, 5)?,
        before: parse_optional_snapshot(get_opt_string(row, 6)?.as_deref())?,
        after: parse_optional_snapshot(get_opt_string(row, 7)?.as_deref())?,
        actor: serde_json::from_str(&actor_json)
            .map_err(|e| DatabaseError::Query(format!("Invalid actor snapshot JSON: {e}")))?,
        actions: parse_optional_actions(get_opt_string(row, 9)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
    })
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl TallyService {
    /// List change records matching the filter, newest first.
    ///
    /// Records lacking stored `actions` get them re-derived before
    /// filtering, so tag filtering behaves identically for pre-tagged and
    /// legacy rows.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a stored row cannot be
    /// decoded.
    pub async fn list_changes(
        &self,
        filter: &ChangeLogFilter,
    ) -> Result<ChangePage, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref scope) = filter.scope_department_id {
            params.push(libsql::Value::Text(scope.clone()));
            conditions.push(format!("scope_department_id = ?{}", params.len()));
        }
        if let Some(ref entity_id) = filter.entity_id {
            params.push(libsql::Value::Text(entity_id.clone()));
            conditions.push(format!("entity_id = ?{}", params.len()));
        }
        if let Some(from) = filter.created_from {
            params.push(libsql::Value::Text(from.to_rfc3339()));
            conditions.push(format!("created_at >= ?{}", params.len()));
        }
        if let Some(to) = filter.created_to {
            params.push(libsql::Value::Text(to.to_rfc3339()));
            conditions.push(format!("created_at <= ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {SELECT_COLS} FROM change_log {where_clause}
             ORDER BY created_at DESC, id DESC"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let actor_needle = filter.actor.as_deref().map(str::to_lowercase);
        let target_needle = filter.target.as_deref().map(str::to_lowercase);

        let mut matched: Vec<(ChangeRecord, Vec<ActionTag>)> = Vec::new();
        while let Some(row) = rows.next().await? {
            let record = row_to_change_record(&row)?;
            let actions = record.effective_actions();

            if let Some(action) = filter.action {
                if !actions.contains(&action) {
                    continue;
                }
            }
            if let Some(ref needle) = actor_needle {
                if !matches_actor(&record, needle) {
                    continue;
                }
            }
            if let Some(ref needle) = target_needle {
                if !self.matches_target(&record, needle).await? {
                    continue;
                }
            }
            matched.push((record, actions));
        }

        let total = matched.len() as u64;
        let page = filter.page.unwrap_or(1).max(1);
        let per_page = filter.per_page.unwrap_or_else(|| self.default_per_page());
        let start = (page as usize - 1) * per_page as usize;

        let mut records = Vec::new();
        for (record, actions) in matched.into_iter().skip(start).take(per_page as usize) {
            records.push(self.build_view(record, actions).await?);
        }

        Ok(ChangePage {
            records,
            total,
            page,
            per_page,
        })
    }

    /// FTS5 search across change messages, newest-ranked first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn search_changes(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ChangeRecordView>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT c.id, c.entity_type, c.entity_id, c.actor_id, c.scope_department_id, \
                 c.message, c.snapshot_before, c.snapshot_after, c.actor_snapshot, c.actions, \
                 c.created_at
                 FROM change_log_fts
                 JOIN change_log c ON c.rowid = change_log_fts.rowid
                 WHERE change_log_fts MATCH ?1
                 ORDER BY rank LIMIT ?2",
                libsql::params![query, limit],
            )
            .await?;

        let mut views = Vec::new();
        while let Some(row) = rows.next().await? {
            let record = row_to_change_record(&row)?;
            let actions = record.effective_actions();
            views.push(self.build_view(record, actions).await?);
        }
        Ok(views)
    }

    /// Latest records for one entity, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn recent_changes(
        &self,
        entity: EntityType,
        entity_id: &str,
        limit: u32,
    ) -> Result<Vec<ChangeRecordView>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM change_log
                     WHERE entity_type = ?1 AND entity_id = ?2
                     ORDER BY created_at DESC, id DESC LIMIT ?3"
                ),
                libsql::params![entity.as_str(), entity_id, limit],
            )
            .await?;

        let mut views = Vec::new();
        while let Some(row) = rows.next().await? {
            let record = row_to_change_record(&row)?;
            let actions = record.effective_actions();
            views.push(self.build_view(record, actions).await?);
        }
        Ok(views)
    }

    /// The entity's current identifying field, or `None` when the row is
    /// gone. Named entities resolve to their name; orders, bookings, and
    /// assignments resolve to their id.
    async fn current_display(
        &self,
        entity: EntityType,
        id: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let column = match entity {
            EntityType::User
            | EntityType::Department
            | EntityType::Product
            | EntityType::ServiceKit => "name",
            EntityType::Order | EntityType::Booking | EntityType::BookingDepartment => "id",
        };
        let table = entity_type_to_table(entity);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {column} FROM {table} WHERE id = ?1"),
                [id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    /// Target text matching: snapshot identifying fields first, then a live
    /// lookup of the entity's current state so renamed entities remain
    /// searchable by their present values.
    async fn matches_target(
        &self,
        record: &ChangeRecord,
        needle_lower: &str,
    ) -> Result<bool, DatabaseError> {
        if let Some(id) = &record.entity_id {
            if contains_ci(id, needle_lower) {
                return Ok(true);
            }
        }
        for snapshot in [record.before.as_ref(), record.after.as_ref()]
            .into_iter()
            .flatten()
        {
            if contains_ci(snapshot.display_name(), needle_lower)
                || contains_ci(snapshot.entity_id(), needle_lower)
            {
                return Ok(true);
            }
        }
        if let Some(id) = &record.entity_id {
            if let Some(current) = self.current_display(record.entity_type, id).await? {
                if contains_ci(&current, needle_lower) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn build_view(
        &self,
        record: ChangeRecord,
        actions: Vec<ActionTag>,
    ) -> Result<ChangeRecordView, DatabaseError> {
        let target_display = match &record.entity_id {
            Some(id) => match self.current_display(record.entity_type, id).await? {
                Some(current) => Some(current),
                None => record
                    .after
                    .as_ref()
                    .or(record.before.as_ref())
                    .map(|s| s.display_name().to_string()),
            },
            None => None,
        };

        Ok(ChangeRecordView {
            id: record.id,
            created_at: record.created_at,
            actor: record.actor,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            target_display,
            actions,
            message: record.message,
            before: record.before,
            after: record.after,
        })
    }
}

fn matches_actor(record: &ChangeRecord, needle_lower: &str) -> bool {
    contains_ci(&record.actor.id, needle_lower)
        || contains_ci(&record.actor.name, needle_lower)
        || record
            .actor
            .phone
            .as_deref()
            .is_some_and(|p| contains_ci(p, needle_lower))
}
