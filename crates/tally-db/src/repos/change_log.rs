//! Change recorder — the write path of the canonical ledger.
//!
//! `record_change` freezes the actor, classifies untagged drafts, and
//! persists the record. For the four first-class entity types it also
//! appends to the legacy-compatible ledger inside the same transaction —
//! a deliberate dual-write for backward-compatible readers, not a second
//! source of truth.

use chrono::{DateTime, Utc};

use tally_core::classify::classify;
use tally_core::enums::{ActionTag, EntityType};
use tally_core::ids::{PREFIX_CHANGE, PREFIX_LEGACY};
use tally_core::record::{ActorSnapshot, ChangeRecord};
use tally_core::snapshots::EntitySnapshot;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_enum, writes_legacy_ledger};
use crate::repos::legacy::{LegacyChange, append_legacy};
use crate::service::TallyService;

/// Input to [`TallyService::record_change`].
#[derive(Debug, Clone)]
pub struct ChangeDraft {
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub actor_id: String,
    pub message: Option<String>,
    pub before: Option<EntitySnapshot>,
    pub after: Option<EntitySnapshot>,
    /// When absent, the classifier derives tags from the snapshots.
    pub actions: Option<Vec<ActionTag>>,
    /// When absent, defaults to the resolved actor's department.
    pub scope_department_id: Option<String>,
}

impl ChangeDraft {
    #[must_use]
    pub fn new(entity_type: EntityType, actor_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            entity_id: None,
            actor_id: actor_id.into(),
            message: None,
            before: None,
            after: None,
            actions: None,
            scope_department_id: None,
        }
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn before(mut self, before: EntitySnapshot) -> Self {
        self.before = Some(before);
        self
    }

    #[must_use]
    pub fn after(mut self, after: EntitySnapshot) -> Self {
        self.after = Some(after);
        self
    }

    #[must_use]
    pub fn actions(mut self, actions: Vec<ActionTag>) -> Self {
        self.actions = Some(actions);
        self
    }

    #[must_use]
    pub fn scope_department_id(mut self, department_id: impl Into<String>) -> Self {
        self.scope_department_id = Some(department_id.into());
        self
    }
}

impl TallyService {
    /// Resolve the acting principal and freeze their identity, role, and
    /// department as of now.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ActorNotFound` if no such user exists —
    /// recording fails closed rather than fabricating attribution.
    pub async fn resolve_actor(&self, actor_id: &str) -> Result<ActorSnapshot, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT u.id, u.name, u.phone, u.role, u.department_id, d.name
                 FROM users u
                 LEFT JOIN departments d ON d.id = u.department_id
                 WHERE u.id = ?1",
                [actor_id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Err(DatabaseError::ActorNotFound(actor_id.to_string()));
        };

        Ok(ActorSnapshot {
            id: row.get(0)?,
            name: row.get(1)?,
            phone: get_opt_string(&row, 2)?,
            role: parse_enum(&row.get::<String>(3)?)?,
            department_id: get_opt_string(&row, 4)?,
            department_name: get_opt_string(&row, 5)?,
        })
    }

    /// Persist one change record.
    ///
    /// The actor snapshot is resolved first; if that fails, nothing is
    /// written. Omitted `actions` are derived from exactly the
    /// `before`/`after` passed in (no re-fetch). The canonical insert and
    /// the legacy dual-write commit in one transaction. No cross-entity
    /// writes happen here — that is the propagator's job, invoked
    /// separately by the caller.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ActorNotFound` for an unresolvable actor,
    /// or `DatabaseError` on storage failure.
    pub async fn record_change(
        &self,
        draft: ChangeDraft,
    ) -> Result<ChangeRecord, DatabaseError> {
        let actor = self.resolve_actor(&draft.actor_id).await?;

        let scope_department_id = draft
            .scope_department_id
            .or_else(|| actor.department_id.clone());

        let actions = match draft.actions {
            Some(actions) => actions,
            None => classify(draft.before.as_ref(), draft.after.as_ref()),
        };

        let id = self.db().generate_id(PREFIX_CHANGE).await?;
        let legacy_id = if writes_legacy_ledger(draft.entity_type) {
            Some(self.db().generate_id(PREFIX_LEGACY).await?)
        } else {
            None
        };
        let now = Utc::now();

        let record = ChangeRecord {
            id,
            entity_type: draft.entity_type,
            entity_id: draft.entity_id,
            actor_id: draft.actor_id,
            scope_department_id,
            message: draft.message,
            before: draft.before,
            after: draft.after,
            actor,
            actions: Some(actions),
            created_at: now,
        };

        let snapshot_before = encode_optional(record.before.as_ref())?;
        let snapshot_after = encode_optional(record.after.as_ref())?;
        let actor_snapshot =
            serde_json::to_string(&record.actor).map_err(|e| DatabaseError::Other(e.into()))?;
        let actions_json = encode_optional(record.actions.as_ref())?;

        let tx = self.db().conn().transaction().await?;
        tx.execute(
            "INSERT INTO change_log
                 (id, entity_type, entity_id, actor_id, scope_department_id, message,
                  snapshot_before, snapshot_after, actor_snapshot, actions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            libsql::params![
                record.id.as_str(),
                record.entity_type.as_str(),
                record.entity_id.as_deref(),
                record.actor_id.as_str(),
                record.scope_department_id.as_deref(),
                record.message.as_deref(),
                snapshot_before.as_deref(),
                snapshot_after.as_deref(),
                actor_snapshot.as_str(),
                actions_json.as_deref(),
                now.to_rfc3339()
            ],
        )
        .await?;

        if let Some(legacy_id) = legacy_id {
            let legacy = LegacyChange {
                id: legacy_id,
                entity_type: record.entity_type,
                entity_id: record.entity_id.clone(),
                actor_id: record.actor_id.clone(),
                actor_name: record.actor.name.clone(),
                message: record.message.clone(),
                before: encode_value(record.before.as_ref())?,
                after: encode_value(record.after.as_ref())?,
                created_at: now,
            };
            append_legacy(&tx, &legacy).await?;
        }
        tx.commit().await?;

        tracing::debug!(
            entity_type = %record.entity_type,
            entity_id = record.entity_id.as_deref().unwrap_or("-"),
            record_id = %record.id,
            "change recorded"
        );

        Ok(record)
    }

    /// Irreversibly delete ledger rows older than the cutoff, from both the
    /// canonical and legacy ledgers. The only deletion path for records.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure.
    pub async fn purge_changes_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let canonical = self
            .db()
            .conn()
            .execute(
                "DELETE FROM change_log WHERE created_at < ?1",
                [cutoff.to_rfc3339()],
            )
            .await?;
        let legacy = self
            .db()
            .conn()
            .execute(
                "DELETE FROM legacy_change_log WHERE created_at < ?1",
                [cutoff.to_rfc3339()],
            )
            .await?;
        Ok(canonical + legacy)
    }
}

/// Serialize an optional value to an optional JSON TEXT column.
fn encode_optional<T: serde::Serialize>(
    value: Option<&T>,
) -> Result<Option<String>, DatabaseError> {
    value
        .map(|v| serde_json::to_string(v).map_err(|e| DatabaseError::Other(e.into())))
        .transpose()
}

/// Serialize an optional value to an optional `serde_json::Value`.
fn encode_value<T: serde::Serialize>(
    value: Option<&T>,
) -> Result<Option<serde_json::Value>, DatabaseError> {
    value
        .map(|v| serde_json::to_value(v).map_err(|e| DatabaseError::Other(e.into())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{seed_department, seed_user, test_service};
    use tally_core::enums::UserRole;

    #[tokio::test]
    async fn unresolvable_actor_fails_closed() {
        let svc = test_service().await;

        let draft = ChangeDraft::new(EntityType::Department, "usr-ghost")
            .entity_id("dep-1")
            .message("should not be written");
        let result = svc.record_change(draft).await;
        assert!(matches!(result, Err(DatabaseError::ActorNotFound(_))));

        // Nothing landed in either ledger.
        let mut rows = svc
            .db()
            .conn()
            .query("SELECT COUNT(*) FROM change_log", ())
            .await
            .unwrap();
        assert_eq!(rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap(), 0);
        let mut rows = svc
            .db()
            .conn()
            .query("SELECT COUNT(*) FROM legacy_change_log", ())
            .await
            .unwrap();
        assert_eq!(rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap(), 0);
    }

    #[tokio::test]
    async fn scope_defaults_to_actor_department() {
        let svc = test_service().await;
        seed_department(&svc, "dep-1", "Sales").await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, Some("dep-1")).await;

        let after = svc
            .collect_snapshot(EntityType::Department, "dep-1")
            .await
            .unwrap()
            .unwrap();
        let record = svc
            .record_change(
                ChangeDraft::new(EntityType::Department, "usr-1")
                    .entity_id("dep-1")
                    .after(after),
            )
            .await
            .unwrap();

        assert_eq!(record.scope_department_id.as_deref(), Some("dep-1"));
        assert_eq!(record.actor.name, "Ana");
    }

    #[tokio::test]
    async fn explicit_scope_overrides_actor_department() {
        let svc = test_service().await;
        seed_department(&svc, "dep-1", "Sales").await;
        seed_department(&svc, "dep-2", "Support").await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, Some("dep-1")).await;

        let record = svc
            .record_change(
                ChangeDraft::new(EntityType::Department, "usr-1")
                    .entity_id("dep-2")
                    .scope_department_id("dep-2")
                    .message("cross-scope edit"),
            )
            .await
            .unwrap();
        assert_eq!(record.scope_department_id.as_deref(), Some("dep-2"));
    }

    #[tokio::test]
    async fn omitted_actions_are_derived_from_snapshots() {
        let svc = test_service().await;
        seed_department(&svc, "dep-1", "Sales").await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, Some("dep-1")).await;

        let before = svc
            .collect_snapshot(EntityType::Department, "dep-1")
            .await
            .unwrap()
            .unwrap();
        svc.db()
            .conn()
            .execute(
                "UPDATE departments SET name = 'Sales East' WHERE id = 'dep-1'",
                (),
            )
            .await
            .unwrap();
        let after = svc
            .collect_snapshot(EntityType::Department, "dep-1")
            .await
            .unwrap()
            .unwrap();

        let record = svc
            .record_change(
                ChangeDraft::new(EntityType::Department, "usr-1")
                    .entity_id("dep-1")
                    .before(before)
                    .after(after),
            )
            .await
            .unwrap();
        assert_eq!(record.actions, Some(vec![ActionTag::ChangeName]));
    }

    #[tokio::test]
    async fn explicit_actions_are_stored_verbatim() {
        let svc = test_service().await;
        seed_department(&svc, "dep-1", "Sales").await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, Some("dep-1")).await;

        let record = svc
            .record_change(
                ChangeDraft::new(EntityType::Booking, "usr-1")
                    .entity_id("bkg-1")
                    .actions(vec![ActionTag::ChangeLocation])
                    .message("address change fanout"),
            )
            .await
            .unwrap();
        assert_eq!(record.actions, Some(vec![ActionTag::ChangeLocation]));
    }

    #[tokio::test]
    async fn frozen_actor_survives_later_demotion() {
        let svc = test_service().await;
        seed_department(&svc, "dep-1", "Sales").await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, Some("dep-1")).await;

        let record = svc
            .record_change(
                ChangeDraft::new(EntityType::Department, "usr-1")
                    .entity_id("dep-1")
                    .message("before demotion"),
            )
            .await
            .unwrap();
        assert_eq!(record.actor.role, UserRole::Admin);

        svc.db()
            .conn()
            .execute("UPDATE users SET role = 'employee' WHERE id = 'usr-1'", ())
            .await
            .unwrap();

        // Read the stored row back: attribution is the frozen copy.
        let page = svc
            .list_changes(&crate::repos::query::ChangeLogFilter::default())
            .await
            .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].actor.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn purge_removes_only_older_rows() {
        let svc = test_service().await;
        seed_department(&svc, "dep-1", "Sales").await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, Some("dep-1")).await;

        svc.record_change(
            ChangeDraft::new(EntityType::Department, "usr-1")
                .entity_id("dep-1")
                .message("recent"),
        )
        .await
        .unwrap();

        // Nothing is older than a cutoff in the past.
        let removed = svc
            .purge_changes_before(Utc::now() - chrono::Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 0);

        // Everything is older than a cutoff in the future.
        let removed = svc
            .purge_changes_before(Utc::now() + chrono::Duration::days(1))
            .await
            .unwrap();
        // One canonical row and one legacy row (department is first-class).
        assert_eq!(removed, 2);
    }
}
