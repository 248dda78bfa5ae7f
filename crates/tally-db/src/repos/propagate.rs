//! Cross-entity propagation — secondary records on causally affected entities.
//!
//! Every operation here is triggered explicitly by a caller *after* a primary
//! mutation has committed; propagation never triggers further propagation.
//! Writes are best-effort: each target's record is its own transaction, a
//! failure is logged and swallowed, and neither the primary record nor the
//! other targets in the batch are affected. Propagated records always carry
//! explicit action tags, so read-path re-derivation never runs on them.

use tally_core::enums::{ActionTag, EntityType};
use tally_core::snapshots::{BookingSnapshot, EntitySnapshot};
use tally_core::views::PropagationReport;

use crate::error::DatabaseError;
use crate::repos::change_log::ChangeDraft;
use crate::service::TallyService;

/// Diff the watched booking fields (status, scheduled date, manager) into
/// tags and one human-readable line per changed field.
fn watched_booking_changes(
    before: &BookingSnapshot,
    after: &BookingSnapshot,
) -> (Vec<ActionTag>, Vec<String>) {
    let mut tags = Vec::new();
    let mut lines = Vec::new();

    if before.status != after.status {
        tags.push(ActionTag::ChangeStatus);
        lines.push(format!("status: {} -> {}", before.status, after.status));
    }
    if before.scheduled_at != after.scheduled_at {
        tags.push(ActionTag::ChangeDate);
        let fmt = |d: Option<chrono::DateTime<chrono::Utc>>| {
            d.map_or_else(|| "unscheduled".to_string(), |d| d.to_rfc3339())
        };
        lines.push(format!(
            "scheduled date: {} -> {}",
            fmt(before.scheduled_at),
            fmt(after.scheduled_at)
        ));
    }
    let before_mgr = before.manager.as_ref();
    let after_mgr = after.manager.as_ref();
    if before_mgr.map(|u| u.id.as_str()) != after_mgr.map(|u| u.id.as_str()) {
        tags.push(ActionTag::ChangeManager);
        let name = |u: Option<&tally_core::snapshots::UserBrief>| {
            u.map_or("unassigned", |u| u.name.as_str()).to_string()
        };
        lines.push(format!(
            "manager: {} -> {}",
            name(before_mgr),
            name(after_mgr)
        ));
    }

    (tags, lines)
}

impl TallyService {
    /// Fan out a shared service-location address change.
    ///
    /// Writes one secondary record on every booking that references the
    /// location, and one more on each such booking's linked order.
    /// Propagation depth is fixed at two hops (location -> booking ->
    /// that booking's order) — never beyond.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ActorNotFound` if the actor cannot be
    /// resolved (nothing is written), or `DatabaseError` if the referrer
    /// lookup itself fails. Individual record writes never error — they are
    /// counted in the report and logged.
    pub async fn propagate_location_change(
        &self,
        location_id: &str,
        old_address: &str,
        new_address: &str,
        actor_id: &str,
    ) -> Result<PropagationReport, DatabaseError> {
        // Fail closed on attribution before touching any target.
        self.resolve_actor(actor_id).await?;

        let location_name = {
            let mut rows = self
                .db()
                .conn()
                .query("SELECT name FROM locations WHERE id = ?1", [location_id])
                .await?;
            match rows.next().await? {
                Some(row) => row.get::<String>(0)?,
                None => location_id.to_string(),
            }
        };

        let mut booking_ids = Vec::new();
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id FROM bookings WHERE location_id = ?1 ORDER BY id",
                [location_id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            booking_ids.push(row.get::<String>(0)?);
        }

        let mut report = PropagationReport::default();
        let summary = format!(
            "Service location '{location_name}' address changed: {old_address} -> {new_address}"
        );

        for booking_id in booking_ids {
            let draft = ChangeDraft::new(EntityType::Booking, actor_id)
                .entity_id(booking_id.clone())
                .message(summary.clone())
                .actions(vec![ActionTag::ChangeLocation]);
            match self.record_change(draft).await {
                Ok(_) => report.written += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(booking_id = %booking_id, error = %e,
                        "propagation write failed, continuing");
                    continue;
                }
            }

            // Second hop: the booking's own linked order, one hop only.
            let order_id = {
                let mut rows = self
                    .db()
                    .conn()
                    .query(
                        "SELECT id FROM orders WHERE booking_id = ?1 ORDER BY id LIMIT 1",
                        [booking_id.as_str()],
                    )
                    .await?;
                match rows.next().await? {
                    Some(row) => Some(row.get::<String>(0)?),
                    None => None,
                }
            };
            if let Some(order_id) = order_id {
                let draft = ChangeDraft::new(EntityType::Order, actor_id)
                    .entity_id(order_id.clone())
                    .message(format!("Linked booking {booking_id}: {summary}"))
                    .actions(vec![ActionTag::ChangeLocation]);
                match self.record_change(draft).await {
                    Ok(_) => report.written += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(order_id = %order_id, error = %e,
                            "propagation write failed, continuing");
                    }
                }
            }
        }

        Ok(report)
    }

    /// After a direct booking edit, write one secondary record on its linked
    /// order summarizing which watched fields (status, scheduled date,
    /// manager) changed. No-op when nothing watched changed or the booking
    /// has no linked order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ActorNotFound` if the actor cannot be
    /// resolved. The write itself is best-effort and only counted.
    pub async fn propagate_booking_change(
        &self,
        before: &BookingSnapshot,
        after: &BookingSnapshot,
        actor_id: &str,
    ) -> Result<PropagationReport, DatabaseError> {
        self.resolve_actor(actor_id).await?;

        let (tags, lines) = watched_booking_changes(before, after);
        let Some(order) = after.linked_order.as_ref().or(before.linked_order.as_ref()) else {
            return Ok(PropagationReport::default());
        };
        if tags.is_empty() {
            return Ok(PropagationReport::default());
        }

        let mut report = PropagationReport::default();
        let draft = ChangeDraft::new(EntityType::Order, actor_id)
            .entity_id(order.id.clone())
            .message(format!(
                "Linked booking {} changed: {}",
                after.id,
                lines.join("; ")
            ))
            .actions(tags);
        match self.record_change(draft).await {
            Ok(_) => report.written += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(order_id = %order.id, error = %e,
                    "propagation write failed");
            }
        }
        Ok(report)
    }

    /// Before a booking row disappears, capture a terminal record on its
    /// linked order embedding the booking's final snapshot — after deletion
    /// no further snapshot can be taken.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ActorNotFound` if the actor cannot be
    /// resolved. The write itself is best-effort and only counted.
    pub async fn propagate_booking_deletion(
        &self,
        final_snapshot: &BookingSnapshot,
        actor_id: &str,
    ) -> Result<PropagationReport, DatabaseError> {
        self.resolve_actor(actor_id).await?;

        let Some(order) = final_snapshot.linked_order.as_ref() else {
            return Ok(PropagationReport::default());
        };

        let mut report = PropagationReport::default();
        let draft = ChangeDraft::new(EntityType::Order, actor_id)
            .entity_id(order.id.clone())
            .message(format!(
                "Linked booking {} deleted; final state captured",
                final_snapshot.id
            ))
            .before(EntitySnapshot::Booking(final_snapshot.clone()))
            .actions(vec![ActionTag::DeleteBooking]);
        match self.record_change(draft).await {
            Ok(_) => report.written += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(order_id = %order.id, error = %e,
                    "propagation write failed");
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::query::ChangeLogFilter;
    use crate::test_support::helpers::{
        seed_booking, seed_location, seed_order, seed_user, test_service,
    };
    use tally_core::enums::{BookingStatus, UserRole};

    fn booking_snapshot(id: &str, status: BookingStatus) -> BookingSnapshot {
        BookingSnapshot {
            id: id.into(),
            status,
            scheduled_at: None,
            created_at: chrono::Utc::now(),
            client: None,
            manager: None,
            department: None,
            location: None,
            linked_order: None,
        }
    }

    #[tokio::test]
    async fn location_change_fans_out_two_hops_and_stops() {
        let svc = test_service().await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, None).await;
        seed_location(&svc, "loc-1", "Main Hall", "A1").await;
        seed_booking(&svc, "bkg-1", Some("loc-1")).await;
        seed_booking(&svc, "bkg-2", Some("loc-1")).await;
        seed_user(&svc, "usr-c", "Client", UserRole::Client, None).await;
        // Only bkg-1 has a linked order.
        seed_order(&svc, "ord-1", "usr-c", None, Some("bkg-1"), 5_000).await;

        let report = svc
            .propagate_location_change("loc-1", "A1", "A2", "usr-1")
            .await
            .unwrap();
        assert_eq!(report.written, 3);
        assert_eq!(report.failed, 0);

        // Two booking-level records.
        let bookings = svc
            .list_changes(&ChangeLogFilter {
                action: Some(ActionTag::ChangeLocation),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(bookings.total, 3);
        let order_records: Vec<_> = bookings
            .records
            .iter()
            .filter(|r| r.entity_type == EntityType::Order)
            .collect();
        assert_eq!(order_records.len(), 1);
        assert_eq!(order_records[0].entity_id.as_deref(), Some("ord-1"));
        assert!(
            order_records[0]
                .message
                .as_deref()
                .unwrap()
                .contains("A1 -> A2")
        );
    }

    #[tokio::test]
    async fn booking_change_writes_watched_field_summary() {
        let svc = test_service().await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, None).await;

        let mut before = booking_snapshot("bkg-1", BookingStatus::Pending);
        before.linked_order = Some(tally_core::snapshots::OrderBrief {
            id: "ord-1".into(),
            status: tally_core::enums::OrderStatus::Pending,
            total_cents: 5_000,
        });
        let mut after = before.clone();
        after.status = BookingStatus::Confirmed;

        let report = svc
            .propagate_booking_change(&before, &after, "usr-1")
            .await
            .unwrap();
        assert_eq!(report.written, 1);

        let page = svc.list_changes(&ChangeLogFilter::default()).await.unwrap();
        assert_eq!(page.records.len(), 1);
        let record = &page.records[0];
        assert_eq!(record.entity_type, EntityType::Order);
        assert_eq!(record.actions, vec![ActionTag::ChangeStatus]);
        assert!(
            record
                .message
                .as_deref()
                .unwrap()
                .contains("status: pending -> confirmed")
        );
    }

    #[tokio::test]
    async fn booking_change_without_watched_diff_is_a_noop() {
        let svc = test_service().await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, None).await;

        let mut before = booking_snapshot("bkg-1", BookingStatus::Pending);
        before.linked_order = Some(tally_core::snapshots::OrderBrief {
            id: "ord-1".into(),
            status: tally_core::enums::OrderStatus::Pending,
            total_cents: 5_000,
        });
        // Client changes are not watched for order propagation.
        let mut after = before.clone();
        after.client = Some(tally_core::snapshots::UserBrief {
            id: "usr-9".into(),
            name: "New Client".into(),
            role: UserRole::Client,
            status: tally_core::enums::UserStatus::Active,
            department_id: None,
        });

        let report = svc
            .propagate_booking_change(&before, &after, "usr-1")
            .await
            .unwrap();
        assert_eq!(report.written, 0);
        let page = svc.list_changes(&ChangeLogFilter::default()).await.unwrap();
        assert!(page.records.is_empty());
    }

    #[tokio::test]
    async fn booking_change_without_linked_order_is_a_noop() {
        let svc = test_service().await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, None).await;

        let before = booking_snapshot("bkg-1", BookingStatus::Pending);
        let after = booking_snapshot("bkg-1", BookingStatus::Confirmed);

        let report = svc
            .propagate_booking_change(&before, &after, "usr-1")
            .await
            .unwrap();
        assert_eq!(report.written, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn booking_deletion_embeds_final_state_on_order() {
        let svc = test_service().await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Admin, None).await;

        let mut final_snapshot = booking_snapshot("bkg-1", BookingStatus::Cancelled);
        final_snapshot.linked_order = Some(tally_core::snapshots::OrderBrief {
            id: "ord-1".into(),
            status: tally_core::enums::OrderStatus::Pending,
            total_cents: 5_000,
        });

        let report = svc
            .propagate_booking_deletion(&final_snapshot, "usr-1")
            .await
            .unwrap();
        assert_eq!(report.written, 1);

        let page = svc.list_changes(&ChangeLogFilter::default()).await.unwrap();
        let record = &page.records[0];
        assert_eq!(record.entity_type, EntityType::Order);
        assert_eq!(record.actions, vec![ActionTag::DeleteBooking]);
        match record.before.as_ref().unwrap() {
            EntitySnapshot::Booking(snap) => {
                assert_eq!(snap.id, "bkg-1");
                assert_eq!(snap.status, BookingStatus::Cancelled);
            }
            other => panic!("expected embedded booking snapshot, got {other:?}"),
        }
        assert!(record.after.is_none());
    }

    #[tokio::test]
    async fn unresolvable_actor_writes_nothing() {
        let svc = test_service().await;
        seed_location(&svc, "loc-1", "Main Hall", "A1").await;
        seed_booking(&svc, "bkg-1", Some("loc-1")).await;

        let result = svc
            .propagate_location_change("loc-1", "A1", "A2", "usr-ghost")
            .await;
        assert!(matches!(result, Err(DatabaseError::ActorNotFound(_))));

        let mut rows = svc
            .db()
            .conn()
            .query("SELECT COUNT(*) FROM change_log", ())
            .await
            .unwrap();
        assert_eq!(rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap(), 0);
    }

    // --- watched_booking_changes (pure) ---

    #[test]
    fn watched_diff_covers_all_three_fields() {
        let mut before = booking_snapshot("bkg-1", BookingStatus::Pending);
        before.manager = Some(tally_core::snapshots::UserBrief {
            id: "usr-m1".into(),
            name: "Ana".into(),
            role: UserRole::Manager,
            status: tally_core::enums::UserStatus::Active,
            department_id: None,
        });
        let mut after = booking_snapshot("bkg-1", BookingStatus::Confirmed);
        after.scheduled_at = Some(chrono::Utc::now());
        after.manager = Some(tally_core::snapshots::UserBrief {
            id: "usr-m2".into(),
            name: "Boris".into(),
            role: UserRole::Manager,
            status: tally_core::enums::UserStatus::Active,
            department_id: None,
        });

        let (tags, lines) = watched_booking_changes(&before, &after);
        assert_eq!(
            tags,
            vec![
                ActionTag::ChangeStatus,
                ActionTag::ChangeDate,
                ActionTag::ChangeManager
            ]
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("scheduled date: unscheduled -> "));
        assert_eq!(lines[2], "manager: Ana -> Boris");
    }

    #[test]
    fn watched_diff_is_empty_for_identical_snapshots() {
        let snap = booking_snapshot("bkg-1", BookingStatus::Pending);
        let (tags, lines) = watched_booking_changes(&snap, &snap.clone());
        assert!(tags.is_empty());
        assert!(lines.is_empty());
    }
}
