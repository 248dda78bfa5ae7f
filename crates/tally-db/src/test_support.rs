//! Shared test utilities for tally-db tests.

pub(crate) mod helpers {
    use tally_core::enums::{EntityType, UserRole};
    use tally_core::snapshots::EntitySnapshot;

    use crate::service::TallyService;

    /// Create an in-memory service for pure DB tests.
    pub async fn test_service() -> TallyService {
        TallyService::new_local(":memory:").await.unwrap()
    }

    pub async fn seed_department(svc: &TallyService, id: &str, name: &str) {
        svc.db()
            .conn()
            .execute(
                "INSERT INTO departments (id, name) VALUES (?1, ?2)",
                libsql::params![id, name],
            )
            .await
            .unwrap();
    }

    pub async fn seed_user(
        svc: &TallyService,
        id: &str,
        name: &str,
        role: UserRole,
        department_id: Option<&str>,
    ) {
        svc.db()
            .conn()
            .execute(
                "INSERT INTO users (id, name, role, department_id) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id, name, role.as_str(), department_id],
            )
            .await
            .unwrap();
    }

    pub async fn seed_location(svc: &TallyService, id: &str, name: &str, address: &str) {
        svc.db()
            .conn()
            .execute(
                "INSERT INTO locations (id, name, address) VALUES (?1, ?2, ?3)",
                libsql::params![id, name, address],
            )
            .await
            .unwrap();
    }

    pub async fn seed_booking(svc: &TallyService, id: &str, location_id: Option<&str>) {
        svc.db()
            .conn()
            .execute(
                "INSERT INTO bookings (id, location_id) VALUES (?1, ?2)",
                libsql::params![id, location_id],
            )
            .await
            .unwrap();
    }

    pub async fn seed_order(
        svc: &TallyService,
        id: &str,
        client_id: &str,
        manager_id: Option<&str>,
        booking_id: Option<&str>,
        total_cents: i64,
    ) {
        svc.db()
            .conn()
            .execute(
                "INSERT INTO orders (id, client_id, manager_id, booking_id, total_cents)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![id, client_id, manager_id, booking_id, total_cents],
            )
            .await
            .unwrap();
    }

    pub async fn seed_product(
        svc: &TallyService,
        id: &str,
        name: &str,
        price_cents: i64,
        department_id: Option<&str>,
    ) {
        svc.db()
            .conn()
            .execute(
                "INSERT INTO products (id, name, price_cents, department_id)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id, name, price_cents, department_id],
            )
            .await
            .unwrap();
    }

    /// Insert a ledger row the way the system wrote them before explicit
    /// tagging existed: snapshots present, `actions` NULL.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_untagged_record(
        svc: &TallyService,
        id: &str,
        entity_type: EntityType,
        entity_id: &str,
        actor_id: &str,
        before: Option<&EntitySnapshot>,
        after: Option<&EntitySnapshot>,
        created_at: &str,
    ) {
        let actor = svc.resolve_actor(actor_id).await.unwrap();
        svc.db()
            .conn()
            .execute(
                "INSERT INTO change_log
                     (id, entity_type, entity_id, actor_id, snapshot_before, snapshot_after,
                      actor_snapshot, actions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8)",
                libsql::params![
                    id,
                    entity_type.as_str(),
                    entity_id,
                    actor_id,
                    before.map(|s| serde_json::to_string(s).unwrap()).as_deref(),
                    after.map(|s| serde_json::to_string(s).unwrap()).as_deref(),
                    serde_json::to_string(&actor).unwrap().as_str(),
                    created_at
                ],
            )
            .await
            .unwrap();
    }
}
