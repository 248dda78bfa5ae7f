//! Snapshot collector — materializes point-in-time entity copies.
//!
//! Given an entity type and id, produces a plain-data tree with every
//! relation a reviewer or the classifier needs. The result is safe to
//! serialize and store: no handle, cursor, or lazy reference survives the
//! call. A vanished entity yields `Ok(None)` — "no snapshot" is distinct
//! from "found but empty".

use chrono::Utc;

use tally_core::enums::{EntityType, UserStatus};
use tally_core::snapshots::{
    BookingBrief, BookingDepartmentSnapshot, BookingSnapshot, CategoryBrief, DepartmentBrief,
    DepartmentSnapshot, EntitySnapshot, FilterValueBrief, KitItemBrief, LocationBrief, OrderBrief,
    OrderItemBrief, OrderSnapshot, ProductBrief, ProductSnapshot, ServiceKitSnapshot, UserBrief,
    UserSnapshot,
};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_datetime};
use crate::service::TallyService;

fn row_to_user_brief(row: &libsql::Row) -> Result<UserBrief, DatabaseError> {
    Ok(UserBrief {
        id: row.get(0)?,
        name: row.get(1)?,
        role: parse_enum(&row.get::<String>(2)?)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        department_id: get_opt_string(row, 4)?,
    })
}

fn row_to_order_brief(row: &libsql::Row) -> Result<OrderBrief, DatabaseError> {
    Ok(OrderBrief {
        id: row.get(0)?,
        status: parse_enum(&row.get::<String>(1)?)?,
        total_cents: row.get(2)?,
    })
}

impl TallyService {
    /// Materialize a snapshot of the given entity, or `None` if it no
    /// longer exists.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure. A missing entity is not
    /// an error.
    pub async fn collect_snapshot(
        &self,
        entity: EntityType,
        id: &str,
    ) -> Result<Option<EntitySnapshot>, DatabaseError> {
        let snapshot = match entity {
            EntityType::User => self.collect_user(id).await?.map(EntitySnapshot::User),
            EntityType::Department => self
                .collect_department(id)
                .await?
                .map(EntitySnapshot::Department),
            EntityType::Product => self.collect_product(id).await?.map(EntitySnapshot::Product),
            EntityType::Order => self.collect_order(id).await?.map(EntitySnapshot::Order),
            EntityType::Booking => self.collect_booking(id).await?.map(EntitySnapshot::Booking),
            EntityType::BookingDepartment => self
                .collect_booking_department(id)
                .await?
                .map(EntitySnapshot::BookingDepartment),
            EntityType::ServiceKit => self
                .collect_service_kit(id)
                .await?
                .map(EntitySnapshot::ServiceKit),
        };
        Ok(snapshot)
    }

    /// Department: scalars + full member list + product/order summaries +
    /// allowed-category set + derived aggregates.
    pub async fn collect_department(
        &self,
        id: &str,
    ) -> Result<Option<DepartmentSnapshot>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, status, created_at FROM departments WHERE id = ?1",
                [id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let dep_id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let status = parse_enum(&row.get::<String>(2)?)?;
        let created_at = parse_datetime(&row.get::<String>(3)?)?;

        let mut users = Vec::new();
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, role, status, department_id FROM users
                 WHERE department_id = ?1 ORDER BY id",
                [id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            users.push(row_to_user_brief(&row)?);
        }

        let mut products = Vec::new();
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, price_cents FROM products WHERE department_id = ?1 ORDER BY id",
                [id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            products.push(ProductBrief {
                id: row.get(0)?,
                name: row.get(1)?,
                price_cents: row.get(2)?,
            });
        }

        let mut orders = Vec::new();
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, status, total_cents FROM orders WHERE department_id = ?1 ORDER BY id",
                [id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            orders.push(row_to_order_brief(&row)?);
        }

        let mut category_ids = Vec::new();
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT category_id FROM department_categories
                 WHERE department_id = ?1 ORDER BY category_id",
                [id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            category_ids.push(row.get(0)?);
        }

        let user_count = users.len() as u32;
        let active_user_count = users
            .iter()
            .filter(|u| u.status == UserStatus::Active)
            .count() as u32;

        Ok(Some(DepartmentSnapshot {
            id: dep_id,
            name,
            status,
            created_at,
            users,
            products,
            orders,
            category_ids,
            user_count,
            active_user_count,
        }))
    }

    /// User: scalars + department + both order roles + derived aggregates.
    pub async fn collect_user(&self, id: &str) -> Result<Option<UserSnapshot>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, phone, role, status, department_id, created_at
                 FROM users WHERE id = ?1",
                [id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let user_id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let phone = get_opt_string(&row, 2)?;
        let role = parse_enum(&row.get::<String>(3)?)?;
        let status = parse_enum(&row.get::<String>(4)?)?;
        let department_id = get_opt_string(&row, 5)?;
        let created_at = parse_datetime(&row.get::<String>(6)?)?;

        let department = match department_id {
            Some(dep_id) => self.department_brief(&dep_id).await?,
            None => None,
        };

        let client_orders = self.order_briefs_for("client_id", id).await?;
        let managed_orders = self.order_briefs_for("manager_id", id).await?;

        let account_age_days = (Utc::now() - created_at).num_days();
        let client_order_total_cents = client_orders.iter().map(|o| o.total_cents).sum();

        Ok(Some(UserSnapshot {
            id: user_id,
            name,
            phone,
            role,
            status,
            created_at,
            department,
            client_orders,
            managed_orders,
            account_age_days,
            client_order_total_cents,
        }))
    }

    /// Product: scalars + category + department + resolved filter values.
    pub async fn collect_product(
        &self,
        id: &str,
    ) -> Result<Option<ProductSnapshot>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, price_cents, status, category_id, department_id, created_at
                 FROM products WHERE id = ?1",
                [id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let product_id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let price_cents: i64 = row.get(2)?;
        let status = parse_enum(&row.get::<String>(3)?)?;
        let category_id = get_opt_string(&row, 4)?;
        let department_id = get_opt_string(&row, 5)?;
        let created_at = parse_datetime(&row.get::<String>(6)?)?;

        let category = match category_id {
            Some(cat_id) => {
                let mut rows = self
                    .db()
                    .conn()
                    .query("SELECT id, name FROM categories WHERE id = ?1", [cat_id])
                    .await?;
                match rows.next().await? {
                    Some(row) => Some(CategoryBrief {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    }),
                    None => None,
                }
            }
            None => None,
        };

        let department = match department_id {
            Some(dep_id) => self.department_brief(&dep_id).await?,
            None => None,
        };

        let mut filter_values = Vec::new();
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT fv.id, f.name, fv.value
                 FROM product_filter_values pfv
                 JOIN filter_values fv ON fv.id = pfv.filter_value_id
                 JOIN filters f ON f.id = fv.filter_id
                 WHERE pfv.product_id = ?1 ORDER BY fv.id",
                [id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            filter_values.push(FilterValueBrief {
                id: row.get(0)?,
                filter: row.get(1)?,
                value: row.get(2)?,
            });
        }

        Ok(Some(ProductSnapshot {
            id: product_id,
            name,
            price_cents,
            status,
            created_at,
            category,
            department,
            filter_values,
        }))
    }

    /// Order: scalars + client/manager/department + linked booking + items.
    pub async fn collect_order(&self, id: &str) -> Result<Option<OrderSnapshot>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, status, total_cents, client_id, manager_id, department_id, booking_id, created_at
                 FROM orders WHERE id = ?1",
                [id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let order_id: String = row.get(0)?;
        let status = parse_enum(&row.get::<String>(1)?)?;
        let total_cents: i64 = row.get(2)?;
        let client_id = get_opt_string(&row, 3)?;
        let manager_id = get_opt_string(&row, 4)?;
        let department_id = get_opt_string(&row, 5)?;
        let booking_id = get_opt_string(&row, 6)?;
        let created_at = parse_datetime(&row.get::<String>(7)?)?;

        let client = match client_id {
            Some(uid) => self.user_brief(&uid).await?,
            None => None,
        };
        let manager = match manager_id {
            Some(uid) => self.user_brief(&uid).await?,
            None => None,
        };
        let department = match department_id {
            Some(dep_id) => self.department_brief(&dep_id).await?,
            None => None,
        };

        let booking = match booking_id {
            Some(bkg_id) => {
                let mut rows = self
                    .db()
                    .conn()
                    .query(
                        "SELECT id, status, scheduled_at FROM bookings WHERE id = ?1",
                        [bkg_id],
                    )
                    .await?;
                match rows.next().await? {
                    Some(row) => Some(BookingBrief {
                        id: row.get(0)?,
                        status: parse_enum(&row.get::<String>(1)?)?,
                        scheduled_at: parse_optional_datetime(
                            get_opt_string(&row, 2)?.as_deref(),
                        )?,
                    }),
                    None => None,
                }
            }
            None => None,
        };

        let mut items = Vec::new();
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, product_id, name, quantity, price_cents
                 FROM order_items WHERE order_id = ?1 ORDER BY id",
                [id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            items.push(OrderItemBrief {
                id: row.get(0)?,
                product_id: get_opt_string(&row, 1)?,
                name: row.get(2)?,
                quantity: row.get::<i64>(3)? as u32,
                price_cents: row.get(4)?,
            });
        }

        Ok(Some(OrderSnapshot {
            id: order_id,
            status,
            total_cents,
            created_at,
            client,
            manager,
            department,
            booking,
            items,
        }))
    }

    /// Booking: scalars + client/manager/department + location + linked order.
    pub async fn collect_booking(
        &self,
        id: &str,
    ) -> Result<Option<BookingSnapshot>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, status, scheduled_at, client_id, manager_id, department_id, location_id, created_at
                 FROM bookings WHERE id = ?1",
                [id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let booking_id: String = row.get(0)?;
        let status = parse_enum(&row.get::<String>(1)?)?;
        let scheduled_at = parse_optional_datetime(get_opt_string(&row, 2)?.as_deref())?;
        let client_id = get_opt_string(&row, 3)?;
        let manager_id = get_opt_string(&row, 4)?;
        let department_id = get_opt_string(&row, 5)?;
        let location_id = get_opt_string(&row, 6)?;
        let created_at = parse_datetime(&row.get::<String>(7)?)?;

        let client = match client_id {
            Some(uid) => self.user_brief(&uid).await?,
            None => None,
        };
        let manager = match manager_id {
            Some(uid) => self.user_brief(&uid).await?,
            None => None,
        };
        let department = match department_id {
            Some(dep_id) => self.department_brief(&dep_id).await?,
            None => None,
        };

        let location = match location_id {
            Some(loc_id) => {
                let mut rows = self
                    .db()
                    .conn()
                    .query(
                        "SELECT id, name, address FROM locations WHERE id = ?1",
                        [loc_id],
                    )
                    .await?;
                match rows.next().await? {
                    Some(row) => Some(LocationBrief {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        address: row.get(2)?,
                    }),
                    None => None,
                }
            }
            None => None,
        };

        let linked_order = {
            let mut rows = self
                .db()
                .conn()
                .query(
                    "SELECT id, status, total_cents FROM orders
                     WHERE booking_id = ?1 ORDER BY id LIMIT 1",
                    [id],
                )
                .await?;
            match rows.next().await? {
                Some(row) => Some(row_to_order_brief(&row)?),
                None => None,
            }
        };

        Ok(Some(BookingSnapshot {
            id: booking_id,
            status,
            scheduled_at,
            created_at,
            client,
            manager,
            department,
            location,
            linked_order,
        }))
    }

    /// Booking/department service assignment.
    pub async fn collect_booking_department(
        &self,
        id: &str,
    ) -> Result<Option<BookingDepartmentSnapshot>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT bd.id, bd.booking_id, bd.created_at, d.id, d.name
                 FROM booking_departments bd
                 JOIN departments d ON d.id = bd.department_id
                 WHERE bd.id = ?1",
                [id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        Ok(Some(BookingDepartmentSnapshot {
            id: row.get(0)?,
            booking_id: row.get(1)?,
            created_at: parse_datetime(&row.get::<String>(2)?)?,
            department: DepartmentBrief {
                id: row.get(3)?,
                name: row.get(4)?,
            },
        }))
    }

    /// Service kit: scalars + department + kit items.
    pub async fn collect_service_kit(
        &self,
        id: &str,
    ) -> Result<Option<ServiceKitSnapshot>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, department_id, created_at FROM service_kits WHERE id = ?1",
                [id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let kit_id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let department_id = get_opt_string(&row, 2)?;
        let created_at = parse_datetime(&row.get::<String>(3)?)?;

        let department = match department_id {
            Some(dep_id) => self.department_brief(&dep_id).await?,
            None => None,
        };

        let mut items = Vec::new();
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, price_cents FROM service_kit_items
                 WHERE kit_id = ?1 ORDER BY id",
                [id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            items.push(KitItemBrief {
                id: row.get(0)?,
                name: row.get(1)?,
                price_cents: row.get(2)?,
            });
        }

        Ok(Some(ServiceKitSnapshot {
            id: kit_id,
            name,
            created_at,
            department,
            items,
        }))
    }

    async fn department_brief(
        &self,
        id: &str,
    ) -> Result<Option<DepartmentBrief>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT id, name FROM departments WHERE id = ?1", [id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(DepartmentBrief {
                id: row.get(0)?,
                name: row.get(1)?,
            })),
            None => Ok(None),
        }
    }

    async fn user_brief(&self, id: &str) -> Result<Option<UserBrief>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, role, status, department_id FROM users WHERE id = ?1",
                [id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user_brief(&row)?)),
            None => Ok(None),
        }
    }

    async fn order_briefs_for(
        &self,
        column: &str,
        user_id: &str,
    ) -> Result<Vec<OrderBrief>, DatabaseError> {
        let mut orders = Vec::new();
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT id, status, total_cents FROM orders WHERE {column} = ?1 ORDER BY id"
                ),
                [user_id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            orders.push(row_to_order_brief(&row)?);
        }
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{
        seed_booking, seed_department, seed_location, seed_order, seed_product, seed_user,
        test_service,
    };
    use tally_core::enums::{OrderStatus, UserRole};

    #[tokio::test]
    async fn missing_entity_yields_no_snapshot() {
        let svc = test_service().await;
        let snap = svc
            .collect_snapshot(EntityType::Department, "dep-missing")
            .await
            .unwrap();
        assert!(snap.is_none());
    }

    #[tokio::test]
    async fn department_snapshot_inlines_members_and_aggregates() {
        let svc = test_service().await;
        seed_department(&svc, "dep-1", "Sales").await;
        seed_user(&svc, "usr-1", "Ana", UserRole::Manager, Some("dep-1")).await;
        seed_user(&svc, "usr-2", "Boris", UserRole::Employee, Some("dep-1")).await;
        svc.db()
            .conn()
            .execute(
                "UPDATE users SET status = 'blocked' WHERE id = 'usr-2'",
                (),
            )
            .await
            .unwrap();

        let snap = svc.collect_department("dep-1").await.unwrap().unwrap();
        assert_eq!(snap.name, "Sales");
        assert_eq!(snap.users.len(), 2);
        assert_eq!(snap.user_count, 2);
        assert_eq!(snap.active_user_count, 1);
        assert_eq!(snap.users[0].department_id.as_deref(), Some("dep-1"));
    }

    #[tokio::test]
    async fn user_snapshot_splits_order_roles() {
        let svc = test_service().await;
        seed_department(&svc, "dep-1", "Sales").await;
        seed_user(&svc, "usr-c", "Client", UserRole::Client, None).await;
        seed_user(&svc, "usr-m", "Manager", UserRole::Manager, Some("dep-1")).await;
        seed_order(&svc, "ord-1", "usr-c", Some("usr-m"), None, 5_000).await;
        seed_order(&svc, "ord-2", "usr-c", None, None, 7_000).await;

        let client = svc.collect_user("usr-c").await.unwrap().unwrap();
        assert_eq!(client.client_orders.len(), 2);
        assert!(client.managed_orders.is_empty());
        assert_eq!(client.client_order_total_cents, 12_000);

        let manager = svc.collect_user("usr-m").await.unwrap().unwrap();
        assert!(manager.client_orders.is_empty());
        assert_eq!(manager.managed_orders.len(), 1);
        assert_eq!(manager.department.as_ref().unwrap().name, "Sales");
    }

    #[tokio::test]
    async fn booking_snapshot_resolves_location_and_linked_order() {
        let svc = test_service().await;
        seed_location(&svc, "loc-1", "Main Hall", "12 Market St").await;
        seed_booking(&svc, "bkg-1", Some("loc-1")).await;
        seed_user(&svc, "usr-c", "Client", UserRole::Client, None).await;
        seed_order(&svc, "ord-1", "usr-c", None, Some("bkg-1"), 9_900).await;

        let snap = svc.collect_booking("bkg-1").await.unwrap().unwrap();
        assert_eq!(snap.location.as_ref().unwrap().address, "12 Market St");
        let linked = snap.linked_order.unwrap();
        assert_eq!(linked.id, "ord-1");
        assert_eq!(linked.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn product_snapshot_resolves_filter_assignments() {
        let svc = test_service().await;
        seed_department(&svc, "dep-1", "Sales").await;
        seed_product(&svc, "prd-1", "Standing Desk", 64_900, Some("dep-1")).await;
        svc.db()
            .conn()
            .execute("INSERT INTO filters (id, name) VALUES ('flt-1', 'color')", ())
            .await
            .unwrap();
        svc.db()
            .conn()
            .execute(
                "INSERT INTO filter_values (id, filter_id, value) VALUES ('flv-1', 'flt-1', 'oak')",
                (),
            )
            .await
            .unwrap();
        svc.db()
            .conn()
            .execute(
                "INSERT INTO product_filter_values (product_id, filter_value_id) VALUES ('prd-1', 'flv-1')",
                (),
            )
            .await
            .unwrap();

        let snap = svc.collect_product("prd-1").await.unwrap().unwrap();
        assert_eq!(snap.price_cents, 64_900);
        assert_eq!(snap.department.as_ref().unwrap().name, "Sales");
        assert_eq!(snap.filter_values.len(), 1);
        assert_eq!(snap.filter_values[0].filter, "color");
        assert_eq!(snap.filter_values[0].value, "oak");
    }

    #[tokio::test]
    async fn snapshot_is_a_value_copy() {
        let svc = test_service().await;
        seed_department(&svc, "dep-1", "Sales").await;

        let before = svc.collect_department("dep-1").await.unwrap().unwrap();
        svc.db()
            .conn()
            .execute("UPDATE departments SET name = 'Renamed' WHERE id = 'dep-1'", ())
            .await
            .unwrap();

        // The stored copy must not observe the later mutation.
        assert_eq!(before.name, "Sales");
        let after = svc.collect_department("dep-1").await.unwrap().unwrap();
        assert_eq!(after.name, "Renamed");
    }
}
