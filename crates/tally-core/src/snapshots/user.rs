//! User snapshot and its field diff.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classify::FieldDiff;
use crate::enums::{ActionTag, UserRole, UserStatus};

use super::briefs::{DepartmentBrief, OrderBrief};

/// A user at one instant, with their department and order history inlined.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UserSnapshot {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub department: Option<DepartmentBrief>,
    /// Orders where this user is the client.
    pub client_orders: Vec<OrderBrief>,
    /// Orders where this user is the managing employee.
    pub managed_orders: Vec<OrderBrief>,
    /// Whole days since account creation, as of collection time.
    pub account_age_days: i64,
    pub client_order_total_cents: i64,
}

impl FieldDiff for UserSnapshot {
    fn diff_into(&self, after: &Self, tags: &mut Vec<ActionTag>) {
        if self.name != after.name {
            tags.push(ActionTag::ChangeName);
        }
        if self.role != after.role {
            tags.push(ActionTag::ChangeRole);
        }
        if self.status != after.status {
            tags.push(ActionTag::ChangeStatus);
        }
        let before_dep = self.department.as_ref().map(|d| d.id.as_str());
        let after_dep = after.department.as_ref().map(|d| d.id.as_str());
        if before_dep != after_dep {
            tags.push(ActionTag::ChangeDepartment);
        }
    }
}
