//! Department snapshot and its field diff.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::classify::FieldDiff;
use crate::enums::{ActionTag, DepartmentStatus};

use super::briefs::{OrderBrief, ProductBrief, UserBrief};

/// A department at one instant: scalars, full member list, product and order
/// summaries, the allowed-category id set, and derived aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DepartmentSnapshot {
    pub id: String,
    pub name: String,
    pub status: DepartmentStatus,
    pub created_at: DateTime<Utc>,
    /// Every member user, with their current department back-reference.
    pub users: Vec<UserBrief>,
    pub products: Vec<ProductBrief>,
    pub orders: Vec<OrderBrief>,
    /// Allowed category ids, stored sorted.
    pub category_ids: Vec<String>,
    pub user_count: u32,
    pub active_user_count: u32,
}

impl FieldDiff for DepartmentSnapshot {
    fn diff_into(&self, after: &Self, tags: &mut Vec<ActionTag>) {
        if self.name != after.name {
            tags.push(ActionTag::ChangeName);
        }
        if self.status != after.status {
            tags.push(ActionTag::ChangeStatus);
        }

        // Allowed categories compare as sets regardless of stored order.
        let before_cats: BTreeSet<&str> = self.category_ids.iter().map(String::as_str).collect();
        let after_cats: BTreeSet<&str> = after.category_ids.iter().map(String::as_str).collect();
        if before_cats != after_cats {
            tags.push(ActionTag::ChangeCategories);
        }

        // Membership splits into added and removed id sets; both may fire on
        // a net reshuffle.
        let before_users: BTreeSet<&str> = self.users.iter().map(|u| u.id.as_str()).collect();
        let after_users: BTreeSet<&str> = after.users.iter().map(|u| u.id.as_str()).collect();
        if after_users.difference(&before_users).next().is_some() {
            tags.push(ActionTag::AddEmployees);
        }
        if before_users.difference(&after_users).next().is_some() {
            tags.push(ActionTag::RemoveEmployees);
        }
    }
}
