//! Order snapshot and its field diff.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::classify::FieldDiff;
use crate::enums::{ActionTag, OrderStatus};

use super::briefs::{BookingBrief, DepartmentBrief, OrderItemBrief, UserBrief};

/// An order at one instant, with every foreign key resolved.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub client: Option<UserBrief>,
    pub manager: Option<UserBrief>,
    pub department: Option<DepartmentBrief>,
    /// The booking this order was placed from, if any.
    pub booking: Option<BookingBrief>,
    pub items: Vec<OrderItemBrief>,
}

impl FieldDiff for OrderSnapshot {
    fn diff_into(&self, after: &Self, tags: &mut Vec<ActionTag>) {
        if self.status != after.status {
            tags.push(ActionTag::ChangeStatus);
        }
        let before_mgr = self.manager.as_ref().map(|u| u.id.as_str());
        let after_mgr = after.manager.as_ref().map(|u| u.id.as_str());
        if before_mgr != after_mgr {
            tags.push(ActionTag::ChangeManager);
        }
        let before_items: BTreeSet<&str> = self.items.iter().map(|i| i.id.as_str()).collect();
        let after_items: BTreeSet<&str> = after.items.iter().map(|i| i.id.as_str()).collect();
        if before_items != after_items {
            tags.push(ActionTag::ChangeItems);
        }
    }
}
