//! Booking snapshot and its field diff.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classify::FieldDiff;
use crate::enums::{ActionTag, BookingStatus};

use super::briefs::{DepartmentBrief, LocationBrief, OrderBrief, UserBrief};

/// A booking at one instant, with every foreign key resolved.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BookingSnapshot {
    pub id: String,
    pub status: BookingStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub client: Option<UserBrief>,
    pub manager: Option<UserBrief>,
    pub department: Option<DepartmentBrief>,
    /// The shared service location this booking takes place at.
    pub location: Option<LocationBrief>,
    /// The order placed from this booking, if any.
    pub linked_order: Option<OrderBrief>,
}

impl FieldDiff for BookingSnapshot {
    fn diff_into(&self, after: &Self, tags: &mut Vec<ActionTag>) {
        if self.status != after.status {
            tags.push(ActionTag::ChangeStatus);
        }
        if self.scheduled_at != after.scheduled_at {
            tags.push(ActionTag::ChangeDate);
        }
        let before_mgr = self.manager.as_ref().map(|u| u.id.as_str());
        let after_mgr = after.manager.as_ref().map(|u| u.id.as_str());
        if before_mgr != after_mgr {
            tags.push(ActionTag::ChangeManager);
        }
        let before_loc = self.location.as_ref().map(|l| l.id.as_str());
        let after_loc = after.location.as_ref().map(|l| l.id.as_str());
        if before_loc != after_loc {
            tags.push(ActionTag::ChangeLocation);
        }
    }
}
