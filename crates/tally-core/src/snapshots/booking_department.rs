//! Booking/department assignment snapshot and its field diff.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classify::FieldDiff;
use crate::enums::ActionTag;

use super::briefs::DepartmentBrief;

/// The assignment of a department to service a booking.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BookingDepartmentSnapshot {
    pub id: String,
    pub booking_id: String,
    pub department: DepartmentBrief,
    pub created_at: DateTime<Utc>,
}

impl FieldDiff for BookingDepartmentSnapshot {
    fn diff_into(&self, after: &Self, tags: &mut Vec<ActionTag>) {
        if self.department.id != after.department.id {
            tags.push(ActionTag::ChangeDepartment);
        }
    }
}
