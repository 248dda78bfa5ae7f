//! Service kit snapshot and its field diff.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::classify::FieldDiff;
use crate::enums::ActionTag;

use super::briefs::{DepartmentBrief, KitItemBrief};

/// A bundled set of services offered by a department.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ServiceKitSnapshot {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub department: Option<DepartmentBrief>,
    pub items: Vec<KitItemBrief>,
}

impl FieldDiff for ServiceKitSnapshot {
    fn diff_into(&self, after: &Self, tags: &mut Vec<ActionTag>) {
        if self.name != after.name {
            tags.push(ActionTag::ChangeName);
        }
        let before_items: BTreeSet<&str> = self.items.iter().map(|i| i.id.as_str()).collect();
        let after_items: BTreeSet<&str> = after.items.iter().map(|i| i.id.as_str()).collect();
        if before_items != after_items {
            tags.push(ActionTag::ChangeItems);
        }
    }
}
