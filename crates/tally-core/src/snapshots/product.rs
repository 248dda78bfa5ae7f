//! Product snapshot and its field diff.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::classify::FieldDiff;
use crate::enums::{ActionTag, ProductStatus};

use super::briefs::{CategoryBrief, DepartmentBrief, FilterValueBrief};

/// A product at one instant, with its category, department, and resolved
/// filter-value assignments.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub category: Option<CategoryBrief>,
    pub department: Option<DepartmentBrief>,
    /// Sorted by filter-value id.
    pub filter_values: Vec<FilterValueBrief>,
}

impl FieldDiff for ProductSnapshot {
    fn diff_into(&self, after: &Self, tags: &mut Vec<ActionTag>) {
        if self.name != after.name {
            tags.push(ActionTag::ChangeName);
        }
        if self.price_cents != after.price_cents {
            tags.push(ActionTag::ChangePrice);
        }
        if self.status != after.status {
            tags.push(ActionTag::ChangeStatus);
        }
        let before_cat = self.category.as_ref().map(|c| c.id.as_str());
        let after_cat = after.category.as_ref().map(|c| c.id.as_str());
        if before_cat != after_cat {
            tags.push(ActionTag::ChangeCategory);
        }
        let before_dep = self.department.as_ref().map(|d| d.id.as_str());
        let after_dep = after.department.as_ref().map(|d| d.id.as_str());
        if before_dep != after_dep {
            tags.push(ActionTag::ChangeDepartment);
        }
        let before_fv: BTreeSet<&str> = self.filter_values.iter().map(|f| f.id.as_str()).collect();
        let after_fv: BTreeSet<&str> = after.filter_values.iter().map(|f| f.id.as_str()).collect();
        if before_fv != after_fv {
            tags.push(ActionTag::ChangeFilters);
        }
    }
}
