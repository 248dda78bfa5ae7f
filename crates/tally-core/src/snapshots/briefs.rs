//! Relation summary types embedded inside snapshots.
//!
//! A brief carries the identifying fields of a related row — enough for a
//! reviewer to understand what the entity looked like without following
//! foreign keys back into live tables.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{BookingStatus, OrderStatus, UserRole, UserStatus};

/// Summary of a user as seen from a related entity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UserBrief {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub status: UserStatus,
    /// Back-reference to the user's current department.
    pub department_id: Option<String>,
}

/// Summary of a department.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DepartmentBrief {
    pub id: String,
    pub name: String,
}

/// Summary of a category.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CategoryBrief {
    pub id: String,
    pub name: String,
}

/// Summary of a product.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProductBrief {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
}

/// Summary of an order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct OrderBrief {
    pub id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
}

/// Summary of a booking.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BookingBrief {
    pub id: String,
    pub status: BookingStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Summary of a service location.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LocationBrief {
    pub id: String,
    pub name: String,
    pub address: String,
}

/// A resolved filter-value assignment on a product.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FilterValueBrief {
    pub id: String,
    /// The filter this value belongs to (e.g. "color").
    pub filter: String,
    pub value: String,
}

/// One line item of an order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct OrderItemBrief {
    pub id: String,
    /// Null when the product was deleted after the order was placed.
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: u32,
    pub price_cents: i64,
}

/// One line item of a service kit.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct KitItemBrief {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
}
