//! Entity types, action tags, and business status enums for Tally.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and provide `as_str()` matching the SQL/JSON spelling.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Type of auditable entity, used to discriminate snapshot shapes and
/// ledger rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Department,
    Product,
    Order,
    Booking,
    BookingDepartment,
    ServiceKit,
}

impl EntityType {
    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Department => "department",
            Self::Product => "product",
            Self::Order => "order",
            Self::Booking => "booking",
            Self::BookingDepartment => "booking_department",
            Self::ServiceKit => "service_kit",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActionTag
// ---------------------------------------------------------------------------

/// Semantic label describing the nature of a recorded change.
///
/// Creation and deletion carry entity-specific spellings (`create_department`,
/// `delete_user`, …); field-level diffs carry dedicated tags; `update` is the
/// generic fallback when two snapshots differ but no dedicated tag fires.
/// Multiple tags can co-occur on one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionTag {
    CreateUser,
    CreateDepartment,
    CreateProduct,
    CreateOrder,
    CreateBooking,
    CreateBookingDepartment,
    CreateServiceKit,
    DeleteUser,
    DeleteDepartment,
    DeleteProduct,
    DeleteOrder,
    DeleteBooking,
    DeleteBookingDepartment,
    DeleteServiceKit,
    ChangeName,
    ChangeStatus,
    ChangeRole,
    ChangeDepartment,
    ChangePrice,
    ChangeCategory,
    ChangeCategories,
    ChangeFilters,
    ChangeManager,
    ChangeDate,
    ChangeLocation,
    ChangeItems,
    AddEmployees,
    RemoveEmployees,
    Update,
}

impl ActionTag {
    /// The creation tag for the given entity type.
    #[must_use]
    pub const fn create_for(entity: EntityType) -> Self {
        match entity {
            EntityType::User => Self::CreateUser,
            EntityType::Department => Self::CreateDepartment,
            EntityType::Product => Self::CreateProduct,
            EntityType::Order => Self::CreateOrder,
            EntityType::Booking => Self::CreateBooking,
            EntityType::BookingDepartment => Self::CreateBookingDepartment,
            EntityType::ServiceKit => Self::CreateServiceKit,
        }
    }

    /// The deletion tag for the given entity type.
    #[must_use]
    pub const fn delete_for(entity: EntityType) -> Self {
        match entity {
            EntityType::User => Self::DeleteUser,
            EntityType::Department => Self::DeleteDepartment,
            EntityType::Product => Self::DeleteProduct,
            EntityType::Order => Self::DeleteOrder,
            EntityType::Booking => Self::DeleteBooking,
            EntityType::BookingDepartment => Self::DeleteBookingDepartment,
            EntityType::ServiceKit => Self::DeleteServiceKit,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateUser => "create_user",
            Self::CreateDepartment => "create_department",
            Self::CreateProduct => "create_product",
            Self::CreateOrder => "create_order",
            Self::CreateBooking => "create_booking",
            Self::CreateBookingDepartment => "create_booking_department",
            Self::CreateServiceKit => "create_service_kit",
            Self::DeleteUser => "delete_user",
            Self::DeleteDepartment => "delete_department",
            Self::DeleteProduct => "delete_product",
            Self::DeleteOrder => "delete_order",
            Self::DeleteBooking => "delete_booking",
            Self::DeleteBookingDepartment => "delete_booking_department",
            Self::DeleteServiceKit => "delete_service_kit",
            Self::ChangeName => "change_name",
            Self::ChangeStatus => "change_status",
            Self::ChangeRole => "change_role",
            Self::ChangeDepartment => "change_department",
            Self::ChangePrice => "change_price",
            Self::ChangeCategory => "change_category",
            Self::ChangeCategories => "change_categories",
            Self::ChangeFilters => "change_filters",
            Self::ChangeManager => "change_manager",
            Self::ChangeDate => "change_date",
            Self::ChangeLocation => "change_location",
            Self::ChangeItems => "change_items",
            Self::AddEmployees => "add_employees",
            Self::RemoveEmployees => "remove_employees",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UserRole
// ---------------------------------------------------------------------------

/// Role of a user within the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Employee,
    Client,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Employee => "employee",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UserStatus
// ---------------------------------------------------------------------------

/// Account status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Blocked,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DepartmentStatus
// ---------------------------------------------------------------------------

/// Status of a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentStatus {
    Active,
    Archived,
}

impl DepartmentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for DepartmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProductStatus
// ---------------------------------------------------------------------------

/// Catalog status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Hidden,
    Discontinued,
}

impl ProductStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Hidden => "hidden",
            Self::Discontinued => "discontinued",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BookingStatus
// ---------------------------------------------------------------------------

/// Scheduling status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
