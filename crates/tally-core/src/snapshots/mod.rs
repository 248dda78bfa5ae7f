//! Snapshot schemas for all auditable entities.
//!
//! A snapshot is a fully materialized, reference-free copy of an entity plus
//! its immediate relations at one instant. The union is internally tagged by
//! `entity_type`, so stored JSON stays self-describing and each variant keeps
//! a concrete schema. All structs derive `Serialize`, `Deserialize`, and
//! `JsonSchema` for JSON roundtrip and schema validation.

mod booking;
mod booking_department;
mod briefs;
mod department;
mod order;
mod product;
mod service_kit;
mod user;

pub use booking::BookingSnapshot;
pub use booking_department::BookingDepartmentSnapshot;
pub use briefs::{
    BookingBrief, CategoryBrief, DepartmentBrief, FilterValueBrief, KitItemBrief, LocationBrief,
    OrderBrief, OrderItemBrief, ProductBrief, UserBrief,
};
pub use department::DepartmentSnapshot;
pub use order::OrderSnapshot;
pub use product::ProductSnapshot;
pub use service_kit::ServiceKitSnapshot;
pub use user::UserSnapshot;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EntityType;

/// A point-in-time copy of one entity, tagged by its type.
///
/// Snapshots are value copies: mutating the live entity after collection
/// never alters a stored snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
pub enum EntitySnapshot {
    User(UserSnapshot),
    Department(DepartmentSnapshot),
    Product(ProductSnapshot),
    Order(OrderSnapshot),
    Booking(BookingSnapshot),
    BookingDepartment(BookingDepartmentSnapshot),
    ServiceKit(ServiceKitSnapshot),
}

impl EntitySnapshot {
    /// The entity type this snapshot describes.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::User(_) => EntityType::User,
            Self::Department(_) => EntityType::Department,
            Self::Product(_) => EntityType::Product,
            Self::Order(_) => EntityType::Order,
            Self::Booking(_) => EntityType::Booking,
            Self::BookingDepartment(_) => EntityType::BookingDepartment,
            Self::ServiceKit(_) => EntityType::ServiceKit,
        }
    }

    /// The snapshotted entity's own id.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        match self {
            Self::User(s) => &s.id,
            Self::Department(s) => &s.id,
            Self::Product(s) => &s.id,
            Self::Order(s) => &s.id,
            Self::Booking(s) => &s.id,
            Self::BookingDepartment(s) => &s.id,
            Self::ServiceKit(s) => &s.id,
        }
    }

    /// A human-oriented identifying string, used by the read-side target
    /// text filter. Orders and assignments have no name of their own, so
    /// their id stands in.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::User(s) => &s.name,
            Self::Department(s) => &s.name,
            Self::Product(s) => &s.name,
            Self::ServiceKit(s) => &s.name,
            Self::Order(s) => &s.id,
            Self::Booking(s) => &s.id,
            Self::BookingDepartment(s) => &s.id,
        }
    }
}
