//! Row-to-type parsing helpers.
//!
//! Every repo needs to convert `libsql::Row` (column-indexed) into typed
//! structs. These helpers isolate the parsing logic and handle the dual
//! datetime format issue (`SQLite`'s `datetime('now')` vs Rust's
//! `to_rfc3339()`).

use chrono::{DateTime, Utc};

use tally_core::enums::{ActionTag, EntityType};
use tally_core::snapshots::EntitySnapshot;

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2025-09-01T12:00:00+00:00"`) and `SQLite`'s
/// default format (`"2025-09-01 12:00:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all tally-core enums that use `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
/// You must use `get::<Option<String>>()` for nullable columns.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Parse a nullable JSON TEXT column into a typed snapshot.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string is not a valid
/// snapshot document.
pub fn parse_optional_snapshot(
    s: Option<&str>,
) -> Result<Option<EntitySnapshot>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => {
            let snap = serde_json::from_str(s)
                .map_err(|e| DatabaseError::Query(format!("Invalid snapshot JSON: {e}")))?;
            Ok(Some(snap))
        }
        _ => Ok(None),
    }
}

/// Parse a nullable JSON TEXT column into an action tag list.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string is not a valid
/// JSON array of tags.
pub fn parse_optional_actions(
    s: Option<&str>,
) -> Result<Option<Vec<ActionTag>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => {
            let actions = serde_json::from_str(s)
                .map_err(|e| DatabaseError::Query(format!("Invalid actions JSON: {e}")))?;
            Ok(Some(actions))
        }
        _ => Ok(None),
    }
}

/// Map `EntityType` to the corresponding business table name.
///
/// Uses exhaustive match — adding a new `EntityType` variant forces updating this.
#[must_use]
pub const fn entity_type_to_table(entity: EntityType) -> &'static str {
    match entity {
        EntityType::User => "users",
        EntityType::Department => "departments",
        EntityType::Product => "products",
        EntityType::Order => "orders",
        EntityType::Booking => "bookings",
        EntityType::BookingDepartment => "booking_departments",
        EntityType::ServiceKit => "service_kits",
    }
}

/// Whether records for this entity type are dual-written to the legacy
/// ledger. Only the four first-class entity types are; the canonical
/// ledger remains authoritative for all of them.
#[must_use]
pub const fn writes_legacy_ledger(entity: EntityType) -> bool {
    matches!(
        entity,
        EntityType::User | EntityType::Department | EntityType::Product | EntityType::Order
    )
}
