//! ID prefix constants.
//!
//! Every row id is `{prefix}-{8 hex chars}`, generated by
//! `TallyDb::generate_id`. Prefixes keep ids self-describing in log output
//! and in the ledger's `entity_id` column.

pub const PREFIX_CHANGE: &str = "chg";
pub const PREFIX_LEGACY: &str = "leg";
pub const PREFIX_USER: &str = "usr";
pub const PREFIX_DEPARTMENT: &str = "dep";
pub const PREFIX_PRODUCT: &str = "prd";
pub const PREFIX_ORDER: &str = "ord";
pub const PREFIX_BOOKING: &str = "bkg";
pub const PREFIX_BOOKING_DEPARTMENT: &str = "bkd";
pub const PREFIX_SERVICE_KIT: &str = "kit";
pub const PREFIX_LOCATION: &str = "loc";
pub const PREFIX_CATEGORY: &str = "cat";

/// All known prefixes, for validation and tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_CHANGE,
    PREFIX_LEGACY,
    PREFIX_USER,
    PREFIX_DEPARTMENT,
    PREFIX_PRODUCT,
    PREFIX_ORDER,
    PREFIX_BOOKING,
    PREFIX_BOOKING_DEPARTMENT,
    PREFIX_SERVICE_KIT,
    PREFIX_LOCATION,
    PREFIX_CATEGORY,
];
