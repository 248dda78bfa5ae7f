//! # tally-core
//!
//! Core types for the Tally back-office change log.
//!
//! This crate provides the foundational types shared across all Tally crates:
//! - Snapshot schemas for every auditable entity (a tagged union keyed by
//!   entity type, each variant a concrete struct)
//! - The `ChangeRecord` ledger row and the frozen `ActorSnapshot`
//! - Entity-type, action-tag, and business-status enums
//! - The pure action classifier shared by the write and read paths
//! - ID prefix constants
//! - Cross-cutting error types
//! - Read-side view types

pub mod classify;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod record;
pub mod snapshots;
pub mod views;
