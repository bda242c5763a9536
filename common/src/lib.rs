//! Shared types and the reconciliation engine for asset inspection rounds.
//!
//! - `model`: canonical entities (assets, users, trade-log entries, sessions) and
//!   the raw records they are built from.
//! - `schema`: the weak-schema layer. Column alias resolution, sheet
//!   classification and the row/record codec.
//! - `reconcile`: joining, deduplication, master merges and trade-log
//!   aggregation over canonical records.
//! - `jobs` / `requests`: status enums and request payloads exchanged with the
//!   backend's HTTP surface.

pub mod jobs;
pub mod model;
pub mod reconcile;
pub mod requests;
pub mod schema;
