//! Reconciliation of canonical records: the initial join, master merges and
//! trade-log aggregation.

pub mod join;
pub mod merge;
pub mod trade_log;

pub use join::{build_assets, partition, Partitioned};
pub use merge::{merge_master, preserve_local_inspection, MergeOutcome};
