//! The working copy of one inspection round.

use crate::model::{Asset, InspectionStatus, RawRecord, RelationTag};
use crate::schema::AliasRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A spreadsheet in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: usize,
    pub done: usize,
    pub percent: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderStats {
    pub done: usize,
    pub total: usize,
}

/// The active inspection round.
///
/// Owns the asset set and the ordered list of asset numbers scanned during
/// this round (most recent last, no duplicates). `dirty` is set by every
/// write-triggering mutation and cleared only once a save has been confirmed.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub file: Option<RemoteFile>,
    pub assets: Vec<Asset>,
    pub scanned_ids: Vec<String>,
    pub dirty: bool,
    pub last_master_sync: Option<DateTime<Utc>>,
    next_edit_order: u64,
}

impl Session {
    pub fn new(file: Option<RemoteFile>, assets: Vec<Asset>, scanned_ids: Vec<String>) -> Self {
        let mut session = Self {
            file,
            scanned_ids,
            ..Self::default()
        };
        session.replace_assets(assets);
        session
    }

    /// Swaps in a new asset set in one step.
    pub fn replace_assets(&mut self, assets: Vec<Asset>) {
        let max_order = assets.iter().map(|a| a.edit_order).max().unwrap_or(0);
        self.next_edit_order = self.next_edit_order.max(max_order + 1);
        self.assets = assets;
    }

    pub fn asset(&self, asset_number: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.asset_number == asset_number)
    }

    fn asset_mut(&mut self, asset_number: &str) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| a.asset_number == asset_number)
    }

    fn touch_scanned(&mut self, asset_number: &str) {
        self.scanned_ids.retain(|id| id != asset_number);
        self.scanned_ids.push(asset_number.to_string());
    }

    /// Marks an asset as checked at `inspected_at` and moves it to the tail of
    /// the scanned list. Returns `false` when the asset is not in the session.
    pub fn scan(&mut self, asset_number: &str, inspected_at: String) -> bool {
        let order = self.next_edit_order;
        let Some(asset) = self.asset_mut(asset_number) else {
            return false;
        };
        asset.status = InspectionStatus::Checked;
        asset.inspection_time = Some(inspected_at);
        asset.edit_order = order;
        self.next_edit_order += 1;
        self.touch_scanned(asset_number);
        self.dirty = true;
        true
    }

    /// Reverts a check: back to pending, no time, off the scanned list.
    pub fn cancel_check(&mut self, asset_number: &str) -> bool {
        let order = self.next_edit_order;
        let Some(asset) = self.asset_mut(asset_number) else {
            return false;
        };
        asset.status = InspectionStatus::Pending;
        asset.inspection_time = None;
        asset.edit_order = order;
        self.next_edit_order += 1;
        self.scanned_ids.retain(|id| id != asset_number);
        self.dirty = true;
        true
    }

    pub fn set_note(&mut self, asset_number: &str, note: String) -> bool {
        let order = self.next_edit_order;
        let Some(asset) = self.asset_mut(asset_number) else {
            return false;
        };
        asset.note = note;
        asset.edit_order = order;
        self.next_edit_order += 1;
        self.dirty = true;
        true
    }

    /// Empties the scanned list. Asset state is untouched, so nothing needs
    /// to be written.
    pub fn clear_scanned(&mut self) {
        self.scanned_ids.clear();
    }

    /// Scanned assets, most recent first, optionally filtered by asset number.
    pub fn scanned_assets(&self, query: Option<&str>) -> Vec<&Asset> {
        let query = query.map(str::to_lowercase).filter(|q| !q.is_empty());
        self.scanned_ids
            .iter()
            .rev()
            .filter_map(|id| self.asset(id))
            .filter(|a| match &query {
                Some(q) => a.asset_number.to_lowercase().contains(q),
                None => true,
            })
            .collect()
    }

    /// Assets of one department (all when `None`) whose number, holder, model
    /// or serial contains `query`.
    pub fn filtered_assets(&self, department: Option<&str>, query: Option<&str>) -> Vec<&Asset> {
        let query = query.map(str::to_lowercase).filter(|q| !q.is_empty());
        self.assets
            .iter()
            .filter(|a| department.is_none_or(|d| a.department == d))
            .filter(|a| match &query {
                Some(q) => [
                    &a.asset_number,
                    &a.holder_name,
                    &a.holder_id,
                    &a.model_name,
                    &a.serial_number,
                ]
                .iter()
                .any(|v| v.to_lowercase().contains(q)),
                None => true,
            })
            .collect()
    }

    /// Distinct non-empty departments, sorted.
    pub fn departments(&self) -> Vec<String> {
        self.assets
            .iter()
            .filter(|a| !a.department.is_empty())
            .map(|a| a.department.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn progress(&self) -> Progress {
        let total = self.assets.len();
        let done = self
            .assets
            .iter()
            .filter(|a| a.status == InspectionStatus::Checked)
            .count();
        let percent = if total > 0 {
            ((done as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };
        Progress {
            total,
            done,
            percent,
        }
    }

    /// Checked/total counts per holder id (`unknown` for unassigned assets).
    pub fn holder_stats(&self) -> BTreeMap<String, HolderStats> {
        let mut stats: BTreeMap<String, HolderStats> = BTreeMap::new();
        for asset in &self.assets {
            let key = if asset.holder_id.is_empty() {
                "unknown".to_string()
            } else {
                asset.holder_id.clone()
            };
            let entry = stats.entry(key).or_default();
            entry.total += 1;
            if asset.status == InspectionStatus::Checked {
                entry.done += 1;
            }
        }
        stats
    }

    /// Records to persist: assets that came from an Assets sheet, with their
    /// survey cells refreshed.
    pub fn asset_records(&self, registry: &AliasRegistry) -> Vec<RawRecord> {
        self.assets
            .iter()
            .filter(|a| a.original.relation == RelationTag::Assets)
            .map(|a| a.to_record(registry))
            .collect()
    }
}
