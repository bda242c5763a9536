//! Folding fresh master data into a session that is already being inspected.
//!
//! Which side wins for a given field is decided by [`MERGE_POLICY`] rather than
//! by update order, so adding a field means adding a row to the table.

use crate::model::{Asset, CanonicalField, InspectionStatus, RawRecord, RelationTag, UserDirectory};
use crate::reconcile::join::{asset_metadata, live_asset_rows};
use crate::schema::AliasRegistry;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The master snapshot overwrites the session value.
    Master,
    /// The session value is kept whatever the master says.
    Local,
}

pub const MERGE_POLICY: [(CanonicalField, Owner); 9] = [
    (CanonicalField::Category, Owner::Master),
    (CanonicalField::ModelName, Owner::Master),
    (CanonicalField::SerialNumber, Owner::Master),
    (CanonicalField::HolderId, Owner::Master),
    (CanonicalField::HolderName, Owner::Master),
    (CanonicalField::Department, Owner::Master),
    (CanonicalField::Status, Owner::Local),
    (CanonicalField::InspectionTime, Owner::Local),
    (CanonicalField::Note, Owner::Local),
];

pub fn owner_of(field: CanonicalField) -> Option<Owner> {
    MERGE_POLICY
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, owner)| *owner)
}

fn is_local_column(registry: &AliasRegistry, key: &str) -> bool {
    MERGE_POLICY
        .iter()
        .any(|(field, owner)| *owner == Owner::Local && registry.is_alias(key, *field))
}

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub assets: Vec<Asset>,
    pub inserted: usize,
    pub updated: usize,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.inserted > 0 || self.updated > 0
    }
}

/// Merges `master_rows` into `current`.
///
/// Existing assets get their master-owned fields replaced and keep their
/// inspection state; unknown numbers are appended as pending assets. Assets
/// the master no longer lists stay as they are. The result is a new vector,
/// `current` is never modified.
pub fn merge_master(
    registry: &AliasRegistry,
    current: &[Asset],
    master_rows: &[RawRecord],
    users: &UserDirectory,
) -> MergeOutcome {
    let mut assets = current.to_vec();
    let index: HashMap<String, usize> = assets
        .iter()
        .enumerate()
        .map(|(i, a)| (a.asset_number.clone(), i))
        .collect();
    let mut outcome = MergeOutcome::default();

    for (number, row) in live_asset_rows(registry, master_rows) {
        let meta = asset_metadata(registry, row, users);
        match index.get(&number) {
            Some(&i) => {
                let existing = &mut assets[i];
                let mut changed = false;
                for (field, owner) in MERGE_POLICY {
                    if owner != Owner::Master {
                        continue;
                    }
                    let (Some(incoming), Some(slot)) =
                        (meta.get(field), existing.metadata_mut(field))
                    else {
                        continue;
                    };
                    if slot.as_str() != incoming {
                        *slot = incoming.to_string();
                        changed = true;
                    }
                }
                existing
                    .original
                    .overlay(row, |key| is_local_column(registry, key));
                if changed {
                    outcome.updated += 1;
                }
            }
            None => {
                let mut original = row.clone();
                original.relation = RelationTag::Assets;
                assets.push(Asset {
                    asset_number: number,
                    category: meta.category,
                    model_name: meta.model_name,
                    serial_number: meta.serial_number,
                    holder_id: meta.holder_id,
                    holder_name: meta.holder_name,
                    department: meta.department,
                    status: InspectionStatus::Pending,
                    inspection_time: None,
                    note: String::new(),
                    original,
                    edit_order: 0,
                });
                outcome.inserted += 1;
            }
        }
    }

    outcome.assets = assets;
    outcome
}

/// Re-applies local inspection state onto a freshly fetched copy of the same
/// session, so a reload racing with unsaved edits does not discard them.
///
/// Local-only assets are kept as well.
pub fn preserve_local_inspection(fetched: Vec<Asset>, local: &[Asset]) -> Vec<Asset> {
    let local_by_number: HashMap<&str, &Asset> =
        local.iter().map(|a| (a.asset_number.as_str(), a)).collect();
    let mut merged: Vec<Asset> = fetched
        .into_iter()
        .map(|mut asset| {
            if let Some(mine) = local_by_number.get(asset.asset_number.as_str()) {
                asset.status = mine.status;
                asset.inspection_time = mine.inspection_time.clone();
                asset.note = mine.note.clone();
                asset.edit_order = mine.edit_order;
            }
            asset
        })
        .collect();
    for asset in local {
        if !merged.iter().any(|a| a.asset_number == asset.asset_number) {
            merged.push(asset.clone());
        }
    }
    merged
}
