//! Building canonical assets from raw rows.
//!
//! Asset rows are filtered (no number, duplicate number, terminated) and then
//! joined to the Users relation on the holder id. The first occurrence of an
//! asset number wins and output keeps first-seen order.

use crate::model::{Asset, CanonicalField, InspectionStatus, RawRecord, RelationTag, UserDirectory};
use crate::schema::AliasRegistry;
use std::collections::HashSet;

/// Condition value marking an asset as written off.
const TERMINATED: &str = "termination";

/// Raw records split by relation. Unknown records are dropped.
#[derive(Debug, Default, Clone)]
pub struct Partitioned {
    pub assets: Vec<RawRecord>,
    pub users: Vec<RawRecord>,
    pub trade: Vec<RawRecord>,
}

pub fn partition(records: Vec<RawRecord>) -> Partitioned {
    let mut out = Partitioned::default();
    for record in records {
        match record.relation {
            RelationTag::Assets => out.assets.push(record),
            RelationTag::Users => out.users.push(record),
            RelationTag::Trade => out.trade.push(record),
            RelationTag::Unknown => {}
        }
    }
    out
}

pub fn is_terminated(registry: &AliasRegistry, record: &RawRecord) -> bool {
    registry
        .resolve(record, CanonicalField::State)
        .is_some_and(|state| state.trim().eq_ignore_ascii_case(TERMINATED))
}

/// Asset rows that survive filtering, paired with their asset number.
pub fn live_asset_rows<'r>(
    registry: &AliasRegistry,
    records: &'r [RawRecord],
) -> Vec<(String, &'r RawRecord)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in records {
        let Some(number) = registry.resolve_non_empty(record, CanonicalField::AssetNumber) else {
            continue;
        };
        if seen.contains(number) || is_terminated(registry, record) {
            continue;
        }
        seen.insert(number.to_string());
        out.push((number.to_string(), record));
    }
    out
}

/// Master-owned attributes of an asset after the user join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetadata {
    pub category: String,
    pub model_name: String,
    pub serial_number: String,
    pub holder_id: String,
    pub holder_name: String,
    pub department: String,
}

impl AssetMetadata {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::Category => Some(&self.category),
            CanonicalField::ModelName => Some(&self.model_name),
            CanonicalField::SerialNumber => Some(&self.serial_number),
            CanonicalField::HolderId => Some(&self.holder_id),
            CanonicalField::HolderName => Some(&self.holder_name),
            CanonicalField::Department => Some(&self.department),
            _ => None,
        }
    }
}

/// Resolves metadata from an asset row, taking holder name and department
/// from the matching user when there is one. Without a match the row's own
/// cells are used, and the holder id stands in for a missing name.
pub fn asset_metadata(
    registry: &AliasRegistry,
    record: &RawRecord,
    users: &UserDirectory,
) -> AssetMetadata {
    let holder_id = registry.value(record, CanonicalField::HolderId);
    let (holder_name, department) = match users.get(&holder_id) {
        Some(user) => (user.name.clone(), user.department.clone()),
        None => {
            let name = registry
                .resolve_non_empty(record, CanonicalField::HolderName)
                .map(str::to_string)
                .unwrap_or_else(|| holder_id.clone());
            (name, registry.value(record, CanonicalField::Department))
        }
    };
    AssetMetadata {
        category: registry.value(record, CanonicalField::Category),
        model_name: registry.value(record, CanonicalField::ModelName),
        serial_number: registry.value(record, CanonicalField::SerialNumber),
        holder_id,
        holder_name,
        department,
    }
}

/// Canonical asset for a row, with inspection state read from its survey
/// cells.
pub fn build_asset(
    registry: &AliasRegistry,
    asset_number: String,
    record: &RawRecord,
    users: &UserDirectory,
) -> Asset {
    let meta = asset_metadata(registry, record, users);
    let status = registry
        .resolve_non_empty(record, CanonicalField::Status)
        .map(InspectionStatus::parse)
        .unwrap_or_default();
    let inspection_time = registry
        .resolve_non_empty(record, CanonicalField::InspectionTime)
        .map(str::to_string);
    Asset {
        asset_number,
        category: meta.category,
        model_name: meta.model_name,
        serial_number: meta.serial_number,
        holder_id: meta.holder_id,
        holder_name: meta.holder_name,
        department: meta.department,
        status,
        inspection_time,
        note: registry.value(record, CanonicalField::Note),
        original: record.clone(),
        edit_order: 0,
    }
}

/// Join & dedup over a whole asset relation.
pub fn build_assets(
    registry: &AliasRegistry,
    asset_rows: &[RawRecord],
    users: &UserDirectory,
) -> Vec<Asset> {
    live_asset_rows(registry, asset_rows)
        .into_iter()
        .map(|(number, record)| build_asset(registry, number, record, users))
        .collect()
}
