use crate::model::{CanonicalField, RawRecord, RelationTag};
use crate::schema::AliasRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectionStatus {
    #[default]
    Pending,
    Checked,
    Missing,
}

impl InspectionStatus {
    /// Parses a raw status cell. Anything unrecognized counts as pending.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "checked" => InspectionStatus::Checked,
            "missing" => InspectionStatus::Missing,
            _ => InspectionStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InspectionStatus::Pending => "pending",
            InspectionStatus::Checked => "checked",
            InspectionStatus::Missing => "missing",
        }
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical asset of the current inspection round.
///
/// Metadata fields come from the master sheets; `status`, `inspection_time`
/// and `note` are owned by the inspection itself. `original` is the raw record
/// the asset was built from and is what gets written back, with the survey
/// cells refreshed from the fields above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_number: String,
    pub category: String,
    pub model_name: String,
    pub serial_number: String,
    pub holder_id: String,
    pub holder_name: String,
    pub department: String,
    pub status: InspectionStatus,
    pub inspection_time: Option<String>,
    pub note: String,
    pub original: RawRecord,
    /// Monotonic marker of the last local edit, 0 when never edited.
    #[serde(default)]
    pub edit_order: u64,
}

impl Asset {
    /// Mutable access to a master-owned metadata field.
    pub fn metadata_mut(&mut self, field: CanonicalField) -> Option<&mut String> {
        match field {
            CanonicalField::Category => Some(&mut self.category),
            CanonicalField::ModelName => Some(&mut self.model_name),
            CanonicalField::SerialNumber => Some(&mut self.serial_number),
            CanonicalField::HolderId => Some(&mut self.holder_id),
            CanonicalField::HolderName => Some(&mut self.holder_name),
            CanonicalField::Department => Some(&mut self.department),
            _ => None,
        }
    }

    /// The raw record to write back: the original cells with the survey
    /// columns set from the current inspection state.
    ///
    /// Each survey value goes to whichever existing column already carries
    /// that field (e.g. `실사상태`); when none does, the canonical column name
    /// is added.
    pub fn to_record(&self, registry: &AliasRegistry) -> RawRecord {
        let mut record = self.original.clone();
        record.relation = RelationTag::Assets;
        let survey = [
            (CanonicalField::Status, self.status.as_str().to_string()),
            (
                CanonicalField::InspectionTime,
                self.inspection_time.clone().unwrap_or_default(),
            ),
            (CanonicalField::Note, self.note.clone()),
        ];
        for (field, value) in survey {
            let key = registry
                .key_for(&record, field)
                .map(str::to_string)
                .unwrap_or_else(|| field.name().to_string());
            record.set(key, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(original: RawRecord) -> Asset {
        Asset {
            asset_number: "A1".into(),
            category: String::new(),
            model_name: String::new(),
            serial_number: String::new(),
            holder_id: String::new(),
            holder_name: String::new(),
            department: String::new(),
            status: InspectionStatus::Checked,
            inspection_time: Some("2024-03-01 09:00:00".into()),
            note: "ok".into(),
            original,
            edit_order: 1,
        }
    }

    #[test]
    fn status_parsing_is_lenient() {
        assert_eq!(InspectionStatus::parse(" Checked "), InspectionStatus::Checked);
        assert_eq!(InspectionStatus::parse("MISSING"), InspectionStatus::Missing);
        assert_eq!(InspectionStatus::parse(""), InspectionStatus::Pending);
        assert_eq!(InspectionStatus::parse("완료"), InspectionStatus::Pending);
    }

    #[test]
    fn to_record_writes_into_existing_localized_columns() {
        let registry = AliasRegistry::default();
        let mut original = RawRecord::new("Sheet1", RelationTag::Assets, 3);
        original.set("관리번호", "A1");
        original.set("실사상태", "pending");
        original.set("비고", "");

        let record = asset(original).to_record(&registry);

        assert_eq!(record.get("실사상태"), Some("checked"));
        assert_eq!(record.get("비고"), Some("ok"));
        assert_eq!(record.get("inspection_time"), Some("2024-03-01 09:00:00"));
        assert_eq!(record.get("status"), None);
        assert_eq!(record.row, 3);
    }

    #[test]
    fn to_record_adds_canonical_columns_when_absent() {
        let registry = AliasRegistry::default();
        let mut original = RawRecord::new("Sheet1", RelationTag::Assets, 1);
        original.set("no", "A1");

        let record = asset(original).to_record(&registry);

        assert_eq!(
            record.headers(),
            ["no", "status", "inspection_time", "note"].map(String::from)
        );
    }
}
