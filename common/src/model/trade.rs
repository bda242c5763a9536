use crate::model::{CanonicalField, RawRecord, RelationTag};
use crate::schema::AliasRegistry;
use serde::{Deserialize, Serialize};

/// Placeholder date used when a movement row has none, so it sorts first.
pub const UNDATED: &str = "0000-00-00";
/// Asset number used when a movement row has none.
pub const UNKNOWN_ASSET: &str = "Unknown";

/// Sheet title given to movement rows created locally.
pub const GLOBAL_TRADE_SHEET: &str = "Global_Trade";

/// One asset movement: who took the asset over from whom, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    pub date: String,
    pub asset_number: String,
    pub holder_id: String,
    pub prior_holder_id: String,
    pub note: String,
}

impl TradeLogEntry {
    pub fn from_record(registry: &AliasRegistry, record: &RawRecord) -> Self {
        let or = |field, fallback: &str| {
            registry
                .resolve_non_empty(record, field)
                .unwrap_or(fallback)
                .to_string()
        };
        Self {
            date: or(CanonicalField::Date, UNDATED),
            asset_number: or(CanonicalField::AssetNumber, UNKNOWN_ASSET),
            holder_id: or(CanonicalField::HolderId, ""),
            prior_holder_id: or(CanonicalField::PriorHolderId, ""),
            note: or(CanonicalField::Note, ""),
        }
    }

    /// Identity used for deduplication.
    pub fn key(&self) -> (String, String, String) {
        (
            self.date.clone(),
            self.asset_number.clone(),
            self.holder_id.clone(),
        )
    }

    /// Header used when a movement sheet has to be started from scratch.
    pub fn canonical_header() -> Vec<String> {
        Self::FIELDS.iter().map(|f| f.name().to_string()).collect()
    }

    const FIELDS: [CanonicalField; 5] = [
        CanonicalField::Date,
        CanonicalField::AssetNumber,
        CanonicalField::HolderId,
        CanonicalField::PriorHolderId,
        CanonicalField::Note,
    ];

    fn field(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Date => &self.date,
            CanonicalField::AssetNumber => &self.asset_number,
            CanonicalField::HolderId => &self.holder_id,
            CanonicalField::PriorHolderId => &self.prior_holder_id,
            CanonicalField::Note => &self.note,
            _ => "",
        }
    }

    /// Cells laid out along an existing sheet header, whatever spelling it
    /// uses for each column. Unrecognised columns stay empty.
    pub fn to_row(&self, registry: &AliasRegistry, header: &[String]) -> Vec<String> {
        header
            .iter()
            .map(|column| {
                Self::FIELDS
                    .iter()
                    .find(|f| registry.is_alias(column, **f))
                    .map(|f| self.field(*f).to_string())
                    .unwrap_or_default()
            })
            .collect()
    }

    pub fn to_record(&self) -> RawRecord {
        let mut record = RawRecord::new(GLOBAL_TRADE_SHEET, RelationTag::Trade, 0);
        record.set(CanonicalField::Date.name(), self.date.clone());
        record.set(CanonicalField::AssetNumber.name(), self.asset_number.clone());
        record.set(CanonicalField::HolderId.name(), self.holder_id.clone());
        record.set(CanonicalField::PriorHolderId.name(), self.prior_holder_id.clone());
        record.set(CanonicalField::Note.name(), self.note.clone());
        record
    }
}

/// A movement entry with holder ids resolved to display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedTradeEntry {
    #[serde(flatten)]
    pub entry: TradeLogEntry,
    pub holder_name: String,
    pub holder_department: String,
    pub prior_holder_name: String,
    pub prior_holder_department: String,
}

/// All movements of one asset, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogGroup {
    pub asset_number: String,
    pub entries: Vec<AnnotatedTradeEntry>,
    pub last_update: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cells_get_placeholders() {
        let registry = AliasRegistry::default();
        let mut record = RawRecord::new("거래이력", RelationTag::Trade, 1);
        record.set("비고", "moved");

        let entry = TradeLogEntry::from_record(&registry, &record);

        assert_eq!(entry.date, UNDATED);
        assert_eq!(entry.asset_number, UNKNOWN_ASSET);
        assert_eq!(entry.holder_id, "");
        assert_eq!(entry.note, "moved");
    }

    #[test]
    fn rows_follow_the_sheet_spelling() {
        let registry = AliasRegistry::default();
        let entry = TradeLogEntry {
            date: "2024-05-02".into(),
            asset_number: "A9".into(),
            holder_id: "100".into(),
            prior_holder_id: "200".into(),
            note: String::new(),
        };
        let header: Vec<String> = ["관리번호", "일자", "메모란", "사번"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            entry.to_row(&registry, &header),
            vec!["A9", "2024-05-02", "", "100"]
        );
        assert_eq!(TradeLogEntry::canonical_header()[0], "date");
    }

    #[test]
    fn written_entries_read_back_identically() {
        let registry = AliasRegistry::default();
        let entry = TradeLogEntry {
            date: "2024-05-02".into(),
            asset_number: "A9".into(),
            holder_id: "100".into(),
            prior_holder_id: "200".into(),
            note: "handover".into(),
        };

        let back = TradeLogEntry::from_record(&registry, &entry.to_record());

        assert_eq!(back, entry);
    }
}
