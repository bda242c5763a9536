//! The weak-schema layer between spreadsheet cells and canonical fields.
//!
//! Sheets arrive as 2-D blocks of strings whose header text is whatever a
//! person typed. `classify` decides which relation a sheet holds from its
//! title, `codec` turns blocks into [`RawRecord`]s and back, and `alias`
//! resolves canonical fields against a record's arbitrary keys.

pub mod alias;
pub mod classify;
pub mod codec;

use crate::model::{RawRecord, RelationTag};
use log::info;

pub use alias::AliasRegistry;
pub use classify::classify;

/// Classifies and decodes one sheet's value block.
///
/// Sheets that match none of the known relations yield no records. The skip is
/// logged so an unexpected tab name is visible in the backend log.
pub fn ingest_sheet(title: &str, values: &[Vec<String>]) -> Vec<RawRecord> {
    let relation = classify(title);
    if relation == RelationTag::Unknown {
        info!("Skipping sheet \"{}\": no relation matches its title", title);
        return Vec::new();
    }
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    codec::decode(header, rows, title, relation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(header: &[&str], rows: &[&[&str]]) -> Vec<Vec<String>> {
        let mut out = vec![header.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
        out.extend(rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()));
        out
    }

    #[test]
    fn mixed_workbook_keeps_only_known_relations() {
        let sheets = [
            ("Assets", block(&["no", "모델명"], &[&["A1", "X1"]])),
            ("HR_인사", block(&["사번", "성명"], &[&["100", "Kim"]])),
            ("거래이력", block(&["date", "no"], &[&["2024-01-01", "A1"]])),
            ("Notes", block(&["memo"], &[&["call vendor"]])),
        ];

        let tags: Vec<_> = sheets.iter().map(|(t, _)| classify(t)).collect();
        assert_eq!(
            tags,
            vec![
                RelationTag::Assets,
                RelationTag::Users,
                RelationTag::Trade,
                RelationTag::Unknown
            ]
        );

        let records: Vec<_> = sheets
            .iter()
            .flat_map(|(t, v)| ingest_sheet(t, v))
            .collect();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.sheet_title != "Notes"));
        assert!(records.iter().all(|r| r.relation != RelationTag::Unknown));
    }

    #[test]
    fn empty_sheet_yields_nothing() {
        assert!(ingest_sheet("Assets", &[]).is_empty());
        assert!(ingest_sheet("Assets", &block(&["no"], &[])).is_empty());
    }
}
