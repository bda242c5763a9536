//! Conversion between tabular blocks and [`RawRecord`]s.
//!
//! A block is a header row followed by data rows. Decoding keeps the header
//! sequence and row ordinal on every record so that encoding can restore the
//! original column order. Encoding also makes sure the three survey columns
//! the inspection workflow writes are present.

use crate::model::{RawRecord, RelationTag};
use std::collections::HashSet;

/// Columns every written asset block must carry.
pub const SURVEY_COLUMNS: [&str; 3] = ["status", "inspection_time", "note"];

/// Header cells made usable as record keys. A blank cell becomes
/// `column_<n>` (1-based position) and a repeated title gets `_2`, `_3` and
/// so on appended, so no cell of a row is lost to another one.
pub fn distinct_header(header: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(col, cell)| {
            let base = if cell.trim().is_empty() {
                format!("column_{}", col + 1)
            } else {
                cell.clone()
            };
            let mut key = base.clone();
            let mut n = 1;
            while !seen.insert(key.clone()) {
                n += 1;
                key = format!("{base}_{n}");
            }
            key
        })
        .collect()
}

/// Turns `rows` into records keyed by `header` (see [`distinct_header`]).
///
/// Row `i` (1-based, header excluded) becomes one record. Short rows are
/// padded with empty strings; rows with no content at all are skipped.
pub fn decode(
    header: &[String],
    rows: &[Vec<String>],
    sheet_title: &str,
    relation: RelationTag,
) -> Vec<RawRecord> {
    let header = distinct_header(header);
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|(index, row)| {
            let mut record = RawRecord::new(sheet_title, relation, index + 1);
            for (col, key) in header.iter().enumerate() {
                let value = row.get(col).cloned().unwrap_or_default();
                record.set(key.clone(), value);
            }
            record
        })
        .collect()
}

/// Union of the records' header sequences, first-seen order, with the survey
/// columns appended when no existing header matches them case-insensitively.
pub fn union_header(records: &[RawRecord]) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    for record in records {
        for key in record.headers() {
            if !header.contains(key) {
                header.push(key.clone());
            }
        }
    }
    for column in SURVEY_COLUMNS {
        if !header.iter().any(|h| h.eq_ignore_ascii_case(column)) {
            header.push(column.to_string());
        }
    }
    header
}

/// Cells of `record` laid out along `header`. Lookup is exact first, then
/// case-insensitive; absent cells are empty.
pub fn encode_row(header: &[String], record: &RawRecord) -> Vec<String> {
    header
        .iter()
        .map(|h| {
            record
                .get(h)
                .or_else(|| record.get_ignore_case(h))
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

/// Header row plus one row per record. An empty input encodes to an empty
/// block.
pub fn encode(records: &[RawRecord]) -> Vec<Vec<String>> {
    if records.is_empty() {
        return Vec::new();
    }
    let header = union_header(records);
    let mut block = Vec::with_capacity(records.len() + 1);
    block.extend(records.iter().map(|r| encode_row(&header, r)));
    block.insert(0, header);
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn decode_pads_short_rows_and_keeps_provenance() {
        let header = strings(&["no", "모델명", "부서"]);
        let rows = vec![strings(&["A1", "X1"]), strings(&["A2", "X2", "HR"])];

        let records = decode(&header, &rows, "자산현황", RelationTag::Assets);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("부서"), Some(""));
        assert_eq!(records[0].row, 1);
        assert_eq!(records[1].row, 2);
        assert_eq!(records[1].sheet_title, "자산현황");
        assert_eq!(records[1].relation, RelationTag::Assets);
        assert_eq!(records[1].headers(), header.as_slice());
    }

    #[test]
    fn decode_skips_blank_rows_but_keeps_ordinals() {
        let header = strings(&["no"]);
        let rows = vec![strings(&["A1"]), strings(&["", " "]), vec![], strings(&["A4"])];

        let records = decode(&header, &rows, "Assets", RelationTag::Assets);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("no"), Some("A4"));
        assert_eq!(records[1].row, 4);
    }

    #[test]
    fn encode_injects_missing_survey_columns_only() {
        let header = strings(&["no", "Status"]);
        let rows = vec![strings(&["A1", "checked"])];
        let records = decode(&header, &rows, "Assets", RelationTag::Assets);

        let block = encode(&records);

        assert_eq!(block[0], strings(&["no", "Status", "inspection_time", "note"]));
        assert_eq!(block[1], strings(&["A1", "checked", "", ""]));
    }

    #[test]
    fn encode_unions_headers_in_first_seen_order() {
        let a = decode(&strings(&["no", "x"]), &[strings(&["A1", "1"])], "s1", RelationTag::Assets);
        let b = decode(&strings(&["y", "no"]), &[strings(&["2", "A2"])], "s2", RelationTag::Assets);
        let records: Vec<_> = a.into_iter().chain(b).collect();

        let block = encode(&records);

        assert_eq!(&block[0][..3], &strings(&["no", "x", "y"])[..]);
        assert_eq!(&block[2][..3], &strings(&["A2", "", "2"])[..]);
    }

    #[test]
    fn encode_falls_back_to_case_insensitive_keys() {
        let mut record = RawRecord::new("Assets", RelationTag::Assets, 1);
        record.set("NOTE", "fragile");
        let header = strings(&["note"]);
        assert_eq!(encode_row(&header, &record), strings(&["fragile"]));
    }

    #[test]
    fn round_trip_preserves_populated_cells() {
        let header = strings(&["관리번호", "모델명", "사용자 ID", "비고"]);
        let rows = vec![
            strings(&["A1", "ThinkPad", "100", ""]),
            strings(&["A2", "", "101", "spare"]),
            strings(&["A3", "Dell"]),
        ];

        let first = decode(&header, &rows, "Assets", RelationTag::Assets);
        let block = encode(&first);
        let (h2, r2) = block.split_first().expect("encoded block has a header");
        let second = decode(h2, r2, "Assets", RelationTag::Assets);

        assert_eq!(first.len(), second.len());
        for (row, (before, after)) in rows.iter().zip(first.iter().zip(&second)) {
            for (col, cell) in row.iter().enumerate() {
                if !cell.is_empty() {
                    assert_eq!(after.get(&header[col]), Some(cell.as_str()));
                }
            }
            for (key, value) in before.iter() {
                assert_eq!(after.get(key), Some(value));
            }
        }
    }

    #[test]
    fn blank_and_repeated_titles_keep_their_cells() {
        let header = strings(&["no", "", "비고", "비고", " "]);
        let rows = vec![strings(&["A1", "x", "first", "second", "y"])];

        let records = decode(&header, &rows, "Assets", RelationTag::Assets);
        assert_eq!(
            records[0].headers(),
            strings(&["no", "column_2", "비고", "비고_2", "column_5"]).as_slice()
        );

        let block = encode(&records);
        let (h2, r2) = block.split_first().expect("encoded block has a header");
        let again = decode(h2, r2, "Assets", RelationTag::Assets);
        let expected = [
            ("column_2", "x"),
            ("비고", "first"),
            ("비고_2", "second"),
            ("column_5", "y"),
        ];
        for (key, value) in expected {
            assert_eq!(again[0].get(key), Some(value));
        }
    }

    #[test]
    fn distinct_header_does_not_collide_with_existing_titles() {
        let header = strings(&["a", "a_2", "a"]);
        assert_eq!(distinct_header(&header), strings(&["a", "a_2", "a_3"]));
    }

    #[test]
    fn empty_records_encode_to_empty_block() {
        assert!(encode(&[]).is_empty());
    }
}
