use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which of the three known relations a sheet holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationTag {
    Assets,
    Users,
    Trade,
    #[default]
    Unknown,
}

impl RelationTag {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationTag::Assets => "assets",
            RelationTag::Users => "users",
            RelationTag::Trade => "trade",
            RelationTag::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RelationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data row of a sheet, keyed by the sheet's own header text.
///
/// Besides the cell values the record remembers where it came from: the sheet
/// title, the relation the sheet was classified as, the header sequence in its
/// original order and the 1-based row ordinal (header excluded). The header
/// sequence always lists every key of the record exactly once, so writing the
/// record back reproduces the original column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub sheet_title: String,
    pub relation: RelationTag,
    pub row: usize,
    headers: Vec<String>,
    values: HashMap<String, String>,
}

impl RawRecord {
    pub fn new(sheet_title: impl Into<String>, relation: RelationTag, row: usize) -> Self {
        Self {
            sheet_title: sheet_title.into(),
            relation,
            row,
            headers: Vec::new(),
            values: HashMap::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Case-insensitive lookup, first match in header order.
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        let wanted = key.to_lowercase();
        self.headers
            .iter()
            .find(|h| h.to_lowercase() == wanted)
            .and_then(|h| self.get(h))
    }

    /// Sets a cell, appending the key to the header sequence if it is new.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.headers.push(key.clone());
        }
        self.values.insert(key, value.into());
    }

    /// Cells in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter_map(|h| self.values.get(h).map(|v| (h.as_str(), v.as_str())))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Copies every cell of `other` into this record unless `skip` rejects the
    /// key. Provenance of `self` is kept.
    pub fn overlay(&mut self, other: &RawRecord, skip: impl Fn(&str) -> bool) {
        for (key, value) in other.iter() {
            if !skip(key) {
                self.set(key, value);
            }
        }
    }

    /// True when any cell contains `needle` (already lower-cased).
    pub fn contains_text(&self, needle: &str) -> bool {
        self.values
            .values()
            .any(|v| v.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keeps_first_seen_header_order() {
        let mut record = RawRecord::new("Assets", RelationTag::Assets, 1);
        record.set("b", "1");
        record.set("a", "2");
        record.set("b", "3");

        assert_eq!(record.headers(), ["b".to_string(), "a".to_string()]);
        assert_eq!(record.get("b"), Some("3"));
        let cells: Vec<_> = record.iter().collect();
        assert_eq!(cells, vec![("b", "3"), ("a", "2")]);
    }

    #[test]
    fn case_insensitive_lookup() {
        let mut record = RawRecord::new("Assets", RelationTag::Assets, 1);
        record.set("Status", "checked");
        assert_eq!(record.get("status"), None);
        assert_eq!(record.get_ignore_case("STATUS"), Some("checked"));
    }

    #[test]
    fn overlay_respects_skip() {
        let mut local = RawRecord::new("Sheet1", RelationTag::Assets, 4);
        local.set("no", "A1");
        local.set("status", "checked");
        let mut master = RawRecord::new("Assets", RelationTag::Assets, 9);
        master.set("status", "pending");
        master.set("부서", "HR");

        local.overlay(&master, |k| k == "status");

        assert_eq!(local.get("status"), Some("checked"));
        assert_eq!(local.get("부서"), Some("HR"));
        assert_eq!(local.row, 4);
        assert_eq!(local.sheet_title, "Sheet1");
    }
}
