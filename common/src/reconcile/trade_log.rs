//! Movement history aggregation for the reference view.

use crate::model::{AnnotatedTradeEntry, RawRecord, TradeLogEntry, TradeLogGroup, UserDirectory};
use crate::schema::AliasRegistry;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_REFERENCE_LIMIT: usize = 20;

/// Drops rows whose (date, asset, acting holder) was already seen.
pub fn dedup<'r>(
    registry: &AliasRegistry,
    records: &'r [RawRecord],
) -> Vec<(&'r RawRecord, TradeLogEntry)> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| (r, TradeLogEntry::from_record(registry, r)))
        .filter(|(_, entry)| seen.insert(entry.key()))
        .collect()
}

/// Rows of `incoming` whose key is in neither `existing` nor earlier in
/// `incoming`.
pub fn unseen_entries(
    registry: &AliasRegistry,
    existing: &[RawRecord],
    incoming: &[RawRecord],
) -> Vec<TradeLogEntry> {
    let mut seen: HashSet<_> = existing
        .iter()
        .map(|r| TradeLogEntry::from_record(registry, r).key())
        .collect();
    incoming
        .iter()
        .map(|r| TradeLogEntry::from_record(registry, r))
        .filter(|entry| seen.insert(entry.key()))
        .collect()
}

fn annotate(entry: TradeLogEntry, users: &UserDirectory) -> AnnotatedTradeEntry {
    let (holder_name, holder_department) = users.display(&entry.holder_id);
    let (prior_holder_name, prior_holder_department) = users.display(&entry.prior_holder_id);
    AnnotatedTradeEntry {
        entry,
        holder_name,
        holder_department,
        prior_holder_name,
        prior_holder_department,
    }
}

/// Groups deduplicated movements per asset.
///
/// `query` filters on any cell before grouping. Groups are ordered by their
/// latest date, newest first, and at most `limit` are returned. Within a group
/// entries run oldest first.
pub fn aggregate(
    registry: &AliasRegistry,
    records: &[RawRecord],
    users: &UserDirectory,
    query: Option<&str>,
    limit: usize,
) -> Vec<TradeLogGroup> {
    let query = query.map(str::to_lowercase).filter(|q| !q.is_empty());
    let mut groups: Vec<TradeLogGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (record, entry) in dedup(registry, records) {
        if let Some(q) = &query {
            if !record.contains_text(q) {
                continue;
            }
        }
        let slot = *index.entry(entry.asset_number.clone()).or_insert_with(|| {
            groups.push(TradeLogGroup {
                asset_number: entry.asset_number.clone(),
                entries: Vec::new(),
                last_update: String::new(),
            });
            groups.len() - 1
        });
        groups[slot].entries.push(annotate(entry, users));
    }

    for group in &mut groups {
        group.entries.sort_by(|a, b| a.entry.date.cmp(&b.entry.date));
        if let Some(last) = group.entries.last() {
            group.last_update = last.entry.date.clone();
        }
    }
    groups.sort_by(|a, b| b.last_update.cmp(&a.last_update));
    groups.truncate(limit);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationTag;

    fn trade(date: &str, asset: &str, holder: &str, prior: &str) -> RawRecord {
        let mut r = RawRecord::new("거래이력", RelationTag::Trade, 1);
        r.set("일자", date);
        r.set("관리번호", asset);
        r.set("사번", holder);
        r.set("이전사용자", prior);
        r
    }

    fn users(registry: &AliasRegistry) -> UserDirectory {
        let mut u = RawRecord::new("Users", RelationTag::Users, 1);
        u.set("사번", "100");
        u.set("성명", "Kim");
        u.set("부서", "IT");
        UserDirectory::from_records(registry, &[u])
    }

    #[test]
    fn identical_keys_collapse_to_first() {
        let registry = AliasRegistry::default();
        let mut first = trade("2024-01-01", "A1", "100", "200");
        first.set("비고", "first");
        let mut second = trade("2024-01-01", "A1", "100", "300");
        second.set("비고", "second");

        let groups = aggregate(&registry, &[first, second], &UserDirectory::default(), None, 20);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].entries.len(), 1);
        assert_eq!(groups[0].entries[0].entry.note, "first");
    }

    #[test]
    fn groups_sort_by_latest_date_descending() {
        let registry = AliasRegistry::default();
        let records = [
            trade("2024-03-01", "A1", "100", ""),
            trade("2024-01-01", "A2", "100", ""),
            trade("2024-01-05", "A1", "101", ""),
            trade("2024-06-01", "A2", "102", ""),
            trade("2024-02-01", "A3", "100", ""),
        ];

        let groups = aggregate(&registry, &records, &UserDirectory::default(), None, 20);

        let order: Vec<_> = groups.iter().map(|g| g.asset_number.as_str()).collect();
        assert_eq!(order, vec!["A2", "A1", "A3"]);
        assert_eq!(groups[0].last_update, "2024-06-01");
        let a1_dates: Vec<_> = groups[1].entries.iter().map(|e| e.entry.date.as_str()).collect();
        assert_eq!(a1_dates, vec!["2024-01-05", "2024-03-01"]);
    }

    #[test]
    fn output_is_truncated_to_limit() {
        let registry = AliasRegistry::default();
        let records: Vec<_> = (0..30)
            .map(|i| trade(&format!("2024-01-{:02}", i % 28 + 1), &format!("A{i}"), "100", ""))
            .collect();

        let groups = aggregate(
            &registry,
            &records,
            &UserDirectory::default(),
            None,
            DEFAULT_REFERENCE_LIMIT,
        );
        assert_eq!(groups.len(), DEFAULT_REFERENCE_LIMIT);

        let groups = aggregate(&registry, &records, &UserDirectory::default(), None, 5);
        assert_eq!(groups.len(), 5);
    }

    #[test]
    fn entries_are_annotated_with_holder_names() {
        let registry = AliasRegistry::default();
        let users = users(&registry);
        let rows = [trade("2024-01-01", "A1", "100", "555")];
        let groups = aggregate(&registry, &rows, &users, None, 20);

        let entry = &groups[0].entries[0];
        assert_eq!(
            (entry.holder_name.as_str(), entry.holder_department.as_str()),
            ("Kim", "IT")
        );
        assert_eq!(
            (
                entry.prior_holder_name.as_str(),
                entry.prior_holder_department.as_str()
            ),
            ("555", "")
        );
    }

    #[test]
    fn query_filters_any_cell() {
        let registry = AliasRegistry::default();
        let records = [trade("2024-01-01", "A1", "100", ""), trade("2024-01-02", "B7", "100", "")];
        let groups = aggregate(&registry, &records, &UserDirectory::default(), Some("b7"), 20);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].asset_number, "B7");
    }

    #[test]
    fn unseen_entries_skip_known_keys() {
        let registry = AliasRegistry::default();
        let existing = [trade("2024-01-01", "A1", "100", "")];
        let incoming = [
            trade("2024-01-01", "A1", "100", "999"),
            trade("2024-01-02", "A1", "100", ""),
            trade("2024-01-02", "A1", "100", ""),
        ];

        let fresh = unseen_entries(&registry, &existing, &incoming);

        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].date, "2024-01-02");
    }
}
