//! Column alias resolution.
//!
//! Every canonical field owns a list of header spellings seen in the wild. Both
//! the aliases and a record's keys are normalized the same way (lower-case,
//! whitespace and underscores removed) before comparing, so `" Asset No "`,
//! `asset_no` and `ASSETNO` all land on the same field.

use crate::model::{CanonicalField, RawRecord};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("separator pattern is valid"));

/// Lower-cases `key` and strips whitespace and underscores.
pub fn normalize_key(key: &str) -> String {
    SEPARATORS.replace_all(&key.to_lowercase(), "").into_owned()
}

/// Field id → normalized alias list.
///
/// The default registry is built from [`CanonicalField::default_aliases`] plus
/// each field's own column name. Extra spellings can be registered at runtime
/// (the backend feeds them from configuration) without touching lookup code.
#[derive(Debug, Clone)]
pub struct AliasRegistry {
    aliases: HashMap<CanonicalField, Vec<String>>,
}

impl Default for AliasRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for field in CanonicalField::ALL {
            for alias in field.default_aliases() {
                registry.register(field, alias);
            }
            registry.register(field, field.name());
        }
        registry
    }
}

impl AliasRegistry {
    /// A registry with no aliases at all. Every field then resolves through
    /// its own lower-cased name only.
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    pub fn register(&mut self, field: CanonicalField, alias: &str) {
        let normalized = normalize_key(alias);
        if normalized.is_empty() {
            return;
        }
        let list = self.aliases.entry(field).or_default();
        if !list.contains(&normalized) {
            list.push(normalized);
        }
    }

    /// Normalized aliases for `field`, falling back to the field's own name.
    pub fn aliases(&self, field: CanonicalField) -> Vec<String> {
        match self.aliases.get(&field) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => vec![normalize_key(field.name())],
        }
    }

    fn matches(&self, field: CanonicalField, normalized_key: &str) -> bool {
        match self.aliases.get(&field) {
            Some(list) if !list.is_empty() => list.iter().any(|a| a == normalized_key),
            _ => normalize_key(field.name()) == normalized_key,
        }
    }

    /// Value of the first key of `record` (in header order) that is an alias
    /// of `field`. The value may be empty.
    pub fn resolve<'r>(&self, record: &'r RawRecord, field: CanonicalField) -> Option<&'r str> {
        record
            .iter()
            .find(|(key, _)| self.matches(field, &normalize_key(key)))
            .map(|(_, value)| value)
    }

    /// Like [`resolve`](Self::resolve) but treats blank values as absent.
    pub fn resolve_non_empty<'r>(
        &self,
        record: &'r RawRecord,
        field: CanonicalField,
    ) -> Option<&'r str> {
        self.resolve(record, field).filter(|v| !v.trim().is_empty())
    }

    /// Resolved value or an empty string.
    pub fn value(&self, record: &RawRecord, field: CanonicalField) -> String {
        self.resolve_non_empty(record, field)
            .unwrap_or_default()
            .to_string()
    }

    /// The record key that currently carries `field`, if any.
    pub fn key_for<'r>(&self, record: &'r RawRecord, field: CanonicalField) -> Option<&'r str> {
        record
            .iter()
            .find(|(key, _)| self.matches(field, &normalize_key(key)))
            .map(|(key, _)| key)
    }

    /// True when `key` is an alias of `field`.
    pub fn is_alias(&self, key: &str, field: CanonicalField) -> bool {
        self.matches(field, &normalize_key(key))
    }
}
