use crate::model::{CanonicalField, RawRecord};
use crate::schema::AliasRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub holder_id: String,
    pub name: String,
    pub department: String,
}

impl User {
    /// Builds a user from a raw Users row. Rows without a holder id are
    /// ignored.
    pub fn from_record(registry: &AliasRegistry, record: &RawRecord) -> Option<Self> {
        let holder_id = registry
            .resolve_non_empty(record, CanonicalField::HolderId)?
            .trim()
            .to_string();
        Some(Self {
            holder_id,
            name: registry.value(record, CanonicalField::HolderName),
            department: registry.value(record, CanonicalField::Department),
        })
    }
}

/// Lookup of users by trimmed holder id. The first row for an id wins.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    by_id: HashMap<String, User>,
}

impl UserDirectory {
    pub fn from_records(registry: &AliasRegistry, records: &[RawRecord]) -> Self {
        let mut by_id = HashMap::new();
        for user in records.iter().filter_map(|r| User::from_record(registry, r)) {
            by_id.entry(user.holder_id.clone()).or_insert(user);
        }
        Self { by_id }
    }

    pub fn get(&self, holder_id: &str) -> Option<&User> {
        let id = holder_id.trim();
        if id.is_empty() {
            return None;
        }
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Display name and department for a holder id: the user's when the id is
    /// known, otherwise the id itself with no department.
    pub fn display(&self, holder_id: &str) -> (String, String) {
        match self.get(holder_id) {
            Some(user) => (user.name.clone(), user.department.clone()),
            None => (holder_id.to_string(), String::new()),
        }
    }
}
