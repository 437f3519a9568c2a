//! Includes - deduplicating registry of side-loaded resources.

use std::collections::HashMap;

use crate::document::{Resource, ResourceIdentifier};

/// Dedup key of an included resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncludeKey {
    pub resource_type: String,
    pub id: String,
}

impl IncludeKey {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    pub fn of(resource: &Resource) -> Self {
        Self::new(resource.resource_type.clone(), resource.id.clone())
    }
}

impl From<&ResourceIdentifier> for IncludeKey {
    fn from(identifier: &ResourceIdentifier) -> Self {
        Self::new(identifier.resource_type.clone(), identifier.id.clone())
    }
}

/// Per-document scratch registry of related resources.
///
/// Allocate one per document build. Entries are flattened in first-insertion
/// order; re-setting a key replaces the body but keeps its position.
#[derive(Debug, Default)]
pub struct Includes {
    index: HashMap<IncludeKey, usize>,
    resources: Vec<Resource>,
}

impl Includes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `resource` under `key`, overwriting any previous entry.
    pub fn set(&mut self, key: IncludeKey, resource: Resource) {
        match self.index.get(&key) {
            Some(&slot) => self.resources[slot] = resource,
            None => {
                self.index.insert(key, self.resources.len());
                self.resources.push(resource);
            }
        }
    }

    /// Store `resource` under its own `(type, id)`.
    pub fn insert(&mut self, resource: Resource) {
        let key = IncludeKey::of(&resource);
        self.set(key, resource);
    }

    pub fn get(&self, key: &IncludeKey) -> Option<&Resource> {
        self.index.get(key).map(|&slot| &self.resources[slot])
    }

    pub fn contains(&self, key: &IncludeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Resource> {
        self.resources.clone()
    }

    pub fn into_vec(self) -> Vec<Resource> {
        self.resources
    }
}
