//! Resource - the canonical JSON:API unit.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::relationship::{Relationship, ResourceIdentifier};

/// A single JSON:API resource object, identified by `(id, type)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Empty only before the resource has been persisted.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Relationship>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub links: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl Resource {
    /// Create an empty resource with the given id and type.
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    /// The `(id, type)` pair referencing this resource.
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(self.id.clone(), self.resource_type.clone())
    }

    /// Whether this resource can be the target of a relationship.
    pub fn is_addressable(&self) -> bool {
        !self.id.is_empty()
    }

    /// Serialize `value` and store it under `key`.
    ///
    /// Values that fail to serialize are dropped; conversion never fails.
    pub fn set_attribute<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.attributes.insert(key, value);
            }
            Err(err) => {
                tracing::warn!(
                    resource_type = %self.resource_type,
                    attribute = %key,
                    error = %err,
                    "dropping attribute that failed to serialize"
                );
            }
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}
