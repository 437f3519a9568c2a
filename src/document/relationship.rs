//! Relationship - named edges from an owning resource to its targets.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::doc::Links;

/// The minimal `(id, type)` reference to a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

impl ResourceIdentifier {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
        }
    }
}

/// Relationship linkage: one identifier (to-one) or a sequence (to-many).
///
/// To-one data encodes as an object, or `null` when unresolved. To-many data
/// always encodes as an array, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipData {
    pub resource_ids: Vec<ResourceIdentifier>,
    pub is_single: bool,
}

impl RelationshipData {
    /// Empty to-one linkage.
    pub fn none() -> Self {
        Self {
            resource_ids: Vec::new(),
            is_single: true,
        }
    }

    pub fn one(identifier: ResourceIdentifier) -> Self {
        Self {
            resource_ids: vec![identifier],
            is_single: true,
        }
    }

    pub fn many(identifiers: Vec<ResourceIdentifier>) -> Self {
        Self {
            resource_ids: identifiers,
            is_single: false,
        }
    }

    /// The single target of a to-one relationship, if resolved.
    pub fn single(&self) -> Option<&ResourceIdentifier> {
        if self.is_single {
            self.resource_ids.first()
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resource_ids.is_empty()
    }
}

impl Serialize for RelationshipData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_single {
            match self.resource_ids.first() {
                Some(identifier) => identifier.serialize(serializer),
                None => serializer.serialize_none(),
            }
        } else {
            self.resource_ids.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for RelationshipData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;

        if raw.is_null() {
            return Ok(RelationshipData::none());
        }

        // Single object first, then array.
        if let Ok(single) = serde_json::from_value::<ResourceIdentifier>(raw.clone()) {
            return Ok(RelationshipData::one(single));
        }

        match serde_json::from_value::<Vec<ResourceIdentifier>>(raw) {
            Ok(many) => Ok(RelationshipData::many(many)),
            Err(err) => Err(de::Error::custom(format!(
                "relationship data is neither a resource identifier nor an array of identifiers: {}",
                err
            ))),
        }
    }
}

/// A named relationship on a resource. Holds identifiers only; full target
/// bodies live in the document's `included` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
    #[serde(default)]
    pub data: RelationshipData,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl Relationship {
    /// An unresolved to-one relationship.
    pub fn to_one() -> Self {
        Self {
            data: RelationshipData::none(),
            ..Self::default()
        }
    }

    /// An empty to-many relationship.
    pub fn to_many() -> Self {
        Self {
            data: RelationshipData::many(Vec::new()),
            ..Self::default()
        }
    }
}
