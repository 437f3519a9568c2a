//! Top-level documents: a single resource (`DocItem`) or a collection
//! (`DocCollection`).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ErrorObject;
use super::resource::Resource;
use super::JSONAPI_VERSION;

/// Navigation links for documents and relationships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default, skip_serializing_if = "String::is_empty")]
    pub self_: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub related: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prev: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next: String,
}

impl Links {
    pub fn is_empty(&self) -> bool {
        self.self_.is_empty()
            && self.related.is_empty()
            && self.first.is_empty()
            && self.last.is_empty()
            && self.prev.is_empty()
            && self.next.is_empty()
    }
}

/// The top-level `jsonapi` member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonApiObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl JsonApiObject {
    pub fn v1() -> Self {
        Self {
            version: JSONAPI_VERSION.to_string(),
            meta: Map::new(),
        }
    }
}

/// A document whose primary data is a single resource.
///
/// Callers must not populate both `data` and `errors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorObject>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonapi: Option<JsonApiObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
}

impl DocItem {
    /// A document carrying `resource` as primary data.
    pub fn new(resource: Resource) -> Self {
        Self {
            data: Some(resource),
            ..Self::default()
        }
    }

    /// A driver-produced document: primary data, includes, version marker.
    pub fn assemble(resource: Resource, included: Vec<Resource>) -> Self {
        Self {
            data: Some(resource),
            jsonapi: Some(JsonApiObject::v1()),
            included,
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Move a `data` attribute of the primary resource into `meta.data`.
    pub fn hoist_data_meta(&mut self) {
        let Some(resource) = self.data.as_mut() else {
            return;
        };
        if let Some(data) = resource.attributes.remove("data") {
            self.meta.insert("data".to_string(), data);
        }
    }
}

/// A document whose primary data is an ordered collection of resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocCollection {
    #[serde(default)]
    pub data: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorObject>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonapi: Option<JsonApiObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
}

impl DocCollection {
    pub fn new(data: Vec<Resource>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn assemble(data: Vec<Resource>, included: Vec<Resource>) -> Self {
        Self {
            data,
            jsonapi: Some(JsonApiObject::v1()),
            included,
            ..Self::default()
        }
    }
}

impl fmt::Display for DocItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl fmt::Display for DocCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
