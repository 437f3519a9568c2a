//! Document - In-memory JSON:API v1.0 documents and their wire encoding.
//!
//! A document carries either primary data or errors, plus the flattened
//! `included` array of side-loaded resources.
//!
//! ## Example
//!
//! ```ignore
//! use jsonapi_driver::{DocItem, Resource};
//!
//! let mut resource = Resource::new("1", "people");
//! resource.set_attribute("name", &"Ada");
//!
//! let doc = DocItem::new(resource);
//! let json = serde_json::to_string(&doc)?;
//! ```

mod doc;
mod error;
mod relationship;
mod resource;

/// JSON:API version stamped on every driver-produced document.
pub const JSONAPI_VERSION: &str = "1.0";

pub use doc::{DocCollection, DocItem, JsonApiObject, Links};
pub use error::{status_text, ErrorLinks, ErrorObject, ErrorSource};
pub use relationship::{Relationship, RelationshipData, ResourceIdentifier};
pub use resource::Resource;
