mod convert;
mod document;
mod driver;
mod error;
mod includes;
mod model;
mod resolver;

#[cfg(feature = "http")]
pub mod http;

pub use convert::{camel_case, Introspected, ResourceId, ToResource};
pub use document::{
    status_text, DocCollection, DocItem, ErrorLinks, ErrorObject, ErrorSource, JsonApiObject,
    Links, Relationship, RelationshipData, Resource, ResourceIdentifier, JSONAPI_VERSION,
};
#[cfg(feature = "sqlite")]
pub use driver::SqliteDriver;
pub use driver::{Driver, DriverConfig, DriverFactory, DriverRegistry, MemoryDriver};
pub use error::DriverError;
pub use includes::{IncludeKey, Includes};
pub use model::{
    record_of, schema, Column, ColumnKind, ColumnType, MetaFiller, Model, ModelSchema, Order,
    Record, Relation, RelationKind, Schema, Table,
};

// Derive macros share names with the traits they implement.
pub use jsonapi_driver_macros::{Model, ToResource};
