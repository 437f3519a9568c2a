//! Drivers - storage backends that produce JSON:API documents.
//!
//! Every driver fetches raw records, preloads related records one level deep,
//! converts each record through its model's [`Schema`] with one fresh
//! [`Includes`] per document, and stamps the result with `jsonapi.version`.
//!
//! ## Example
//!
//! ```ignore
//! use jsonapi_driver::{schema, Driver, DriverConfig, DriverRegistry};
//!
//! let registry = DriverRegistry::with_defaults();
//! let driver = registry.open("sqlite")?;
//! driver.connect(&DriverConfig::new("sqlite", "app.db"))?;
//!
//! let people = driver.find_all(&schema::<Person>(), None, "")?;
//! ```

mod memory;
mod registry;
#[cfg(feature = "sqlite")]
mod sqlite;

use std::cmp::Ordering;

use serde::Deserialize;
use serde_json::Value;

use crate::convert::ToResource;
use crate::document::{DocCollection, DocItem, Resource};
use crate::error::DriverError;
use crate::includes::Includes;
use crate::model::{
    id_column, ColumnKind, ColumnType, Order, Record, Relation, RelationKind, Schema, Table,
};

pub use memory::MemoryDriver;
pub use registry::{DriverFactory, DriverRegistry};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDriver;

/// Connection settings handed to [`Driver::connect`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Driver name, e.g. `"memory"` or `"sqlite"`.
    #[serde(default = "default_adapter")]
    pub adapter: String,
    /// Backend location; `":memory:"` for an in-memory database.
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_adapter() -> String {
    "memory".to_string()
}

fn default_url() -> String {
    ":memory:".to_string()
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            adapter: default_adapter(),
            url: default_url(),
        }
    }
}

impl DriverConfig {
    pub fn new(adapter: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            url: url.into(),
        }
    }

    /// Parse `{"adapter": "...", "url": "..."}`; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, DriverError> {
        serde_json::from_str(json).map_err(|e| DriverError::Connection(e.to_string()))
    }
}

/// The storage driver contract.
///
/// Implementations serialize every operation on their backing store and keep
/// no converted resources between calls.
pub trait Driver: Send + Sync {
    /// Name the driver is registered under.
    fn name(&self) -> &'static str;

    fn connect(&self, config: &DriverConfig) -> Result<(), DriverError>;

    /// All records of `model`, scoped to `parent_id` when the model declares a
    /// parent key. `query` is the raw query string and is currently ignored.
    fn find_all(
        &self,
        model: &dyn Schema,
        parent_id: Option<&str>,
        query: &str,
    ) -> Result<DocCollection, DriverError>;

    fn find_record(&self, model: &dyn Schema, id: &str, query: &str)
        -> Result<DocItem, DriverError>;

    fn delete(&self, model: &dyn Schema, id: &str) -> Result<(), DriverError>;

    /// Apply the attributes of `doc` onto the record `id`.
    fn update(&self, model: &dyn Schema, id: &str, doc: &DocItem) -> Result<(), DriverError>;

    /// Store the primary data of `doc`.
    ///
    /// Returns `None` when the client supplied the id (nothing new to report),
    /// otherwise the freshly stored item under its generated id.
    fn create(&self, model: &dyn Schema, doc: &DocItem) -> Result<Option<DocItem>, DriverError>;

    /// Convert an arbitrary instance outside of a document build.
    fn to_resource(&self, instance: &dyn ToResource, includes: &mut Includes) -> Resource {
        instance.to_resource(includes)
    }
}

/// Read access a driver gives the shared preloading logic.
pub(crate) trait RecordSource {
    fn fetch_by_id(&self, table: &Table, id: &str) -> Result<Option<Record>, DriverError>;

    fn fetch_where(
        &self,
        table: &Table,
        column: &str,
        value: &str,
    ) -> Result<Vec<Record>, DriverError>;

    /// Targets linked to `owner_id` through `join_table`.
    fn fetch_joined(
        &self,
        join_table: &str,
        owner_id: &str,
        target: &Table,
    ) -> Result<Vec<Record>, DriverError>;
}

/// Attach related records to `record` under each relation's field name.
pub(crate) fn preload(
    source: &dyn RecordSource,
    model: &dyn Schema,
    record: &mut Record,
) -> Result<(), DriverError> {
    let owner_id = record
        .get(id_column(&model.columns()))
        .map(render_id)
        .unwrap_or_default();

    for relation in model.relations() {
        let related = match relation.kind {
            RelationKind::BelongsTo => {
                let target_id = record
                    .get(relation.foreign_key)
                    .map(render_id)
                    .unwrap_or_default();
                if target_id.is_empty() {
                    Value::Null
                } else {
                    source
                        .fetch_by_id(&relation.target, &target_id)?
                        .map(Value::Object)
                        .unwrap_or(Value::Null)
                }
            }
            RelationKind::HasOne => source
                .fetch_where(&relation.target, relation.foreign_key, &owner_id)?
                .into_iter()
                .next()
                .map(Value::Object)
                .unwrap_or(Value::Null),
            RelationKind::HasMany => Value::Array(
                source
                    .fetch_where(&relation.target, relation.foreign_key, &owner_id)?
                    .into_iter()
                    .map(Value::Object)
                    .collect(),
            ),
            RelationKind::ManyToMany => {
                let join_table = relation.join_table_for(model.resource_type());
                Value::Array(
                    source
                        .fetch_joined(&join_table, &owner_id, &relation.target)?
                        .into_iter()
                        .map(Value::Object)
                        .collect(),
                )
            }
        };
        record.insert(relation.field.to_string(), related);
    }

    Ok(())
}

/// Convert records into a collection document sharing one includes registry.
pub(crate) fn assemble_collection(
    model: &dyn Schema,
    records: Vec<Record>,
) -> Result<DocCollection, DriverError> {
    let mut includes = Includes::new();
    let mut data = Vec::with_capacity(records.len());
    for record in records {
        data.push(model.to_resource(record, &mut includes)?);
    }
    Ok(DocCollection::assemble(data, includes.into_vec()))
}

/// Convert one record into an item document and let the model fill its meta.
pub(crate) fn assemble_item(
    driver: &dyn Driver,
    model: &dyn Schema,
    record: Record,
) -> Result<DocItem, DriverError> {
    let mut includes = Includes::new();
    let resource = model.to_resource(record, &mut includes)?;
    let mut doc = DocItem::assemble(resource, includes.into_vec());
    model.fill_meta(driver, &mut doc)?;
    Ok(doc)
}

/// Check that `record` would read back as the model once stored.
pub(crate) fn check_decodes(
    source: &dyn RecordSource,
    model: &dyn Schema,
    record: &Record,
) -> Result<(), DriverError> {
    let mut candidate = record.clone();
    preload(source, model, &mut candidate)?;
    model.validate(candidate)
}

/// Stored id of a new record: the client id typed for the id column, or a
/// generated one.
pub(crate) fn new_id(
    model: &dyn Schema,
    client_id: &str,
    next_integer: impl FnOnce() -> Result<i64, DriverError>,
) -> Result<Value, DriverError> {
    let id_type = model
        .columns()
        .iter()
        .find(|c| c.kind == ColumnKind::Id)
        .map(|c| c.ty)
        .unwrap_or(ColumnType::Text);

    match (client_id.is_empty(), id_type) {
        (false, ColumnType::Integer) => client_id.parse::<i64>().map(Value::from).map_err(|_| {
            DriverError::Validation(format!(
                "id '{}' of type '{}' is not an integer",
                client_id,
                model.resource_type()
            ))
        }),
        (false, _) => Ok(Value::String(client_id.to_string())),
        (true, ColumnType::Integer) => next_integer().map(Value::from),
        (true, _) => Ok(Value::String(uuid::Uuid::new_v4().to_string())),
    }
}

/// Stable sort of raw records by `order`.
pub(crate) fn sort_records(records: &mut [Record], order: Order) {
    records.sort_by(|a, b| {
        let ordering = compare_values(
            a.get(order.column).unwrap_or(&Value::Null),
            b.get(order.column).unwrap_or(&Value::Null),
        );
        if order.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Null sorts first, then booleans, numbers, strings, nested values.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Check an update payload against the path id and the model type.
pub(crate) fn validate_update<'a>(
    model: &dyn Schema,
    id: &str,
    doc: &'a DocItem,
) -> Result<&'a Resource, DriverError> {
    let resource = primary_data(doc)?;
    if resource.id != id {
        return Err(DriverError::Validation(format!(
            "Wrong resource for update: payload id '{}' does not match '{}'",
            resource.id, id
        )));
    }
    check_type(model, resource)?;
    Ok(resource)
}

pub(crate) fn primary_data(doc: &DocItem) -> Result<&Resource, DriverError> {
    doc.data
        .as_ref()
        .ok_or_else(|| DriverError::Validation("document has no primary data".into()))
}

pub(crate) fn check_type(model: &dyn Schema, resource: &Resource) -> Result<(), DriverError> {
    if !resource.resource_type.is_empty() && resource.resource_type != model.resource_type() {
        return Err(DriverError::Validation(format!(
            "resource type '{}' does not match '{}'",
            resource.resource_type,
            model.resource_type()
        )));
    }
    Ok(())
}

/// Map an inbound resource onto storage columns.
///
/// Attributes go to their columns; to-one linkage of `belongs_to`
/// relationships goes to the owner's foreign key. The id is not included.
pub(crate) fn record_from_resource(
    model: &dyn Schema,
    resource: &Resource,
) -> Result<Record, DriverError> {
    let columns = model.columns();
    let mut record = Record::new();

    for (key, value) in &resource.attributes {
        let column = columns
            .iter()
            .find(|c| c.kind == ColumnKind::Attribute && c.attribute == key.as_str())
            .ok_or_else(|| {
                DriverError::Validation(format!(
                    "unknown attribute '{}' for type '{}'",
                    key,
                    model.resource_type()
                ))
            })?;
        record.insert(column.name.to_string(), value.clone());
    }

    let relations: Vec<Relation> = model.relations();
    for (name, relationship) in &resource.relationships {
        let Some(relation) = relations.iter().find(|r| r.name == name.as_str()) else {
            return Err(DriverError::Validation(format!(
                "unknown relationship '{}' for type '{}'",
                name,
                model.resource_type()
            )));
        };
        if relation.kind != RelationKind::BelongsTo {
            tracing::debug!(
                relationship = %name,
                resource_type = model.resource_type(),
                "ignoring linkage of a relationship owned by its target"
            );
            continue;
        }
        let target = relationship
            .data
            .single()
            .map(|identifier| Value::String(identifier.id.clone()))
            .unwrap_or(Value::Null);
        record.insert(relation.foreign_key.to_string(), target);
    }

    Ok(record)
}

/// String form of a stored id value.
pub(crate) fn render_id(value: &Value) -> String {
    match value {
        Value::String(id) => id.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
