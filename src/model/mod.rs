//! Models - storage metadata for types exposed as JSON:API resources.
//!
//! A model knows its resource type (table / collection name), how to read
//! its id, which fields are stored columns, and which fields are
//! relationships to other models. Drivers use this metadata in place of
//! runtime reflection.
//!
//! ## Example
//!
//! ```ignore
//! use jsonapi_driver::Model;
//!
//! #[derive(Serialize, Deserialize, Model)]
//! #[jsonapi(type = "people")]
//! struct Person {
//!     id: String,
//!     first_name: String,
//! }
//!
//! assert_eq!(Person::TYPE, "people");
//! ```

mod schema;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::document::DocItem;
use crate::driver::Driver;
use crate::error::DriverError;

pub use schema::{schema, ModelSchema, Schema};

/// A raw stored record: column (field) name to value.
pub type Record = Map<String, Value>;

/// Trait for types that drivers can store and expose as resources.
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Resource type; doubles as the table or collection name.
    const TYPE: &'static str;

    /// Returns the resource id, empty when not yet persisted.
    fn id(&self) -> String;

    /// Stored columns, id first.
    fn columns() -> Vec<Column>;

    fn relations() -> Vec<Relation> {
        Vec::new()
    }

    /// Column that scopes `find_all` by parent id, if any.
    fn parent_key() -> Option<&'static str> {
        None
    }

    /// Sort order of `find_all`; insertion order when `None`.
    fn default_order() -> Option<Order> {
        None
    }

    /// Runs on the document built by `find_record`.
    fn fill_meta(_driver: &dyn Driver, _doc: &mut DocItem) -> Result<(), DriverError> {
        Ok(())
    }

    fn table() -> Table
    where
        Self: Sized,
    {
        Table {
            name: Self::TYPE,
            columns: Self::columns,
        }
    }
}

/// Document meta supplied by a model, possibly read through the driver.
///
/// `#[derive(Model)]` with `#[jsonapi(meta)]` wires this into
/// [`Model::fill_meta`] after moving a `data` attribute into `meta.data`.
pub trait MetaFiller {
    fn add_meta(driver: &dyn Driver, doc: &mut DocItem) -> Result<(), DriverError>;
}

/// Default `find_all` ordering by one stored column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

impl Order {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// How a stored column participates in the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Primary key; becomes the resource id.
    Id,
    /// Plain field; becomes an attribute.
    Attribute,
    /// Carries a relationship; never an attribute.
    ForeignKey,
}

/// Storage type of a column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Boolean,
    /// Nested values, stored as JSON text by relational drivers.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Field name in the Rust type and in storage.
    pub name: &'static str,
    /// Attribute key on the wire.
    pub attribute: &'static str,
    pub kind: ColumnKind,
    pub ty: ColumnType,
}

impl Column {
    pub const fn new(
        name: &'static str,
        attribute: &'static str,
        kind: ColumnKind,
        ty: ColumnType,
    ) -> Self {
        Self {
            name,
            attribute,
            kind,
            ty,
        }
    }

    pub fn is_attribute(&self) -> bool {
        self.kind == ColumnKind::Attribute
    }
}

/// A model's table: name plus lazily built column list.
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub columns: fn() -> Vec<Column>,
}

impl Table {
    pub fn columns(&self) -> Vec<Column> {
        (self.columns)()
    }

    /// Name of the primary key column.
    pub fn id_column(&self) -> &'static str {
        id_column(&self.columns())
    }
}

pub(crate) fn id_column(columns: &[Column]) -> &'static str {
    columns
        .iter()
        .find(|c| c.kind == ColumnKind::Id)
        .map(|c| c.name)
        .unwrap_or("id")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Owner holds the foreign key of its target.
    BelongsTo,
    /// Target holds the foreign key of its owner; at most one target.
    HasOne,
    /// Target holds the foreign key of its owner.
    HasMany,
    /// Linked through a join table of `source_id`/`target_id` pairs.
    ManyToMany,
}

impl RelationKind {
    pub fn is_to_one(&self) -> bool {
        matches!(self, RelationKind::BelongsTo | RelationKind::HasOne)
    }
}

/// A relationship field of a model.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Field name in the Rust type (and key in a preloaded record).
    pub field: &'static str,
    /// Relationship name on the wire.
    pub name: &'static str,
    pub kind: RelationKind,
    pub target: Table,
    /// Foreign key column: on the owner for `BelongsTo`, on the target otherwise.
    pub foreign_key: &'static str,
    /// Join table for `ManyToMany`.
    pub join_table: Option<&'static str>,
}

impl Relation {
    /// Join table name, defaulting to `<owner>_<field>`.
    pub fn join_table_for(&self, owner: &str) -> String {
        match self.join_table {
            Some(table) => table.to_string(),
            None => format!("{}_{}", owner, self.field),
        }
    }
}

/// Serialize a model into a storable record, dropping relationship fields.
pub fn record_of<M: Model>(model: &M) -> Result<Record, DriverError> {
    match serde_json::to_value(model)? {
        Value::Object(mut record) => {
            for relation in M::relations() {
                record.remove(relation.field);
            }
            Ok(record)
        }
        other => Err(DriverError::Serde(format!(
            "model {} serialized to a non-object value: {}",
            M::TYPE,
            other
        ))),
    }
}
