//! Schema - type-erased model descriptor handed to drivers.

use std::marker::PhantomData;

use serde_json::Value;

use super::{Column, Model, Order, Record, Relation};
use crate::convert::ToResource;
use crate::document::{DocItem, Resource};
use crate::driver::Driver;
use crate::error::DriverError;
use crate::includes::Includes;

/// Everything a driver needs to know about a model, without its type.
pub trait Schema: Send + Sync {
    fn resource_type(&self) -> &'static str;

    fn columns(&self) -> Vec<Column>;

    fn relations(&self) -> Vec<Relation>;

    fn parent_key(&self) -> Option<&'static str>;

    fn default_order(&self) -> Option<Order>;

    /// Decode a stored (and preloaded) record into the model and convert it.
    fn to_resource(&self, record: Record, includes: &mut Includes)
        -> Result<Resource, DriverError>;

    /// Check that a preloaded record decodes into the model.
    fn validate(&self, record: Record) -> Result<(), DriverError>;

    fn fill_meta(&self, driver: &dyn Driver, doc: &mut DocItem) -> Result<(), DriverError>;
}

/// Schema of the concrete model `M`.
pub struct ModelSchema<M> {
    _marker: PhantomData<fn() -> M>,
}

impl<M> ModelSchema<M> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<M> Default for ModelSchema<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for ModelSchema<M> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<M> Copy for ModelSchema<M> {}

impl<M: Model + ToResource> Schema for ModelSchema<M> {
    fn resource_type(&self) -> &'static str {
        M::TYPE
    }

    fn columns(&self) -> Vec<Column> {
        M::columns()
    }

    fn relations(&self) -> Vec<Relation> {
        M::relations()
    }

    fn parent_key(&self) -> Option<&'static str> {
        M::parent_key()
    }

    fn default_order(&self) -> Option<Order> {
        M::default_order()
    }

    fn to_resource(
        &self,
        record: Record,
        includes: &mut Includes,
    ) -> Result<Resource, DriverError> {
        let model: M = serde_json::from_value(Value::Object(record))?;
        Ok(model.to_resource(includes))
    }

    fn validate(&self, record: Record) -> Result<(), DriverError> {
        serde_json::from_value::<M>(Value::Object(record))
            .map(drop)
            .map_err(|e| DriverError::Validation(format!("invalid {} record: {}", M::TYPE, e)))
    }

    fn fill_meta(&self, driver: &dyn Driver, doc: &mut DocItem) -> Result<(), DriverError> {
        M::fill_meta(driver, doc)
    }
}

/// Shorthand for `ModelSchema::<M>::new()`.
pub fn schema<M: Model + ToResource>() -> ModelSchema<M> {
    ModelSchema::new()
}
