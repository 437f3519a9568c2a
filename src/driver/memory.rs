//! MemoryDriver - HashMap-backed driver for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::{
    assemble_collection, assemble_item, check_decodes, check_type, new_id, preload, primary_data,
    record_from_resource, render_id, sort_records, validate_update, Driver, DriverConfig,
    RecordSource,
};
use crate::document::{DocCollection, DocItem};
use crate::error::DriverError;
use crate::model::{id_column, record_of, Model, Record, RelationKind, Schema, Table};

/// Internal stored representation of a record.
struct StoredRecord {
    record: Record,
    /// Insertion sequence; `find_all` returns records in this order.
    seq: u64,
}

#[derive(Default)]
struct MemoryState {
    records: HashMap<String, StoredRecord>,
    /// Join table name to `(source_id, target_id)` pairs.
    links: HashMap<String, Vec<(String, String)>>,
    next_seq: u64,
}

impl MemoryState {
    fn make_key(table: &str, id: &str) -> String {
        format!("{}:{}", table, id)
    }

    fn table_records(&self, table: &str) -> Vec<&StoredRecord> {
        let prefix = format!("{}:", table);
        let mut results: Vec<&StoredRecord> = self
            .records
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, stored)| stored)
            .collect();
        results.sort_by_key(|stored| stored.seq);
        results
    }

    fn insert(&mut self, key: String, record: Record) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.insert(key, StoredRecord { record, seq });
    }

    fn max_integer_id(&self, model: &dyn Schema) -> i64 {
        let column = id_column(&model.columns());
        self.table_records(model.resource_type())
            .iter()
            .filter_map(|stored| stored.record.get(column).and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
    }

    /// Drop join pairs of `id`: as source in the model's own join tables, as
    /// target in any join table.
    fn unlink(&mut self, model: &dyn Schema, id: &str) {
        let own_tables: Vec<String> = model
            .relations()
            .iter()
            .filter(|relation| relation.kind == RelationKind::ManyToMany)
            .map(|relation| relation.join_table_for(model.resource_type()))
            .collect();
        for (table, pairs) in self.links.iter_mut() {
            let own = own_tables.contains(table);
            pairs.retain(|(source_id, target_id)| !(own && source_id == id) && target_id != id);
        }
    }
}

impl RecordSource for MemoryState {
    fn fetch_by_id(&self, table: &Table, id: &str) -> Result<Option<Record>, DriverError> {
        Ok(self
            .records
            .get(&Self::make_key(table.name, id))
            .map(|stored| stored.record.clone()))
    }

    fn fetch_where(
        &self,
        table: &Table,
        column: &str,
        value: &str,
    ) -> Result<Vec<Record>, DriverError> {
        Ok(self
            .table_records(table.name)
            .into_iter()
            .filter(|stored| stored.record.get(column).map(render_id).as_deref() == Some(value))
            .map(|stored| stored.record.clone())
            .collect())
    }

    fn fetch_joined(
        &self,
        join_table: &str,
        owner_id: &str,
        target: &Table,
    ) -> Result<Vec<Record>, DriverError> {
        let Some(pairs) = self.links.get(join_table) else {
            return Ok(Vec::new());
        };
        let mut results = Vec::new();
        for (source_id, target_id) in pairs {
            if source_id != owner_id {
                continue;
            }
            if let Some(record) = self.fetch_by_id(target, target_id)? {
                results.push(record);
            }
        }
        Ok(results)
    }
}

/// In-memory driver (registered as `"memory"` and `"none"`).
///
/// Records are kept as raw column maps under `"TYPE:id"` keys. Clone-friendly
/// via Arc; clones share storage.
#[derive(Clone)]
pub struct MemoryDriver {
    state: Arc<RwLock<MemoryState>>,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDriver {
    /// Create a new empty driver.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }

    /// Store a typed model as-is, replacing any record with the same id.
    pub fn insert_model<M: Model>(&self, model: &M) -> Result<(), DriverError> {
        let record = record_of(model)?;
        let key = MemoryState::make_key(M::TYPE, &model.id());
        let mut state = self
            .state
            .write()
            .map_err(|_| DriverError::LockPoisoned("write"))?;
        state.insert(key, record);
        Ok(())
    }

    /// Add a `(source_id, target_id)` pair to a many-to-many join table.
    pub fn link(&self, join_table: &str, source_id: &str, target_id: &str) -> Result<(), DriverError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| DriverError::LockPoisoned("write"))?;
        state
            .links
            .entry(join_table.to_string())
            .or_default()
            .push((source_id.to_string(), target_id.to_string()));
        Ok(())
    }

    /// Number of records stored for `resource_type`.
    pub fn count(&self, resource_type: &str) -> Result<usize, DriverError> {
        let state = self
            .state
            .read()
            .map_err(|_| DriverError::LockPoisoned("read"))?;
        Ok(state.table_records(resource_type).len())
    }
}

impl Driver for MemoryDriver {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn connect(&self, config: &DriverConfig) -> Result<(), DriverError> {
        tracing::info!(adapter = %config.adapter, "memory driver ready, nothing to connect");
        Ok(())
    }

    fn find_all(
        &self,
        model: &dyn Schema,
        parent_id: Option<&str>,
        _query: &str,
    ) -> Result<DocCollection, DriverError> {
        tracing::debug!(resource_type = model.resource_type(), ?parent_id, "find_all");

        let records = {
            let state = self
                .state
                .read()
                .map_err(|_| DriverError::LockPoisoned("read"))?;

            let scope = model.parent_key().zip(parent_id);
            let mut records: Vec<Record> = state
                .table_records(model.resource_type())
                .into_iter()
                .filter(|stored| match scope {
                    Some((column, parent)) => {
                        stored.record.get(column).map(render_id).as_deref() == Some(parent)
                    }
                    None => true,
                })
                .map(|stored| stored.record.clone())
                .collect();
            if let Some(order) = model.default_order() {
                sort_records(&mut records, order);
            }
            for record in &mut records {
                preload(&*state, model, record)?;
            }
            records
        };

        assemble_collection(model, records)
    }

    fn find_record(
        &self,
        model: &dyn Schema,
        id: &str,
        _query: &str,
    ) -> Result<DocItem, DriverError> {
        tracing::debug!(resource_type = model.resource_type(), id, "find_record");

        let record = {
            let state = self
                .state
                .read()
                .map_err(|_| DriverError::LockPoisoned("read"))?;

            let key = MemoryState::make_key(model.resource_type(), id);
            let mut record = state
                .records
                .get(&key)
                .map(|stored| stored.record.clone())
                .ok_or_else(|| DriverError::not_found(model.resource_type(), id))?;
            preload(&*state, model, &mut record)?;
            record
        };

        assemble_item(self, model, record)
    }

    fn delete(&self, model: &dyn Schema, id: &str) -> Result<(), DriverError> {
        tracing::debug!(resource_type = model.resource_type(), id, "delete");

        let mut state = self
            .state
            .write()
            .map_err(|_| DriverError::LockPoisoned("write"))?;

        let key = MemoryState::make_key(model.resource_type(), id);
        if state.records.remove(&key).is_none() {
            return Err(DriverError::not_found(model.resource_type(), id));
        }
        state.unlink(model, id);
        Ok(())
    }

    fn update(&self, model: &dyn Schema, id: &str, doc: &DocItem) -> Result<(), DriverError> {
        tracing::debug!(resource_type = model.resource_type(), id, "update");

        let resource = validate_update(model, id, doc)?;
        let changes = record_from_resource(model, resource)?;

        let mut state = self
            .state
            .write()
            .map_err(|_| DriverError::LockPoisoned("write"))?;

        let key = MemoryState::make_key(model.resource_type(), id);
        let mut merged = state
            .records
            .get(&key)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| DriverError::not_found(model.resource_type(), id))?;
        merged.extend(changes);
        check_decodes(&*state, model, &merged)?;

        if let Some(stored) = state.records.get_mut(&key) {
            stored.record = merged;
        }
        Ok(())
    }

    fn create(&self, model: &dyn Schema, doc: &DocItem) -> Result<Option<DocItem>, DriverError> {
        let resource = primary_data(doc)?;
        check_type(model, resource)?;
        let mut record = record_from_resource(model, resource)?;
        let client_id = !resource.id.is_empty();

        let id = {
            let mut state = self
                .state
                .write()
                .map_err(|_| DriverError::LockPoisoned("write"))?;

            let id_value = new_id(model, &resource.id, || Ok(state.max_integer_id(model) + 1))?;
            let id = render_id(&id_value);
            tracing::debug!(resource_type = model.resource_type(), id = %id, client_id, "create");

            let key = MemoryState::make_key(model.resource_type(), &id);
            if state.records.contains_key(&key) {
                return Err(DriverError::Conflict {
                    resource_type: model.resource_type().to_string(),
                    id,
                });
            }
            record.insert(id_column(&model.columns()).to_string(), id_value);
            check_decodes(&*state, model, &record)?;
            state.insert(key, record);
            id
        };

        if client_id {
            return Ok(None);
        }
        self.find_record(model, &id, "").map(Some)
    }
}
