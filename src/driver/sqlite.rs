//! SqliteDriver - relational driver backed by rusqlite (bundled SQLite).
//!
//! Each model maps to one table named after its resource type, one column
//! per stored field. Many-to-many relations use join tables with
//! `source_id`/`target_id` columns.

use std::sync::Mutex;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode};
use serde_json::{Number, Value};

use super::{
    assemble_collection, assemble_item, check_decodes, check_type, new_id, preload, primary_data,
    record_from_resource, render_id, validate_update, Driver, DriverConfig, RecordSource,
};
use crate::document::{DocCollection, DocItem};
use crate::error::DriverError;
use crate::model::{
    id_column, record_of, Column, ColumnType, Model, Record, RelationKind, Schema, Table,
};

/// Relational driver (registered as `"sqlite"`).
///
/// All access goes through one connection behind a mutex, so operations on a
/// driver instance are fully serialized.
pub struct SqliteDriver {
    conn: Mutex<Option<Connection>>,
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteDriver {
    /// Create a driver with no connection; call [`Driver::connect`] next.
    pub fn new() -> Self {
        Self {
            conn: Mutex::new(None),
        }
    }

    /// Create a driver connected to an in-memory database.
    pub fn open_in_memory() -> Result<Self, DriverError> {
        let driver = Self::new();
        driver.connect(&DriverConfig::new("sqlite", ":memory:"))?;
        Ok(driver)
    }

    /// Create the model's table (and its join tables) if missing.
    pub fn ensure_table(&self, model: &dyn Schema) -> Result<(), DriverError> {
        let columns = model.columns();
        let id = id_column(&columns);

        let definitions: Vec<String> = columns
            .iter()
            .map(|column| {
                if column.name == id {
                    format!("{} {} PRIMARY KEY", quote_ident(column.name), sql_type(column.ty))
                } else {
                    format!("{} {}", quote_ident(column.name), sql_type(column.ty))
                }
            })
            .collect();

        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            quote_ident(model.resource_type()),
            definitions.join(", ")
        );
        for relation in model.relations() {
            if relation.kind == RelationKind::ManyToMany {
                sql.push_str(&format!(
                    "CREATE TABLE IF NOT EXISTS {} (source_id TEXT NOT NULL, target_id TEXT NOT NULL);",
                    quote_ident(&relation.join_table_for(model.resource_type()))
                ));
            }
        }

        self.with_conn("ensure_table", |conn| {
            conn.execute_batch(&sql)?;
            Ok(())
        })
    }

    /// Store an instance directly, bypassing document decoding.
    pub fn insert_model<M: Model>(&self, model: &M) -> Result<(), DriverError> {
        let record = record_of(model)?;
        self.with_conn("insert_model", |conn| {
            insert_record(conn, M::TYPE, &record)?;
            Ok(())
        })
    }

    /// Add a `(source_id, target_id)` pair to a many-to-many join table.
    pub fn link(&self, join_table: &str, source_id: &str, target_id: &str) -> Result<(), DriverError> {
        let sql = format!(
            "INSERT INTO {} (source_id, target_id) VALUES (?1, ?2)",
            quote_ident(join_table)
        );
        self.with_conn("link", |conn| {
            conn.execute(&sql, [source_id, target_id])?;
            Ok(())
        })
    }

    /// Run raw SQL statements against the connection.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DriverError> {
        self.with_conn("execute_batch", |conn| {
            conn.execute_batch(sql)?;
            Ok(())
        })
    }

    fn with_conn<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Connection) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| DriverError::LockPoisoned(operation))?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| DriverError::Connection("sqlite driver is not connected".into()))?;
        f(conn)
    }
}

/// Read access for preloading, bound to a locked connection.
struct Session<'a> {
    conn: &'a Connection,
}

impl RecordSource for Session<'_> {
    fn fetch_by_id(&self, table: &Table, id: &str) -> Result<Option<Record>, DriverError> {
        let columns = table.columns();
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(table.name),
            quote_ident(id_column(&columns))
        );
        let mut records = query_records(self.conn, &sql, &[text(id)], &columns)?;
        Ok(if records.is_empty() {
            None
        } else {
            Some(records.swap_remove(0))
        })
    }

    fn fetch_where(
        &self,
        table: &Table,
        column: &str,
        value: &str,
    ) -> Result<Vec<Record>, DriverError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1 ORDER BY rowid",
            quote_ident(table.name),
            quote_ident(column)
        );
        query_records(self.conn, &sql, &[text(value)], &table.columns())
    }

    fn fetch_joined(
        &self,
        join_table: &str,
        owner_id: &str,
        target: &Table,
    ) -> Result<Vec<Record>, DriverError> {
        let columns = target.columns();
        let sql = format!(
            "SELECT t.* FROM {} t JOIN {} j ON j.target_id = t.{} WHERE j.source_id = ?1 ORDER BY j.rowid",
            quote_ident(target.name),
            quote_ident(join_table),
            quote_ident(id_column(&columns))
        );
        query_records(self.conn, &sql, &[text(owner_id)], &columns)
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self, config: &DriverConfig) -> Result<(), DriverError> {
        let conn = if config.url.is_empty() || config.url == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.url)
        }
        .map_err(|e| DriverError::Connection(e.to_string()))?;

        if config.url != ":memory:" && !config.url.is_empty() {
            conn.execute_batch("PRAGMA journal_mode=WAL;")
                .map_err(|e| DriverError::Connection(e.to_string()))?;
        }

        let mut guard = self
            .conn
            .lock()
            .map_err(|_| DriverError::LockPoisoned("connect"))?;
        *guard = Some(conn);
        tracing::info!(url = %config.url, "sqlite driver connected");
        Ok(())
    }

    fn find_all(
        &self,
        model: &dyn Schema,
        parent_id: Option<&str>,
        _query: &str,
    ) -> Result<DocCollection, DriverError> {
        tracing::debug!(resource_type = model.resource_type(), ?parent_id, "find_all");

        let columns = model.columns();
        let records = self.with_conn("find_all", |conn| {
            let mut sql = format!("SELECT * FROM {}", quote_ident(model.resource_type()));
            let mut params = Vec::new();
            if let (Some(column), Some(parent)) = (model.parent_key(), parent_id) {
                sql.push_str(&format!(" WHERE {} = ?1", quote_ident(column)));
                params.push(text(parent));
            }
            match model.default_order() {
                Some(order) => sql.push_str(&format!(
                    " ORDER BY {} {}, rowid",
                    quote_ident(order.column),
                    if order.descending { "DESC" } else { "ASC" }
                )),
                None => sql.push_str(" ORDER BY rowid"),
            }

            let mut records = query_records(conn, &sql, &params, &columns)?;
            let session = Session { conn };
            for record in &mut records {
                preload(&session, model, record)?;
            }
            Ok(records)
        })?;

        assemble_collection(model, records)
    }

    fn find_record(
        &self,
        model: &dyn Schema,
        id: &str,
        _query: &str,
    ) -> Result<DocItem, DriverError> {
        tracing::debug!(resource_type = model.resource_type(), id, "find_record");

        let columns = model.columns();
        let record = self.with_conn("find_record", |conn| {
            let sql = format!(
                "SELECT * FROM {} WHERE {} = ?1",
                quote_ident(model.resource_type()),
                quote_ident(id_column(&columns))
            );
            let mut stmt = conn.prepare(&sql)?;
            let names = column_names(&stmt);
            let mut record = stmt
                .query_row([id], |row| read_record(row, &names, &columns))
                .map_err(|e| not_found_or(e, model, id))?;

            preload(&Session { conn }, model, &mut record)?;
            Ok(record)
        })?;

        assemble_item(self, model, record)
    }

    fn delete(&self, model: &dyn Schema, id: &str) -> Result<(), DriverError> {
        tracing::debug!(resource_type = model.resource_type(), id, "delete");

        let columns = model.columns();
        let join_tables: Vec<String> = model
            .relations()
            .iter()
            .filter(|relation| relation.kind == RelationKind::ManyToMany)
            .map(|relation| relation.join_table_for(model.resource_type()))
            .collect();

        self.with_conn("delete", |conn| {
            let sql = format!(
                "DELETE FROM {} WHERE {} = ?1",
                quote_ident(model.resource_type()),
                quote_ident(id_column(&columns))
            );
            if conn.execute(&sql, [id])? == 0 {
                return Err(DriverError::not_found(model.resource_type(), id));
            }
            for table in &join_tables {
                let sql = format!("DELETE FROM {} WHERE source_id = ?1", quote_ident(table));
                conn.execute(&sql, [id])?;
            }
            Ok(())
        })
    }

    fn update(&self, model: &dyn Schema, id: &str, doc: &DocItem) -> Result<(), DriverError> {
        tracing::debug!(resource_type = model.resource_type(), id, "update");

        let resource = validate_update(model, id, doc)?;
        let changes = record_from_resource(model, resource)?;
        let columns = model.columns();
        let id_name = id_column(&columns);

        self.with_conn("update", |conn| {
            let sql = format!(
                "SELECT * FROM {} WHERE {} = ?1",
                quote_ident(model.resource_type()),
                quote_ident(id_name)
            );
            let mut stmt = conn.prepare(&sql)?;
            let names = column_names(&stmt);
            let mut merged = stmt
                .query_row([id], |row| read_record(row, &names, &columns))
                .map_err(|e| not_found_or(e, model, id))?;
            for (column, value) in &changes {
                merged.insert(column.clone(), value.clone());
            }
            check_decodes(&Session { conn }, model, &merged)?;

            if changes.is_empty() {
                return Ok(());
            }
            let assignments: Vec<String> = changes
                .keys()
                .enumerate()
                .map(|(i, column)| format!("{} = ?{}", quote_ident(column), i + 1))
                .collect();
            let sql = format!(
                "UPDATE {} SET {} WHERE {} = ?{}",
                quote_ident(model.resource_type()),
                assignments.join(", "),
                quote_ident(id_name),
                changes.len() + 1
            );
            let mut params: Vec<SqlValue> = changes.values().map(to_sql).collect();
            params.push(text(id));

            match conn.execute(&sql, params_from_iter(params.iter()))? {
                0 => Err(DriverError::not_found(model.resource_type(), id)),
                _ => Ok(()),
            }
        })
    }

    fn create(&self, model: &dyn Schema, doc: &DocItem) -> Result<Option<DocItem>, DriverError> {
        let resource = primary_data(doc)?;
        check_type(model, resource)?;
        let mut record = record_from_resource(model, resource)?;
        let client_id = !resource.id.is_empty();

        let columns = model.columns();
        let id_name = id_column(&columns);

        let id = self.with_conn("create", |conn| {
            let id_value = new_id(model, &resource.id, || {
                let sql = format!(
                    "SELECT COALESCE(MAX({}), 0) + 1 FROM {}",
                    quote_ident(id_name),
                    quote_ident(model.resource_type())
                );
                Ok(conn.query_row(&sql, [], |row| row.get::<_, i64>(0))?)
            })?;
            let id = render_id(&id_value);
            tracing::debug!(resource_type = model.resource_type(), id = %id, client_id, "create");

            record.insert(id_name.to_string(), id_value);
            check_decodes(&Session { conn }, model, &record)?;

            match insert_record(conn, model.resource_type(), &record) {
                Ok(_) => Ok(id),
                Err(rusqlite::Error::SqliteFailure(failure, _))
                    if failure.code == ErrorCode::ConstraintViolation =>
                {
                    Err(DriverError::Conflict {
                        resource_type: model.resource_type().to_string(),
                        id,
                    })
                }
                Err(e) => Err(e.into()),
            }
        })?;

        if client_id {
            return Ok(None);
        }
        self.find_record(model, &id, "").map(Some)
    }
}

/// Normalize SQLite's "no rows" signal into `NotFound`.
fn not_found_or(err: rusqlite::Error, model: &dyn Schema, id: &str) -> DriverError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => DriverError::not_found(model.resource_type(), id),
        other => other.into(),
    }
}

fn insert_record(conn: &Connection, table: &str, record: &Record) -> rusqlite::Result<usize> {
    let names: Vec<String> = record.keys().map(|k| quote_ident(k)).collect();
    let placeholders: Vec<String> = (1..=record.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        names.join(", "),
        placeholders.join(", ")
    );
    let params: Vec<SqlValue> = record.values().map(to_sql).collect();
    conn.execute(&sql, params_from_iter(params.iter()))
}

fn query_records(
    conn: &Connection,
    sql: &str,
    params: &[SqlValue],
    columns: &[Column],
) -> Result<Vec<Record>, DriverError> {
    let mut stmt = conn.prepare(sql)?;
    let names = column_names(&stmt);
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        read_record(row, &names, columns)
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().iter().map(|s| s.to_string()).collect()
}

fn read_record(
    row: &rusqlite::Row<'_>,
    names: &[String],
    columns: &[Column],
) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (idx, name) in names.iter().enumerate() {
        let ty = columns.iter().find(|c| c.name == name.as_str()).map(|c| c.ty);
        record.insert(name.clone(), from_sql(row.get_ref(idx)?, ty));
    }
    Ok(record)
}

/// Convert a stored value back to JSON using the declared column type.
fn from_sql(value: ValueRef<'_>, ty: Option<ColumnType>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => match ty {
            Some(ColumnType::Boolean) => Value::Bool(i != 0),
            _ => Value::Number(i.into()),
        },
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            match ty {
                Some(ColumnType::Json) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
                _ => Value::String(text),
            }
        }
        ValueRef::Blob(_) => Value::Null,
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        nested => SqlValue::Text(nested.to_string()),
    }
}

fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

fn sql_type(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Text | ColumnType::Json => "TEXT",
        ColumnType::Integer | ColumnType::Boolean => "INTEGER",
        ColumnType::Real => "REAL",
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
