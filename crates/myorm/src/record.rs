//! Layout-driven record instances bound to one table row.
//!
//! [`Record::materialize`] resolves (and caches) the table's [`FieldLayout`],
//! coerces row values to the resolved field types and exposes accessors with
//! key/generated-column protection: every field is readable, but mutating a
//! protected field is rejected. Row-scoped operations (`load`, `insert`,
//! `update`, `delete`, `refresh`) go through the query builder and a scoped
//! collaborator [`Session`](crate::client::Session).

use crate::client::{DbClient, Session};
use crate::error::{OrmError, OrmResult};
use crate::query::{delete_from, insert_into, select_from, update};
use crate::row::Row;
use crate::schema::{FieldLayout, FieldVisibility};
use crate::types::enum_registry;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A record bound to one row of one table.
#[derive(Debug, Clone)]
pub struct Record {
    layout: Arc<FieldLayout>,
    values: HashMap<String, Value>,
}

impl Record {
    /// Materialize a record from row data.
    ///
    /// Resolves the table's layout (introspecting the schema on first use per
    /// process), then populates each layout field from the row, coercing values
    /// to the field's resolved type. Fields absent from the row hold NULL.
    pub fn materialize<C: DbClient + ?Sized>(
        client: &mut C,
        table: &str,
        row: &Row,
    ) -> OrmResult<Self> {
        let layout = FieldLayout::for_table(client, table)?;
        Ok(Self::from_layout(layout, row))
    }

    fn from_layout(layout: Arc<FieldLayout>, row: &Row) -> Self {
        let registry = enum_registry();
        let mut values = HashMap::with_capacity(layout.len());
        for field in layout.fields() {
            let raw = row.get(&field.name).cloned().unwrap_or(Value::Null);
            values.insert(field.name.clone(), field.value_type.coerce(raw, registry));
        }
        Self { layout, values }
    }

    /// Load the record whose key column equals `key`.
    pub fn load<C: DbClient + ?Sized>(
        client: &mut C,
        table: &str,
        key: impl Into<Value>,
    ) -> OrmResult<Self> {
        let layout = FieldLayout::for_table(client, table)?;
        let key_field = layout
            .key_field()
            .ok_or_else(|| OrmError::MissingGuardColumn(table.to_string()))?;
        let key = key.into();

        let columns: Vec<&str> = layout.fields().map(|f| f.name.as_str()).collect();
        let sql = select_from(table, &columns)
            .eq(&key_field.name, key.clone())
            .render()?;

        let row = {
            let mut session = Session::open(client)?;
            session.execute(&sql)?;
            session.fetch_one()?
        };
        let row = row.ok_or_else(|| {
            OrmError::not_found(format!(
                "{table}.{} = {}",
                key_field.name,
                key.sql_literal()
            ))
        })?;
        Ok(Self::from_layout(layout, &row))
    }

    /// Table this record belongs to.
    pub fn table(&self) -> &str {
        self.layout.table()
    }

    /// The resolved layout backing this record.
    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// Read accessor; works for protected and open fields alike.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Value of the key field, if the table has one.
    pub fn key_value(&self) -> Option<&Value> {
        self.layout
            .key_field()
            .and_then(|f| self.values.get(&f.name))
    }

    /// Mutate an open field, coercing the value to the field's resolved type.
    ///
    /// Key and generated fields are read-only; mutating them fails with
    /// [`OrmError::ReadOnlyField`].
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> OrmResult<()> {
        let info = self
            .layout
            .field(field)
            .ok_or_else(|| OrmError::UnknownField(field.to_string()))?;
        if info.visibility == FieldVisibility::Protected {
            return Err(OrmError::ReadOnlyField(field.to_string()));
        }
        let coerced = info.value_type.coerce(value.into(), enum_registry());
        self.values.insert(field.to_string(), coerced);
        Ok(())
    }

    /// INSERT this record's non-generated fields and back-fill the key field
    /// from the engine's last-inserted id. Returns that id.
    pub fn insert<C: DbClient + ?Sized>(&mut self, client: &mut C) -> OrmResult<u64> {
        let mut query = insert_into(self.table());
        for field in self.layout.fields().filter(|f| !f.is_generated) {
            let value = self.values.get(&field.name).cloned().unwrap_or(Value::Null);
            query = query.set(&field.name, value);
        }
        let sql = query.render()?;
        tracing::debug!(table = self.table(), "inserting record");

        let id = {
            let mut session = Session::open(client)?;
            session.execute(&sql)?;
            session.last_insert_id()?
        };
        if let Some(key_field) = self.layout.key_field()
            && key_field.is_generated
        {
            // Back-fill bypasses set(): the key is protected against callers,
            // not against the engine-assigned id.
            self.values
                .insert(key_field.name.clone(), Value::Int(id as i64));
        }
        Ok(id)
    }

    /// UPDATE this record's open fields, keyed on the key column.
    pub fn update<C: DbClient + ?Sized>(&self, client: &mut C) -> OrmResult<()> {
        let (key_field, key) = self.keyed()?;
        let mut query = update(self.table()).guard_column(&key_field);
        for field in self
            .layout
            .fields()
            .filter(|f| f.visibility == FieldVisibility::Open)
        {
            let value = self.values.get(&field.name).cloned().unwrap_or(Value::Null);
            query = query.set(&field.name, value);
        }
        let sql = query.eq(&key_field, key).render()?;
        tracing::debug!(table = self.table(), "updating record");

        let mut session = Session::open(client)?;
        session.execute(&sql)
    }

    /// DELETE this record's row, keyed on the key column.
    pub fn delete<C: DbClient + ?Sized>(&self, client: &mut C) -> OrmResult<()> {
        let (key_field, key) = self.keyed()?;
        let sql = delete_from(self.table())
            .guard_column(&key_field)
            .eq(&key_field, key)
            .render()?;
        tracing::debug!(table = self.table(), "deleting record");

        let mut session = Session::open(client)?;
        session.execute(&sql)
    }

    /// Re-read this record's row and replace the field values.
    pub fn refresh<C: DbClient + ?Sized>(&mut self, client: &mut C) -> OrmResult<()> {
        let (_, key) = self.keyed()?;
        let table = self.table().to_string();
        let fresh = Self::load(client, &table, key)?;
        self.values = fresh.values;
        Ok(())
    }

    /// Key column name and current key value; keyed operations refuse to run
    /// without them rather than emitting an invalid comparison.
    fn keyed(&self) -> OrmResult<(String, Value)> {
        let key_field = self
            .layout
            .key_field()
            .ok_or_else(|| OrmError::MissingGuardColumn(self.table().to_string()))?;
        let key = self
            .values
            .get(&key_field.name)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| OrmError::MissingGuardColumn(self.table().to_string()))?;
        Ok((key_field.name.clone(), key))
    }
}
