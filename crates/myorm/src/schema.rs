//! Table schema metadata and the cached per-table field layout.
//!
//! A [`ColumnInfo`] is one row of `DESCRIBE`-style metadata. A [`FieldLayout`]
//! is the derived, ordered field set for a table (value type and visibility per
//! field), computed once per process per table name and cached; the cache mutex
//! is held across the introspection round trip so concurrent first
//! materializations of the same table serialize and enum synthesis happens
//! exactly once.

use crate::client::{DbClient, Session};
use crate::error::OrmResult;
use crate::row::Row;
use crate::types::{EnumRegistry, ValueType, enum_registry, resolve_type};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

/// One row of schema metadata describing a table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Raw declared type string, e.g. `varchar(80)` or `enum('A','B')`.
    pub declared_type: String,
    /// Whether this column is (part of) the primary key.
    pub is_key: bool,
    /// Whether the engine generates this column's value (auto-increment or
    /// default-generated).
    pub is_generated: bool,
}

impl ColumnInfo {
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        is_key: bool,
        is_generated: bool,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            is_key,
            is_generated,
        }
    }

    /// Parse one MySQL-family `DESCRIBE` result row
    /// (`Field` / `Type` / `Key` / `Extra`).
    pub fn from_describe_row(row: &Row) -> OrmResult<Self> {
        let name = row.try_get_text("Field")?.to_string();
        let declared_type = row.try_get_text("Type")?.to_string();
        let is_key = row
            .get("Key")
            .and_then(|v| v.as_str())
            .is_some_and(|k| k == "PRI");
        let extra = row
            .get("Extra")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_lowercase();
        let is_generated = ["auto_increment", "default_generated", "auto_generated"]
            .iter()
            .any(|marker| extra.contains(marker));
        Ok(Self {
            name,
            declared_type,
            is_key,
            is_generated,
        })
    }
}

/// Field accessor visibility derived from key/generated status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldVisibility {
    /// Readable and writable.
    Open,
    /// Read-only accessor; mutation is rejected.
    Protected,
}

/// One resolved field of a table layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub value_type: ValueType,
    pub visibility: FieldVisibility,
    pub is_key: bool,
    pub is_generated: bool,
}

/// The resolved, ordered field set for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldLayout {
    table: String,
    fields: Vec<FieldInfo>,
}

impl FieldLayout {
    /// Derive a layout from schema metadata. Key and generated columns become
    /// protected fields; a field name already present is not inserted twice.
    pub fn from_columns(table: &str, columns: &[ColumnInfo], registry: &EnumRegistry) -> Self {
        let mut layout = Self {
            table: table.to_string(),
            fields: Vec::with_capacity(columns.len()),
        };
        for column in columns {
            if layout.field(&column.name).is_some() {
                continue;
            }
            let protected = column.is_key || column.is_generated;
            layout.fields.push(FieldInfo {
                name: column.name.clone(),
                value_type: resolve_type(
                    &column.declared_type,
                    table,
                    Some(&column.name),
                    registry,
                ),
                visibility: if protected {
                    FieldVisibility::Protected
                } else {
                    FieldVisibility::Open
                },
                is_key: column.is_key,
                is_generated: column.is_generated,
            });
        }
        layout
    }

    /// Layout for a table, introspecting on first use and cached thereafter.
    ///
    /// The `DESCRIBE` round trip runs inside a scoped [`Session`]; the
    /// collaborator connection closes on every exit path. Introspection
    /// failures propagate unchanged.
    pub fn for_table<C: DbClient + ?Sized>(client: &mut C, table: &str) -> OrmResult<Arc<Self>> {
        let mut cache = layouts().lock().unwrap_or_else(|e| e.into_inner());
        if let Some(layout) = cache.get(table) {
            return Ok(layout.clone());
        }
        tracing::debug!(table, "field layout cache miss, introspecting schema");
        let columns = {
            let mut session = Session::open(client)?;
            session.describe(table)?
        };
        let layout = Arc::new(Self::from_columns(table, &columns, enum_registry()));
        cache.insert(table.to_string(), layout.clone());
        Ok(layout)
    }

    /// Table this layout describes.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Fields in column order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The first key field, if the table has one.
    pub fn key_field(&self) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.is_key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

static LAYOUTS: LazyLock<Mutex<HashMap<String, Arc<FieldLayout>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn layouts() -> &'static Mutex<HashMap<String, Arc<FieldLayout>>> {
    &LAYOUTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumKey;
    use crate::value::Value;

    fn describe_row(field: &str, ty: &str, key: &str, extra: &str) -> Row {
        Row::from_pairs([
            ("Field", Value::from(field)),
            ("Type", Value::from(ty)),
            ("Null", Value::from("NO")),
            ("Key", Value::from(key)),
            ("Default", Value::Null),
            ("Extra", Value::from(extra)),
        ])
    }

    #[test]
    fn test_describe_row_parsing() {
        let info =
            ColumnInfo::from_describe_row(&describe_row("id", "int(11)", "PRI", "auto_increment"))
                .unwrap();
        assert_eq!(info.name, "id");
        assert_eq!(info.declared_type, "int(11)");
        assert!(info.is_key);
        assert!(info.is_generated);

        let info =
            ColumnInfo::from_describe_row(&describe_row("name", "varchar(80)", "", "")).unwrap();
        assert!(!info.is_key);
        assert!(!info.is_generated);

        let info = ColumnInfo::from_describe_row(&describe_row(
            "createdAt",
            "timestamp",
            "",
            "DEFAULT_GENERATED",
        ))
        .unwrap();
        assert!(info.is_generated);
    }

    #[test]
    fn test_describe_row_missing_field_errors() {
        let row = Row::from_pairs([("Type", Value::from("int"))]);
        assert!(ColumnInfo::from_describe_row(&row).is_err());
    }

    #[test]
    fn test_layout_visibility() {
        let registry = EnumRegistry::new();
        let layout = FieldLayout::from_columns(
            "Users",
            &[
                ColumnInfo::new("id", "int(11)", true, true),
                ColumnInfo::new("name", "varchar(80)", false, false),
                ColumnInfo::new("status", "enum('A','B')", false, false),
            ],
            &registry,
        );

        assert_eq!(layout.len(), 3);
        let id = layout.field("id").unwrap();
        assert_eq!(id.visibility, FieldVisibility::Protected);
        assert!(id.is_key);

        let name = layout.field("name").unwrap();
        assert_eq!(name.visibility, FieldVisibility::Open);
        assert_eq!(name.value_type, ValueType::Text);

        let status = layout.field("status").unwrap();
        assert_eq!(
            status.value_type,
            ValueType::Enum(EnumKey::new("Users", "status"))
        );
        assert_eq!(layout.key_field().unwrap().name, "id");
    }

    #[test]
    fn test_duplicate_columns_accumulate_once() {
        let registry = EnumRegistry::new();
        let layout = FieldLayout::from_columns(
            "Users",
            &[
                ColumnInfo::new("id", "int(11)", true, true),
                ColumnInfo::new("id", "int(11)", true, true),
            ],
            &registry,
        );
        assert_eq!(layout.len(), 1);
    }
}
