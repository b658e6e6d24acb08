//! End-to-end materialization tests against an in-memory fake collaborator.
//!
//! The field-layout cache and enum registry are process-wide, so every test
//! works against its own table name.

use myorm::{
    ColumnInfo, DbClient, EnumValue, FieldVisibility, OrmError, OrmResult, Record, Row, Value,
    enum_registry,
};
use std::collections::{HashMap, VecDeque};

#[derive(Default)]
struct FakeDb {
    tables: HashMap<String, Vec<ColumnInfo>>,
    queued_rows: VecDeque<Row>,
    executed: Vec<String>,
    describes: Vec<String>,
    connected: bool,
    connects: u32,
    disconnects: u32,
    next_insert_id: u64,
}

impl FakeDb {
    fn with_table(table: &str, columns: Vec<ColumnInfo>) -> Self {
        let mut db = Self::default();
        db.tables.insert(table.to_string(), columns);
        db
    }

    fn queue_row(&mut self, row: Row) {
        self.queued_rows.push_back(row);
    }
}

impl DbClient for FakeDb {
    fn connect(&mut self) -> OrmResult<()> {
        if !self.connected {
            self.connected = true;
            self.connects += 1;
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            self.disconnects += 1;
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn describe(&mut self, table: &str) -> OrmResult<Vec<ColumnInfo>> {
        self.describes.push(table.to_string());
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| OrmError::database(format!("DESCRIBE {table}"), "table not found"))
    }

    fn execute(&mut self, statement: &str) -> OrmResult<()> {
        self.executed.push(statement.to_string());
        Ok(())
    }

    fn fetch_all(&mut self) -> OrmResult<Vec<Row>> {
        Ok(self.queued_rows.drain(..).collect())
    }

    fn fetch_one(&mut self) -> OrmResult<Option<Row>> {
        Ok(self.queued_rows.pop_front())
    }

    fn last_insert_id(&mut self) -> OrmResult<u64> {
        Ok(self.next_insert_id)
    }
}

fn disc_columns() -> Vec<ColumnInfo> {
    vec![
        ColumnInfo::new("id", "int(11)", true, true),
        ColumnInfo::new("title", "varchar(120)", false, false),
        ColumnInfo::new("support", "enum('CD','VINYL','DIGITAL')", false, false),
        ColumnInfo::new("isPremium", "tinyint(1)", false, false),
        ColumnInfo::new("price", "decimal(10,2)", false, false),
    ]
}

fn disc_row(id: i64, title: &str) -> Row {
    Row::from_pairs([
        ("id", Value::Int(id)),
        ("title", Value::from(title)),
        ("support", Value::from("VINYL")),
        ("isPremium", Value::Int(1)),
        ("price", Value::from("19.90")),
    ])
}

#[test]
fn materialize_coerces_values_to_resolved_types() {
    let mut db = FakeDb::with_table("DiscsCoerce", disc_columns());
    let record = Record::materialize(&mut db, "DiscsCoerce", &disc_row(3, "Kind of Blue")).unwrap();

    assert_eq!(record.get("id"), Some(&Value::Int(3)));
    assert_eq!(
        record.get("title"),
        Some(&Value::Text("Kind of Blue".to_string()))
    );
    assert_eq!(
        record.get("support"),
        Some(&Value::Enum(EnumValue::new("VINYL", 2)))
    );
    assert_eq!(record.get("isPremium"), Some(&Value::Bool(true)));
    assert_eq!(
        record.get("price"),
        Some(&Value::Decimal("19.90".parse().unwrap()))
    );

    // Fields absent from the row hold NULL.
    let partial = Record::materialize(
        &mut db,
        "DiscsCoerce",
        &Row::from_pairs([("id", Value::Int(9))]),
    )
    .unwrap();
    assert_eq!(partial.get("title"), Some(&Value::Null));
}

#[test]
fn layout_is_cached_and_enums_synthesize_once() {
    let mut db = FakeDb::with_table("DiscsCache", disc_columns());

    let first = Record::materialize(&mut db, "DiscsCache", &disc_row(1, "a")).unwrap();
    let second = Record::materialize(&mut db, "DiscsCache", &disc_row(2, "b")).unwrap();

    assert_eq!(db.describes, vec!["DiscsCache"]);
    assert_eq!(first.layout().len(), second.layout().len());

    let def = enum_registry().get("DiscsCache", "support").unwrap();
    let again = enum_registry().get("DiscsCache", "support").unwrap();
    assert!(std::sync::Arc::ptr_eq(&def, &again));
    let members: Vec<_> = def.members().collect();
    assert_eq!(
        members,
        vec![("invalid", 0), ("CD", 1), ("VINYL", 2), ("DIGITAL", 3)]
    );
}

#[test]
fn introspection_closes_the_connection_on_every_path() {
    let mut db = FakeDb::with_table("DiscsScoped", disc_columns());
    Record::materialize(&mut db, "DiscsScoped", &disc_row(1, "x")).unwrap();
    assert!(!db.is_connected());
    assert_eq!(db.connects, db.disconnects);

    // Unknown table: the database error propagates and the connection still closes.
    let err = Record::materialize(&mut db, "DiscsMissing", &Row::new()).unwrap_err();
    assert!(err.is_database());
    assert!(!db.is_connected());
}

#[test]
fn key_and_generated_fields_are_read_only() {
    let mut db = FakeDb::with_table("DiscsProtect", disc_columns());
    let mut record = Record::materialize(&mut db, "DiscsProtect", &disc_row(4, "t")).unwrap();

    let field = record.layout().field("id").unwrap();
    assert_eq!(field.visibility, FieldVisibility::Protected);

    let err = record.set("id", 99).unwrap_err();
    assert!(matches!(err, OrmError::ReadOnlyField(_)));

    let err = record.set("nope", 1).unwrap_err();
    assert!(matches!(err, OrmError::UnknownField(_)));

    record.set("title", "renamed").unwrap();
    assert_eq!(
        record.get("title"),
        Some(&Value::Text("renamed".to_string()))
    );

    // set() coerces through the field's resolved type.
    record.set("isPremium", 0).unwrap();
    assert_eq!(record.get("isPremium"), Some(&Value::Bool(false)));
}

#[test]
fn load_selects_by_key_and_errors_when_absent() {
    let mut db = FakeDb::with_table("DiscsLoad", disc_columns());
    db.queue_row(disc_row(2, "Blue Train"));

    let record = Record::load(&mut db, "DiscsLoad", 2).unwrap();
    assert_eq!(record.key_value(), Some(&Value::Int(2)));

    let select = &db.executed[0];
    assert!(select.starts_with("SELECT\n"));
    assert!(select.contains("DiscsLoad.id, DiscsLoad.title"));
    assert!(select.contains("WHERE DiscsLoad.id = 2"));
    assert!(select.ends_with(";"));

    let err = Record::load(&mut db, "DiscsLoad", 777).unwrap_err();
    assert!(err.is_not_found());
    assert!(!db.is_connected());
}

#[test]
fn insert_skips_generated_fields_and_backfills_the_key() {
    let mut db = FakeDb::with_table("DiscsInsert", disc_columns());
    db.next_insert_id = 41;

    let mut record = Record::materialize(&mut db, "DiscsInsert", &Row::new()).unwrap();
    record.set("title", "Giant Steps").unwrap();
    record.set("support", "CD").unwrap();

    let id = record.insert(&mut db).unwrap();
    assert_eq!(id, 41);
    assert_eq!(record.key_value(), Some(&Value::Int(41)));

    let insert = db.executed.last().unwrap();
    assert!(insert.starts_with("INSERT\nINTO DiscsInsert\n"));
    assert!(insert.contains("DiscsInsert.title = 'Giant Steps'"));
    // Enum members render as their underlying code.
    assert!(insert.contains("DiscsInsert.support = 1"));
    assert!(!insert.contains("DiscsInsert.id"));
}

#[test]
fn update_and_delete_are_keyed_and_guarded() {
    let mut db = FakeDb::with_table("DiscsMutate", disc_columns());
    let mut record = Record::materialize(&mut db, "DiscsMutate", &disc_row(7, "old")).unwrap();
    record.set("title", "new").unwrap();

    record.update(&mut db).unwrap();
    let update_sql = db.executed.last().unwrap();
    assert!(update_sql.starts_with("UPDATE\nDiscsMutate\n"));
    assert!(update_sql.contains("DiscsMutate.title = 'new'"));
    assert!(update_sql.contains("WHERE DiscsMutate.id IS NOT NULL AND DiscsMutate.id = 7"));
    // Protected fields never appear in the SET fragment.
    assert!(!update_sql.contains("SET DiscsMutate.id"));

    record.delete(&mut db).unwrap();
    let delete_sql = db.executed.last().unwrap();
    assert_eq!(
        delete_sql,
        "DELETE\nFROM DiscsMutate\nWHERE DiscsMutate.id IS NOT NULL AND DiscsMutate.id = 7\n;"
    );
}

#[test]
fn keyed_operations_require_a_key_column() {
    let mut db = FakeDb::with_table(
        "LogsNoKey",
        vec![
            ColumnInfo::new("message", "text", false, false),
            ColumnInfo::new("at", "timestamp", false, true),
        ],
    );

    let err = Record::load(&mut db, "LogsNoKey", 1).unwrap_err();
    assert!(matches!(err, OrmError::MissingGuardColumn(_)));

    let record = Record::materialize(
        &mut db,
        "LogsNoKey",
        &Row::from_pairs([("message", Value::from("hi"))]),
    )
    .unwrap();
    let err = record.update(&mut db).unwrap_err();
    assert!(matches!(err, OrmError::MissingGuardColumn(_)));
}

#[test]
fn refresh_reloads_field_values() {
    let mut db = FakeDb::with_table("DiscsRefresh", disc_columns());
    let mut record = Record::materialize(&mut db, "DiscsRefresh", &disc_row(5, "stale")).unwrap();

    db.queue_row(disc_row(5, "fresh"));
    record.refresh(&mut db).unwrap();
    assert_eq!(record.get("title"), Some(&Value::Text("fresh".to_string())));
    assert_eq!(record.key_value(), Some(&Value::Int(5)));
}
