//! Value-type resolution from declared SQL column types.
//!
//! [`resolve_type`] maps a raw declared type string (the `Type` column of a
//! MySQL-family `DESCRIBE`) to a [`ValueType`]. ENUM columns synthesize an
//! [`EnumDef`] registered in an [`EnumRegistry`] keyed by `(table, column)`;
//! the resolver itself never fails; unrecognized driver type strings degrade
//! to [`ValueType::Any`] so schema discovery never blocks.

use crate::error::{OrmError, OrmResult};
use crate::value::{EnumValue, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use uuid::Uuid;

/// Reserved name of the zero-valued enum sentinel.
pub const ENUM_INVALID: &str = "invalid";

static DECLARED_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    // Base keyword plus optional parenthesized parameter list, e.g. "varchar(80)".
    Regex::new(r"^([a-z]+)\s*(\(.*\))?").expect("static regex")
});

static ENUM_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^']*)'").expect("static regex"));

/// Registry key for a synthesized enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumKey {
    pub table: String,
    pub column: String,
}

impl EnumKey {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// The value type resolved for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Float,
    Decimal,
    Date,
    Time,
    DateTime,
    Text,
    Bool,
    Bytes,
    Json,
    /// Synthesized enumeration; the definition lives in the [`EnumRegistry`]
    /// under this key.
    Enum(EnumKey),
    /// Generic/untyped degradation for unrecognized declared types.
    Any,
}

/// An immutable synthesized enumeration: a name plus an ordered mapping from
/// member name to integer code.
///
/// Invariant: exactly one member holds code 0 and it is the reserved
/// [`ENUM_INVALID`] sentinel. Violating constructions error, never silently
/// corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    name: String,
    members: Vec<(String, i64)>,
}

impl EnumDef {
    /// Build from declared string literals in declaration order:
    /// `invalid` → 0, literal\[0\] → 1, literal\[1\] → 2, …
    pub fn from_literals(name: impl Into<String>, literals: &[&str]) -> OrmResult<Self> {
        let mut members = Vec::with_capacity(literals.len() + 1);
        members.push((ENUM_INVALID.to_string(), 0));
        for (i, literal) in literals.iter().enumerate() {
            members.push((literal.to_string(), i as i64 + 1));
        }
        Self::from_members(name, members)
    }

    /// Build from explicit members, validating the sentinel invariant.
    pub fn from_members(
        name: impl Into<String>,
        members: Vec<(String, i64)>,
    ) -> OrmResult<Self> {
        let name = name.into();
        let mut zero_members = members.iter().filter(|(_, code)| *code == 0);
        match (zero_members.next(), zero_members.next()) {
            (Some((member, _)), None) if member == ENUM_INVALID => {}
            (Some((member, _)), None) => {
                return Err(OrmError::EnumInvariant(format!(
                    "{name}: member '{member}' holds code 0, reserved for '{ENUM_INVALID}'"
                )));
            }
            (None, _) => {
                return Err(OrmError::EnumInvariant(format!(
                    "{name}: missing the '{ENUM_INVALID}' sentinel at code 0"
                )));
            }
            (Some(_), Some(_)) => {
                return Err(OrmError::EnumInvariant(format!(
                    "{name}: more than one member holds code 0"
                )));
            }
        }
        Ok(Self { name, members })
    }

    /// Type name of this enumeration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order, sentinel first.
    pub fn members(&self) -> impl Iterator<Item = (&str, i64)> {
        self.members.iter().map(|(n, c)| (n.as_str(), *c))
    }

    /// Number of members, including the sentinel.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Code of a member name; unknown names degrade to the sentinel code 0.
    pub fn code_of(&self, member: &str) -> i64 {
        self.members
            .iter()
            .find(|(n, _)| n == member)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    /// Member name for a code; unknown codes degrade to the sentinel.
    pub fn name_of(&self, code: i64) -> &str {
        self.members
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(n, _)| n.as_str())
            .unwrap_or(ENUM_INVALID)
    }

    /// Build an [`EnumValue`] from a member name, degrading to the sentinel.
    pub fn value(&self, member: &str) -> EnumValue {
        let code = self.code_of(member);
        EnumValue::new(self.name_of(code), code)
    }

    /// Build an [`EnumValue`] from a code, degrading to the sentinel.
    pub fn value_of_code(&self, code: i64) -> EnumValue {
        let name = self.name_of(code);
        EnumValue::new(name, self.code_of(name))
    }
}

/// Process-safe store of synthesized enumerations keyed by `(table, column)`.
///
/// First-use synthesis races are serialized by the inner mutex: an existing
/// entry is always reused, never re-synthesized.
#[derive(Debug, Default)]
pub struct EnumRegistry {
    inner: Mutex<HashMap<EnumKey, Arc<EnumDef>>>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EnumKey, Arc<EnumDef>>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a registered enumeration.
    pub fn get(&self, table: &str, column: &str) -> Option<Arc<EnumDef>> {
        self.lock()
            .get(&EnumKey::new(table, column))
            .cloned()
    }

    /// Look up or lazily synthesize the enumeration for a key.
    pub fn get_or_insert_with<F>(&self, key: EnumKey, synthesize: F) -> OrmResult<Arc<EnumDef>>
    where
        F: FnOnce() -> OrmResult<EnumDef>,
    {
        let mut map = self.lock();
        if let Some(existing) = map.get(&key) {
            return Ok(existing.clone());
        }
        let def = Arc::new(synthesize()?);
        map.insert(key, def.clone());
        Ok(def)
    }

    /// Number of registered enumerations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

static ENUMS: LazyLock<EnumRegistry> = LazyLock::new(EnumRegistry::new);

/// The process-wide enum registry used by layout materialization.
pub fn enum_registry() -> &'static EnumRegistry {
    &ENUMS
}

/// Derive an enumeration type name from the column name, or a randomized
/// fallback when no column name is available.
fn enum_type_name(column: Option<&str>) -> String {
    match column {
        Some(column) if !column.is_empty() => {
            let mut chars = column.chars();
            match chars.next() {
                Some(first) => format!("{}{}Kind", first.to_uppercase(), chars.as_str()),
                None => unreachable!("non-empty column"),
            }
        }
        _ => {
            let suffix = Uuid::new_v4().simple().to_string();
            format!("Enum{}", &suffix[..8])
        }
    }
}

/// Resolve a declared SQL type string to a [`ValueType`].
///
/// Looks up the base keyword plus parameter list first (`tinyint(1)` is
/// boolean), then the base keyword alone. ENUM declarations synthesize and
/// register an [`EnumDef`]; anything unrecognized degrades to
/// [`ValueType::Any`] without failing.
pub fn resolve_type(
    declared: &str,
    table: &str,
    column: Option<&str>,
    registry: &EnumRegistry,
) -> ValueType {
    let lowered = declared.trim().to_lowercase();
    let Some(captures) = DECLARED_TYPE.captures(&lowered) else {
        return ValueType::Any;
    };
    let base = &captures[1];
    let params = captures.get(2).map(|m| m.as_str()).unwrap_or("");
    let full = format!("{base}{params}");

    if base == "enum" {
        let name = enum_type_name(column);
        let key = EnumKey::new(
            table,
            column.map(str::to_string).unwrap_or_else(|| name.clone()),
        );
        // Literals keep their declared case; only the base keyword is lowercased.
        let literals: Vec<&str> = ENUM_LITERAL
            .captures_iter(declared)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();
        return match registry.get_or_insert_with(key.clone(), || {
            EnumDef::from_literals(name, &literals)
        }) {
            Ok(_) => ValueType::Enum(key),
            Err(err) => {
                tracing::warn!(%declared, %err, "enum synthesis failed, degrading to Any");
                ValueType::Any
            }
        };
    }

    if full == "tinyint(1)" {
        return ValueType::Bool;
    }

    match base {
        "tinyint" | "smallint" | "mediumint" | "int" | "bigint" => ValueType::Int,
        "float" | "double" => ValueType::Float,
        "decimal" => ValueType::Decimal,
        "datetime" | "timestamp" => ValueType::DateTime,
        "date" => ValueType::Date,
        "time" => ValueType::Time,
        "char" | "varchar" | "text" | "tinytext" | "mediumtext" | "longtext" => ValueType::Text,
        "boolean" | "bool" => ValueType::Bool,
        "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
            ValueType::Bytes
        }
        "json" => ValueType::Json,
        _ => ValueType::Any,
    }
}

impl ValueType {
    /// Best-effort coercion of a driver-supplied value into this type's shape.
    ///
    /// Shapes that already match, and anything unrecognized, pass through
    /// unchanged; NULL stays NULL.
    pub fn coerce(&self, value: Value, registry: &EnumRegistry) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        match (self, value) {
            (ValueType::Bool, Value::Int(i)) => Value::Bool(i != 0),
            (ValueType::Bool, Value::Text(s)) => match s.as_str() {
                "1" | "true" => Value::Bool(true),
                "0" | "false" => Value::Bool(false),
                _ => Value::Text(s),
            },
            (ValueType::Int, Value::Text(s)) => match s.parse() {
                Ok(i) => Value::Int(i),
                Err(_) => Value::Text(s),
            },
            (ValueType::Float, Value::Int(i)) => Value::Float(i as f64),
            (ValueType::Float, Value::Text(s)) => match s.parse() {
                Ok(f) => Value::Float(f),
                Err(_) => Value::Text(s),
            },
            (ValueType::Decimal, Value::Text(s)) => match s.parse() {
                Ok(d) => Value::Decimal(d),
                Err(_) => Value::Text(s),
            },
            (ValueType::Decimal, Value::Int(i)) => Value::Decimal(i.into()),
            (ValueType::Date, Value::Text(s)) => match s.parse() {
                Ok(d) => Value::Date(d),
                Err(_) => Value::Text(s),
            },
            (ValueType::Time, Value::Text(s)) => match s.parse() {
                Ok(t) => Value::Time(t),
                Err(_) => Value::Text(s),
            },
            (ValueType::DateTime, Value::Text(s)) => {
                match chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S")
                    .or_else(|_| chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S"))
                {
                    Ok(dt) => Value::DateTime(dt),
                    Err(_) => Value::Text(s),
                }
            }
            (ValueType::Json, Value::Text(s)) => match serde_json::from_str(&s) {
                Ok(j) => Value::Json(j),
                Err(_) => Value::Text(s),
            },
            (ValueType::Enum(key), Value::Text(s)) => {
                match registry.get(&key.table, &key.column) {
                    Some(def) => Value::Enum(def.value(&s)),
                    None => Value::Text(s),
                }
            }
            (ValueType::Enum(key), Value::Int(code)) => {
                match registry.get(&key.table, &key.column) {
                    Some(def) => Value::Enum(def.value_of_code(code)),
                    None => Value::Int(code),
                }
            }
            (_, other) => other,
        }
    }
}
