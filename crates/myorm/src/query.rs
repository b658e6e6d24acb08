//! Programmatic SQL statement construction.
//!
//! [`Query`] accumulates one primary clause (SELECT/INSERT/UPDATE/DELETE) plus
//! secondary fragments (WHERE/JOIN/LIMIT) through chained calls and renders them
//! into a single statement string. Misuse (a duplicate primary clause, a duplicate
//! LIMIT, SET outside INSERT/UPDATE, secondary columns outside SELECT) is recorded
//! at the offending call and surfaced by [`Query::render`], which also rejects an
//! unset primary clause, INSERT combined with WHERE/JOIN/LIMIT, and any referenced
//! secondary table that was never joined.
//!
//! # Example
//!
//! ```ignore
//! use myorm::{select_from, JoinKind, Op};
//!
//! let sql = select_from("Users", &["name", "email"])
//!     .columns_from("Discos", &["author"])
//!     .join("Discos", "id", "userId", JoinKind::Inner)
//!     .eq("id", 1)
//!     .limit(10, 5)
//!     .render()?;
//! ```

use crate::condition::{JoinKind, Op};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::collections::BTreeMap;

/// The statement kind; exactly one per statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Primary {
    #[default]
    Unset,
    Select,
    Insert,
    Update,
    Delete,
}

impl Primary {
    fn keyword(&self) -> &'static str {
        match self {
            Primary::Unset => "",
            Primary::Select => "SELECT",
            Primary::Insert => "INSERT",
            Primary::Update => "UPDATE",
            Primary::Delete => "DELETE",
        }
    }
}

/// Column qualified by its owning table: `table.column`.
fn qualify(table: &str, column: &str) -> String {
    format!("{table}.{column}")
}

/// In-progress SQL statement under construction.
///
/// Created empty (or through the [`select_from`]/[`insert_into`]/[`update`]/
/// [`delete_from`] entry points), mutated only through clause-setting calls, and
/// consumed via [`Query::render`]. Rendering is idempotent given no further
/// mutation; the builder is intended for single use per statement.
#[derive(Debug, Clone, Default)]
pub struct Query {
    primary: Primary,
    main_table: String,
    /// Qualified SELECT columns
    columns: Vec<String>,
    /// SET assignments for INSERT/UPDATE
    assignments: Vec<(String, Value)>,
    /// Referenced secondary tables; `true` once joined
    joined: BTreeMap<String, bool>,
    /// Rendered WHERE conditions, AND-combined
    conditions: Vec<String>,
    /// Rendered JOIN clauses
    joins: Vec<String>,
    /// LIMIT offset and count; at most one
    limit: Option<(i64, i64)>,
    /// Column for the default DELETE/UPDATE guard
    guard_column: String,
    /// Skip the default guard entirely
    allow_unguarded: bool,
    /// First recorded misuse, surfaced at render time
    build_error: Option<String>,
}

impl Query {
    /// Create an empty statement.
    pub fn new() -> Self {
        Self {
            guard_column: "id".to_string(),
            ..Self::default()
        }
    }

    fn fail(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    fn set_primary(&mut self, primary: Primary, table: &str) {
        if self.primary != Primary::Unset {
            self.fail("the primary clause has already been set");
            return;
        }
        self.primary = primary;
        self.main_table = table.to_string();
    }

    // ==================== Primary clauses ====================

    /// Set the primary clause to SELECT, qualifying each column with `table`.
    pub fn select(mut self, table: &str, columns: &[&str]) -> Self {
        self.set_primary(Primary::Select, table);
        self.columns
            .extend(columns.iter().map(|c| qualify(table, c)));
        self
    }

    /// Append a secondary table's qualified columns to the SELECT list.
    ///
    /// The table is marked referenced-but-not-joined; [`Query::render`] fails
    /// until a matching [`Query::join`] call flips the flag.
    pub fn columns_from(mut self, table: &str, columns: &[&str]) -> Self {
        if self.primary != Primary::Select {
            self.fail("secondary columns require a SELECT primary clause");
            return self;
        }
        self.joined.entry(table.to_string()).or_insert(false);
        self.columns
            .extend(columns.iter().map(|c| qualify(table, c)));
        self
    }

    /// Set the primary clause to DELETE.
    ///
    /// Unless [`Query::allow_unguarded`] is set, rendering prepends a
    /// `table.<guard> IS NOT NULL` WHERE guard so the statement never deletes
    /// unconditionally.
    pub fn delete(mut self, table: &str) -> Self {
        self.set_primary(Primary::Delete, table);
        self
    }

    /// Set the primary clause to INSERT; provide assignments via [`Query::set`].
    pub fn insert(mut self, table: &str) -> Self {
        self.set_primary(Primary::Insert, table);
        self
    }

    /// Set the primary clause to UPDATE; carries the same default WHERE guard
    /// as DELETE.
    pub fn update(mut self, table: &str) -> Self {
        self.set_primary(Primary::Update, table);
        self
    }

    /// Add a SET assignment (INSERT/UPDATE only).
    pub fn set<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        match self.primary {
            Primary::Insert | Primary::Update => {
                self.assignments.push((column.to_string(), value.into()));
            }
            _ => self.fail("SET assignments require an INSERT or UPDATE primary clause"),
        }
        self
    }

    // ==================== Secondary clauses ====================

    /// Add one ANDed WHERE condition: `mainTable.column <op> <literal>`.
    pub fn condition<V: Into<Value>>(mut self, op: Op, column: &str, value: V) -> Self {
        let rendered = format!(
            "{} {} {}",
            qualify(&self.main_table, column),
            op.as_sql(),
            value.into().sql_literal()
        );
        self.conditions.push(rendered);
        self
    }

    /// Add WHERE: column = value
    pub fn eq<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.condition(Op::Eq, column, value)
    }

    /// Add WHERE: column != value
    pub fn ne<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.condition(Op::Ne, column, value)
    }

    /// Add WHERE: column > value
    pub fn gt<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.condition(Op::Gt, column, value)
    }

    /// Add WHERE: column < value
    pub fn lt<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.condition(Op::Lt, column, value)
    }

    /// Add WHERE: column >= value
    pub fn gte<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.condition(Op::Gte, column, value)
    }

    /// Add WHERE: column <= value
    pub fn lte<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.condition(Op::Lte, column, value)
    }

    /// Add WHERE: column IS NOT value
    pub fn is_not<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.condition(Op::IsNot, column, value)
    }

    /// Join a secondary table:
    /// `<KIND> JOIN table ON mainTable.primary_column = table.secondary_column`.
    ///
    /// Marks the table joined so its columns may be referenced by
    /// [`Query::columns_from`].
    pub fn join(
        mut self,
        table: &str,
        primary_column: &str,
        secondary_column: &str,
        kind: JoinKind,
    ) -> Self {
        self.joined.insert(table.to_string(), true);
        let rendered = format!(
            "{} JOIN {} ON {} = {}",
            kind.as_sql(),
            table,
            qualify(&self.main_table, primary_column),
            qualify(table, secondary_column)
        );
        self.joins.push(rendered);
        self
    }

    /// Set the LIMIT fragment; a second call records a build error.
    pub fn limit(mut self, offset: i64, count: i64) -> Self {
        if self.limit.is_some() {
            self.fail("the LIMIT clause has already been set");
            return self;
        }
        self.limit = Some((offset, count));
        self
    }

    // ==================== Guard configuration ====================

    /// Change the column used by the default DELETE/UPDATE WHERE guard
    /// (defaults to `id`).
    pub fn guard_column(mut self, column: &str) -> Self {
        self.guard_column = column.to_string();
        self
    }

    /// Skip the default DELETE/UPDATE guard and allow a statement that touches
    /// every row.
    pub fn allow_unguarded(mut self, allow: bool) -> Self {
        self.allow_unguarded = allow;
        self
    }

    // ==================== Rendering ====================

    /// Render the accumulated clauses into one statement string.
    ///
    /// Deterministic and idempotent: the same accumulated state always produces
    /// identical text. Fails with [`OrmError::Syntax`] on any recorded misuse, an
    /// unset primary clause, a referenced-but-unjoined secondary table, or INSERT
    /// combined with WHERE/JOIN/LIMIT.
    pub fn render(&self) -> OrmResult<String> {
        if let Some(message) = &self.build_error {
            return Err(OrmError::syntax(message.clone()));
        }
        if self.primary == Primary::Unset {
            return Err(OrmError::syntax("no primary clause has been set"));
        }
        for (table, joined) in &self.joined {
            if !joined {
                return Err(OrmError::syntax(format!(
                    "table '{table}' was referenced but never joined"
                )));
            }
        }
        if self.primary == Primary::Insert
            && (!self.conditions.is_empty() || !self.joins.is_empty() || self.limit.is_some())
        {
            return Err(OrmError::syntax(
                "INSERT statements cannot carry WHERE, JOIN or LIMIT clauses",
            ));
        }

        let mut sql = String::new();
        sql.push_str(self.primary.keyword());
        sql.push('\n');

        match self.primary {
            Primary::Select => {
                sql.push_str(&self.columns.join(", "));
                sql.push('\n');
                sql.push_str("FROM ");
                sql.push_str(&self.main_table);
                sql.push('\n');
            }
            Primary::Delete => {
                sql.push_str("FROM ");
                sql.push_str(&self.main_table);
                sql.push('\n');
            }
            Primary::Insert => {
                sql.push_str("INTO ");
                sql.push_str(&self.main_table);
                sql.push('\n');
                sql.push_str(&self.render_set());
            }
            Primary::Update => {
                sql.push_str(&self.main_table);
                sql.push('\n');
                sql.push_str(&self.render_set());
            }
            Primary::Unset => unreachable!("checked above"),
        }

        for join in &self.joins {
            sql.push_str(join);
            sql.push('\n');
        }

        let conditions = self.effective_conditions();
        if !conditions.is_empty() {
            sql.push_str("WHERE ");
            sql.push_str(&conditions.join(" AND "));
            sql.push('\n');
        }

        if let Some((offset, count)) = self.limit {
            sql.push_str(&format!("LIMIT {offset}, {count}\n"));
        }

        sql.push(';');
        Ok(sql)
    }

    /// SET fragment from the accumulated assignments, columns qualified by the
    /// main table.
    fn render_set(&self) -> String {
        let rendered: Vec<String> = self
            .assignments
            .iter()
            .map(|(column, value)| {
                format!(
                    "{} = {}",
                    qualify(&self.main_table, column),
                    value.sql_literal()
                )
            })
            .collect();
        format!("SET {}\n", rendered.join(", "))
    }

    /// WHERE conditions with the default guard prepended for DELETE/UPDATE.
    fn effective_conditions(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.conditions.len() + 1);
        if matches!(self.primary, Primary::Delete | Primary::Update) && !self.allow_unguarded {
            out.push(format!(
                "{} IS NOT NULL",
                qualify(&self.main_table, &self.guard_column)
            ));
        }
        out.extend(self.conditions.iter().cloned());
        out
    }
}

// ==================== Entry points ====================

/// Create a SELECT statement for the given table and columns.
///
/// # Example
/// ```ignore
/// let sql = myorm::select_from("Users", &["name", "email"]).render()?;
/// ```
pub fn select_from(table: &str, columns: &[&str]) -> Query {
    Query::new().select(table, columns)
}

/// Create a DELETE statement for the given table.
pub fn delete_from(table: &str) -> Query {
    Query::new().delete(table)
}

/// Create an INSERT statement for the given table.
///
/// # Example
/// ```ignore
/// let sql = myorm::insert_into("Users").set("name", "Juan").render()?;
/// ```
pub fn insert_into(table: &str) -> Query {
    Query::new().insert(table)
}

/// Create an UPDATE statement for the given table.
pub fn update(table: &str) -> Query {
    Query::new().update(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let sql = select_from("Users", &["name", "email"]).render().unwrap();
        assert_eq!(sql, "SELECT\nUsers.name, Users.email\nFROM Users\n;");
    }

    #[test]
    fn test_select_where_and_limit() {
        let sql = select_from("Users", &["name"])
            .eq("id", 1)
            .limit(10, 5)
            .render()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT\nUsers.name\nFROM Users\nWHERE Users.id = 1\nLIMIT 10, 5\n;"
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let q = select_from("Users", &["name"]).eq("id", 1);
        assert_eq!(q.render().unwrap(), q.render().unwrap());
    }

    #[test]
    fn test_render_without_primary_clause_fails() {
        let err = Query::new().render().unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_primary_clause_set_twice_fails() {
        let err = select_from("Users", &["name"])
            .delete("Users")
            .render()
            .unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_limit_set_twice_fails() {
        let err = select_from("Users", &["name"])
            .limit(0, 10)
            .limit(0, 20)
            .render()
            .unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_delete_carries_default_guard() {
        let sql = delete_from("Users").eq("id", 1).render().unwrap();
        assert_eq!(
            sql,
            "DELETE\nFROM Users\nWHERE Users.id IS NOT NULL AND Users.id = 1\n;"
        );
    }

    #[test]
    fn test_guard_column_is_configurable() {
        let sql = delete_from("Sessions")
            .guard_column("token")
            .render()
            .unwrap();
        assert_eq!(sql, "DELETE\nFROM Sessions\nWHERE Sessions.token IS NOT NULL\n;");
    }

    #[test]
    fn test_unguarded_delete() {
        let sql = delete_from("Users").allow_unguarded(true).render().unwrap();
        assert_eq!(sql, "DELETE\nFROM Users\n;");
    }

    #[test]
    fn test_insert_with_assignments() {
        let sql = insert_into("Users").set("name", "Juan").render().unwrap();
        assert_eq!(sql, "INSERT\nINTO Users\nSET Users.name = 'Juan'\n;");
    }

    #[test]
    fn test_insert_rejects_where_join_limit() {
        let err = insert_into("Users")
            .set("name", "Juan")
            .eq("id", 1)
            .render()
            .unwrap_err();
        assert!(err.is_syntax());

        let err = insert_into("Users")
            .set("name", "Juan")
            .limit(0, 1)
            .render()
            .unwrap_err();
        assert!(err.is_syntax());

        let err = insert_into("Users")
            .set("name", "Juan")
            .join("Discos", "id", "userId", JoinKind::Inner)
            .render()
            .unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_update_with_guard_and_set() {
        let sql = update("Users")
            .set("name", "Ana")
            .eq("id", 7)
            .render()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE\nUsers\nSET Users.name = 'Ana'\nWHERE Users.id IS NOT NULL AND Users.id = 7\n;"
        );
    }

    #[test]
    fn test_unjoined_secondary_table_fails() {
        let q = select_from("Users", &["name"]).columns_from("Discos", &["author"]);
        assert!(q.render().unwrap_err().is_syntax());

        let sql = q
            .join("Discos", "isPremium", "isPremium", JoinKind::Inner)
            .render()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT\nUsers.name, Discos.author\nFROM Users\nINNER JOIN Discos ON Users.isPremium = Discos.isPremium\n;"
        );
    }

    #[test]
    fn test_join_renders_before_where() {
        let sql = select_from("Users", &["name"])
            .columns_from("Discos", &["author"])
            .join("Discos", "id", "userId", JoinKind::Left)
            .eq("id", 3)
            .render()
            .unwrap();
        let join_at = sql.find("LEFT JOIN").unwrap();
        let where_at = sql.find("WHERE").unwrap();
        assert!(join_at < where_at);
    }

    #[test]
    fn test_conditions_are_and_combined() {
        let sql = select_from("Users", &["name"])
            .eq("id", 1)
            .gte("age", 18)
            .is_not("email", Value::Null)
            .render()
            .unwrap();
        assert!(sql.contains("Users.id = 1 AND Users.age >= 18 AND Users.email IS NOT NULL"));
    }

    #[test]
    fn test_set_outside_insert_update_fails() {
        let err = select_from("Users", &["name"])
            .set("name", "x")
            .render()
            .unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_formatted_values_in_conditions() {
        let sql = select_from("Users", &["name"])
            .eq("name", "O'Brien")
            .eq("active", true)
            .render()
            .unwrap();
        assert!(sql.contains("Users.name = 'O''Brien'"));
        assert!(sql.contains("Users.active = 1"));
    }
}
