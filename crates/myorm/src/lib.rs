//! # myorm
//!
//! A schema-introspecting MySQL-family ORM core for Rust.
//!
//! ## Features
//!
//! - **Programmatic SQL**: build SELECT/INSERT/UPDATE/DELETE statements through
//!   chained calls instead of string concatenation; misuse surfaces as a
//!   deterministic [`OrmError::Syntax`]
//! - **Literal rendering**: values pass through one total formatter
//!   ([`Value::sql_literal`]) with SQL quote-doubling as the only escaping
//! - **Runtime schema discovery**: a table's field layout is derived from its
//!   own `DESCRIBE` metadata on first use and cached per process
//! - **Enum synthesis**: SQL ENUM columns become registered [`EnumDef`]s with a
//!   reserved zero-valued `invalid` sentinel
//! - **Safe defaults**: DELETE and UPDATE carry a configurable
//!   `<table>.<guard> IS NOT NULL` WHERE guard unless explicitly opted out
//! - **Narrow collaborator seam**: the engine is reached only through the
//!   synchronous [`DbClient`] trait, scoped by [`Session`] and wrapped by an
//!   explicit [`RetryPolicy`]
//!
//! ## Query builder
//!
//! ```ignore
//! use myorm::{select_from, JoinKind};
//!
//! let sql = select_from("Users", &["name", "email"])
//!     .columns_from("Discos", &["author"])
//!     .join("Discos", "isPremium", "isPremium", JoinKind::Inner)
//!     .eq("id", 1)
//!     .limit(10, 5)
//!     .render()?;
//! ```
//!
//! ## Record materialization
//!
//! ```ignore
//! use myorm::Record;
//!
//! let mut user = Record::load(&mut client, "Users", 1)?;
//! user.set("email", "ana@example.com")?;
//! user.update(&mut client)?;
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod error;
pub mod query;
pub mod record;
pub mod row;
pub mod schema;
pub mod types;
pub mod value;

pub use client::{DbClient, RetryPolicy, Session, execute_with_retry};
pub use condition::{JoinKind, Op};
pub use config::DbConfig;
pub use error::{OrmError, OrmResult};
pub use query::{Query, delete_from, insert_into, select_from, update};
pub use record::Record;
pub use row::{Row, take_rows};
pub use schema::{ColumnInfo, FieldInfo, FieldLayout, FieldVisibility};
pub use types::{
    ENUM_INVALID, EnumDef, EnumKey, EnumRegistry, ValueType, enum_registry, resolve_type,
};
pub use value::{EnumValue, Value};
