//! # sqlcraft
//!
//! A database-agnostic SQL statement assembler.
//!
//! ## Features
//!
//! - **Deferred validation**: builder calls never fail; `assemble()` validates
//!   and renders `(sql, values)` in one step
//! - **Dialects**: `?` or `$n` placeholders, quoting and casts per engine
//! - **Records**: table metadata with attribute to column translation
//! - **Nesting**: subqueries, unions and CTEs share one parameter sequence
//!
//! ## Cargo features
//!
//! - `tracing` (default): emit assembled SQL as `tracing` debug events on
//!   target `sqlcraft.sql`
//! - `postgres`: implement `tokio_postgres::types::ToSql` for [`Value`]
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use sqlcraft::prelude::*;
//!
//! let (sql, values) = select()
//!     .from("users")
//!     .where_("id", ">", 5)
//!     .where_and()
//!     .where_("nickname", "IS NOT NULL", ())
//!     .or_where("zip", "IN", vec![1, 2])
//!     .where_end()
//!     .assemble()?;
//!
//! assert_eq!(
//!     sql,
//!     r#"SELECT "users".* FROM "users" WHERE ("id" > ?) AND ( ("nickname" IS NOT NULL) OR ("zip" IN ?) )"#
//! );
//! ```

pub mod cache;
pub mod config;
pub mod cte;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod prelude;
pub mod qb;
pub mod record;
pub mod value;

pub use cache::QueryCache;
pub use config::Config;
pub use cte::{CteClause, Materialization, With};
pub use dialect::{Dialect, DialectKind, FieldAlias, GenericDialect, PgDialect, SqliteDialect, Token};
pub use error::{SqlError, SqlResult};
pub use ident::{Column, Columns, Field, Identifier, Literal, Source};
pub use record::{Record, RecordData, RecordDescriptor, RecordDescriptorBuilder, RecordRef};
pub use value::Value;

// Re-export qb module for easy access
pub use qb::{
    Delete, Insert, Join, JoinKind, Operand, Order, QueryBuilder, Select, SqlStatement, Statement,
    UnionKind, Update, delete, insert, select, update, with,
};
