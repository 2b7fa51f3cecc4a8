//! Statement builders.
//!
//! Every builder accumulates calls into independent buckets and validates
//! nothing until [`SqlStatement::assemble`], which renders `(sql, values)` with
//! placeholders numbered by the statement's dialect.
//!
//! # Usage
//!
//! ```ignore
//! use sqlcraft::qb;
//! use sqlcraft::SqlStatement;
//!
//! // SELECT
//! let (sql, values) = qb::select()
//!     .from_cols("users", ["id", "name"])
//!     .where_("status", "=", "active")
//!     .order_by_desc("created_at")
//!     .limit(20)
//!     .assemble()?;
//!
//! // INSERT
//! let (sql, values) = qb::insert()
//!     .table("users")
//!     .fields(["username", "email"])
//!     .values(["alice", "alice@example.com"])
//!     .returning("id")
//!     .assemble()?;
//!
//! // UPDATE
//! let (sql, values) = qb::update()
//!     .table("users")
//!     .set("status", "inactive")
//!     .where_("id", "=", user_id)
//!     .assemble()?;
//!
//! // DELETE
//! let (sql, values) = qb::delete()
//!     .from("users")
//!     .where_("id", "=", user_id)
//!     .assemble()?;
//! ```

mod clause;
mod delete;
mod insert;
mod param;
mod select;
mod traits;
mod update;

#[cfg(test)]
mod tests;

pub use clause::{ClauseStack, ClauseStyle, Connector, Operand, Predicate};
pub use delete::Delete;
pub use insert::Insert;
pub use param::{ParamList, Render};
pub use select::{Join, JoinKind, Order, Select, UnionKind};
pub use traits::{SqlStatement, Statement};
pub use update::Update;

use crate::cte::With;
use crate::dialect::Dialect;
use crate::error::SqlResult;
use crate::ident::{Columns, Identifier, Resolved, resolve_column};
use crate::record::RecordDescriptor;
use std::sync::Arc;

/// Create a SELECT builder using the generic dialect.
///
/// # Example
/// ```ignore
/// let q = sqlcraft::qb::select().from("users").where_("id", "=", 1);
/// ```
pub fn select() -> Select {
    Select::new()
}

/// Create an INSERT builder using the generic dialect.
pub fn insert() -> Insert {
    Insert::new()
}

/// Create an UPDATE builder using the generic dialect.
pub fn update() -> Update {
    Update::new()
}

/// Create a DELETE builder using the generic dialect.
pub fn delete() -> Delete {
    Delete::new()
}

/// Create a CTE wrapper using the generic dialect.
pub fn with() -> With {
    With::new()
}

/// Creates statements that share one dialect.
///
/// ```ignore
/// let qb = QueryBuilder::new(Arc::new(PgDialect));
/// let (sql, _) = qb.select().from("users").where_("id", "=", 1).assemble()?;
/// assert_eq!(sql, r#"SELECT "users".* FROM "users" WHERE ("id" = $1)"#);
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    dialect: Arc<dyn Dialect>,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(crate::dialect::default_dialect())
    }
}

impl QueryBuilder {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn select(&self) -> Select {
        Select::with_dialect(Arc::clone(&self.dialect))
    }

    pub fn insert(&self) -> Insert {
        Insert::with_dialect(Arc::clone(&self.dialect))
    }

    pub fn update(&self) -> Update {
        Update::with_dialect(Arc::clone(&self.dialect))
    }

    pub fn delete(&self) -> Delete {
        Delete::with_dialect(Arc::clone(&self.dialect))
    }

    pub fn with(&self) -> With {
        With::with_dialect(Arc::clone(&self.dialect))
    }
}

/// Translate a field name to its column through `owner`.
pub(crate) fn column_name(name: &str, owner: Option<&RecordDescriptor>) -> SqlResult<String> {
    let (resolved, _) = resolve_column(&Identifier::name(name), owner)?;
    Ok(match resolved {
        Resolved::Name(n) | Resolved::Literal(n) => n,
    })
}

/// `"a", "b"` or `*`, unqualified.
pub(crate) fn render_returning(
    columns: &Columns,
    dialect: &dyn Dialect,
    owner: Option<&RecordDescriptor>,
) -> SqlResult<String> {
    match columns.items() {
        None => Ok("*".to_string()),
        Some(columns) => Ok(columns
            .iter()
            .map(|c| c.render(dialect, owner, None, None))
            .collect::<SqlResult<Vec<_>>>()?
            .join(", ")),
    }
}
