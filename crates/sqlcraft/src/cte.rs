//! CTE (WITH clause) support.
//!
//! [`With`] wraps named statements and a terminal statement:
//!
//! ```ignore
//! use sqlcraft::prelude::*;
//!
//! let base = select().from(("folder", "f1")).where_("id_folder", "=", 1);
//! let step = select()
//!     .from(("folder", "f2"))
//!     .inner_join("tree", "fk_parent", "f2", "id_folder");
//!
//! let (sql, values) = with()
//!     .recursive_clause("tree", base, step, UnionKind::All)
//!     .query(select().from("tree"))
//!     .assemble()?;
//! ```
//!
//! Parameters follow clause order, then the terminal statement.

use crate::dialect::{Dialect, default_dialect};
use crate::error::{SqlError, SqlResult};
use crate::qb::{Render, Select, SqlStatement, Statement, UnionKind};
use std::sync::Arc;

/// Whether the engine may inline a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Materialization {
    /// Engine decides; nothing is rendered.
    #[default]
    Default,
    Materialized,
    NotMaterialized,
}

impl Materialization {
    fn keyword(self) -> Option<&'static str> {
        match self {
            Materialization::Default => None,
            Materialization::Materialized => Some("MATERIALIZED"),
            Materialization::NotMaterialized => Some("NOT MATERIALIZED"),
        }
    }
}

/// One `name(columns) AS (statement)` clause.
#[derive(Debug, Clone)]
#[must_use]
pub struct CteClause {
    name: String,
    columns: Vec<String>,
    materialization: Materialization,
    statement: Statement,
}

impl CteClause {
    pub fn new(name: impl Into<String>, statement: impl Into<Statement>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            materialization: Materialization::Default,
            statement: statement.into(),
        }
    }

    /// Column names: `"name"("c1","c2")`.
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn materialization(mut self, materialization: Materialization) -> Self {
        self.materialization = materialization;
        self
    }

    fn render(&self, ctx: &mut Render<'_>) -> SqlResult<String> {
        let dialect = ctx.dialect();
        check_name(&self.name)?;
        let mut sql = dialect.quote_identifier(&self.name);
        if !self.columns.is_empty() {
            let mut columns = Vec::with_capacity(self.columns.len());
            for column in &self.columns {
                check_name(column)?;
                columns.push(dialect.quote_identifier(column));
            }
            sql.push('(');
            sql.push_str(&columns.join(","));
            sql.push(')');
        }
        sql.push_str(" AS ");
        if let Some(keyword) = self.materialization.keyword() {
            sql.push_str(keyword);
            sql.push(' ');
        }
        sql.push('(');
        sql.push_str(&self.statement.render(ctx)?);
        sql.push(')');
        Ok(sql)
    }
}

fn check_name(name: &str) -> SqlResult<()> {
    if name.is_empty() {
        return Err(SqlError::identifier("CTE names cannot be empty"));
    }
    if name.contains('\0') {
        return Err(SqlError::identifier("CTE names cannot contain NUL character"));
    }
    Ok(())
}

/// WITH builder.
#[derive(Debug, Clone)]
#[must_use]
pub struct With {
    dialect: Arc<dyn Dialect>,
    recursive: bool,
    clauses: Vec<CteClause>,
    query: Option<Box<Statement>>,
}

impl Default for With {
    fn default() -> Self {
        Self::new()
    }
}

impl With {
    /// Create a WITH wrapper using the generic dialect.
    pub fn new() -> Self {
        Self::with_dialect(default_dialect())
    }

    pub fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            recursive: false,
            clauses: Vec::new(),
            query: None,
        }
    }

    /// Render `WITH RECURSIVE`.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Add a clause `name AS (statement)`.
    pub fn clause(self, name: impl Into<String>, statement: impl Into<Statement>) -> Self {
        self.clause_with(CteClause::new(name, statement))
    }

    /// Add a fully configured clause.
    pub fn clause_with(mut self, clause: CteClause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Add `name AS (base <UNION|UNION ALL> step)` and switch to `WITH RECURSIVE`.
    pub fn recursive_clause(
        self,
        name: impl Into<String>,
        base: impl Into<Statement>,
        step: impl Into<Statement>,
        kind: UnionKind,
    ) -> Self {
        let body = Select::with_dialect(Arc::clone(&self.dialect))
            .union(base, kind)
            .union(step, kind);
        self.recursive(true).clause(name, body)
    }

    /// Set the terminal statement.
    pub fn query(mut self, statement: impl Into<Statement>) -> Self {
        self.query = Some(Box::new(statement.into()));
        self
    }
}

impl SqlStatement for With {
    fn kind(&self) -> &'static str {
        "with"
    }

    fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    fn render(&self, ctx: &mut Render<'_>) -> SqlResult<String> {
        if self.clauses.is_empty() {
            return Err(SqlError::assembly("WITH requires at least one clause"));
        }
        let query = self
            .query
            .as_ref()
            .ok_or_else(|| SqlError::assembly("WITH requires a terminal statement"))?;

        let mut clauses = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            clauses.push(clause.render(ctx)?);
        }
        let body = query.render(ctx)?;

        let keyword = if self.recursive { "WITH RECURSIVE" } else { "WITH" };
        Ok(format!("{keyword} {} {body}", clauses.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PgDialect;
    use crate::ident::{Column, Literal};
    use crate::qb::{Delete, Insert};
    use crate::value::Value;

    #[test]
    fn with_single_clause() {
        let (sql, values) = With::new()
            .clause(
                "recent",
                Select::new().from_cols("orders", ["id"]).where_("total", ">", 10),
            )
            .query(Select::new().from("recent"))
            .assemble()
            .unwrap();
        assert_eq!(
            sql,
            r#"WITH "recent" AS (SELECT "id" FROM "orders" WHERE ("total" > ?)) SELECT "recent".* FROM "recent""#
        );
        assert_eq!(values, vec![Value::from(10)]);
    }

    #[test]
    fn with_columns_and_materialization() {
        let sql = With::new()
            .clause_with(
                CteClause::new("a", Literal::new("VALUES(1)"))
                    .columns(["x"])
                    .materialization(Materialization::Materialized),
            )
            .clause_with(
                CteClause::new("b", Literal::new("VALUES(2, 3)"))
                    .columns(["y", "z"])
                    .materialization(Materialization::NotMaterialized),
            )
            .query(Literal::new("SELECT 1"))
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            r#"WITH "a"("x") AS MATERIALIZED (VALUES(1)),"b"("y","z") AS NOT MATERIALIZED (VALUES(2, 3)) SELECT 1"#
        );
    }

    #[test]
    fn with_recursive_counter() {
        let (sql, values) = With::new()
            .recursive(true)
            .clause_with(
                CteClause::new(
                    "t",
                    Select::new()
                        .union(Literal::new("VALUES(1)"), UnionKind::Union)
                        .union(
                            Select::new()
                                .from_cols("t", Literal::new("n+1"))
                                .where_("n", "<", 100),
                            UnionKind::Union,
                        ),
                )
                .columns(["n"]),
            )
            .query(
                Select::new().from_cols("t", Column::new(Literal::new("SUM(n)")).alias("total")),
            )
            .assemble()
            .unwrap();
        assert_eq!(
            sql,
            r#"WITH RECURSIVE "t"("n") AS (VALUES(1) UNION SELECT n+1 FROM "t" WHERE ("n" < ?)) SELECT SUM(n) AS "total" FROM "t""#
        );
        assert_eq!(values, vec![Value::from(100)]);
    }

    #[test]
    fn with_data_modifying_clause_pg() {
        let (sql, values) = With::with_dialect(Arc::new(PgDialect))
            .clause(
                "gone",
                Delete::new()
                    .from("sessions")
                    .where_("expired", "=", true)
                    .returning("user_id"),
            )
            .query(
                Insert::new()
                    .table("audit")
                    .fields(["note"])
                    .values(["cleanup"]),
            )
            .assemble()
            .unwrap();
        assert_eq!(
            sql,
            r#"WITH "gone" AS (DELETE FROM "sessions" WHERE "expired" = $1 RETURNING "user_id") INSERT INTO "audit" ("note") VALUES ($2)"#
        );
        assert_eq!(values, vec![Value::from(true), Value::from("cleanup")]);
    }

    #[test]
    fn with_errors() {
        let err = With::new().query(Select::new().from("t")).assemble().unwrap_err();
        assert!(err.is_assembly());

        let err = With::new().clause("a", Select::new().from("t")).assemble().unwrap_err();
        assert!(err.is_assembly());

        let err = With::new()
            .clause("", Select::new().from("t"))
            .query(Select::new().from("t"))
            .assemble()
            .unwrap_err();
        assert!(err.is_identifier());
    }
}
