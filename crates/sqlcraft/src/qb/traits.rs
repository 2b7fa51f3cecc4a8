//! Trait definitions for statement builders.

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident::Literal;
use crate::qb::param::Render;
use crate::qb::{Delete, Insert, Select, Update};
use crate::value::Value;
use std::sync::Arc;

/// Base trait for all statement builders.
pub trait SqlStatement {
    /// Statement kind for logs, e.g. `"select"`.
    fn kind(&self) -> &'static str;

    /// Dialect used when this statement is assembled on its own.
    fn dialect(&self) -> &Arc<dyn Dialect>;

    /// Render into a shared context. Nested statements use the outer context's
    /// dialect and continue its parameter numbering.
    fn render(&self, ctx: &mut Render<'_>) -> SqlResult<String>;

    /// Render `(sql, values)`. Does not modify the statement; repeated calls
    /// return identical output.
    fn assemble(&self) -> SqlResult<(String, Vec<Value>)> {
        let dialect = Arc::clone(self.dialect());
        let mut ctx = Render::new(dialect.as_ref());
        match self.render(&mut ctx) {
            Ok(sql) => {
                let values = ctx.into_values();
                trace_assembled(self.kind(), dialect.name(), &sql, values.len());
                Ok((sql, values))
            }
            Err(err) => {
                trace_failed(self.kind(), &err);
                Err(err)
            }
        }
    }

    /// Debug helper to get the SQL string.
    fn to_sql(&self) -> SqlResult<String> {
        self.assemble().map(|(sql, _)| sql)
    }
}

#[cfg(feature = "tracing")]
fn trace_assembled(kind: &str, dialect: &str, sql: &str, params: usize) {
    tracing::debug!(target: "sqlcraft.sql", kind, dialect, params, sql, "assembled statement");
}

#[cfg(not(feature = "tracing"))]
fn trace_assembled(_kind: &str, _dialect: &str, _sql: &str, _params: usize) {}

#[cfg(feature = "tracing")]
fn trace_failed(kind: &str, err: &SqlError) {
    tracing::debug!(target: "sqlcraft.sql", kind, error = %err, "statement assembly failed");
}

#[cfg(not(feature = "tracing"))]
fn trace_failed(_kind: &str, _err: &SqlError) {}

/// Any statement that can be embedded in a CTE or a UNION.
#[derive(Debug, Clone)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    /// Raw SQL, e.g. `VALUES(1)`.
    Literal(Literal),
}

impl Statement {
    pub(crate) fn render(&self, ctx: &mut Render<'_>) -> SqlResult<String> {
        match self {
            Statement::Select(q) => q.render(ctx),
            Statement::Insert(q) => q.render(ctx),
            Statement::Update(q) => q.render(ctx),
            Statement::Delete(q) => q.render(ctx),
            Statement::Literal(l) => Ok(l.as_str().to_string()),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Statement::Select(q) => q.kind(),
            Statement::Insert(q) => q.kind(),
            Statement::Update(q) => q.kind(),
            Statement::Delete(q) => q.kind(),
            Statement::Literal(_) => "literal",
        }
    }
}

impl From<Select> for Statement {
    fn from(q: Select) -> Self {
        Statement::Select(q)
    }
}

impl From<Insert> for Statement {
    fn from(q: Insert) -> Self {
        Statement::Insert(q)
    }
}

impl From<Update> for Statement {
    fn from(q: Update) -> Self {
        Statement::Update(q)
    }
}

impl From<Delete> for Statement {
    fn from(q: Delete) -> Self {
        Statement::Delete(q)
    }
}

impl From<Literal> for Statement {
    fn from(l: Literal) -> Self {
        Statement::Literal(l)
    }
}
