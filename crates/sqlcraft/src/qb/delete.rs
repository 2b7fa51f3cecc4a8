//! DELETE builder.

use crate::dialect::{Dialect, default_dialect};
use crate::error::{SqlError, SqlResult};
use crate::ident::{Columns, Field, Source};
use crate::qb::clause::{ClauseStack, ClauseStyle, Connector, Operand, Predicate};
use crate::qb::param::Render;
use crate::qb::render_returning;
use crate::qb::traits::SqlStatement;
use std::sync::Arc;

/// DELETE builder with a bare WHERE clause stack.
#[derive(Clone, Debug)]
#[must_use]
pub struct Delete {
    dialect: Arc<dyn Dialect>,
    /// Target table
    table: Option<Source>,
    /// WHERE conditions
    where_clause: ClauseStack,
    /// RETURNING columns
    returning: Option<Columns>,
}

impl Default for Delete {
    fn default() -> Self {
        Self::new()
    }
}

impl Delete {
    /// Create a DELETE using the generic dialect.
    pub fn new() -> Self {
        Self::with_dialect(default_dialect())
    }

    pub fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            table: None,
            where_clause: ClauseStack::new(ClauseStyle::Bare),
            returning: None,
        }
    }

    /// Set the target table.
    pub fn from(mut self, table: impl Into<Source>) -> Self {
        self.table = Some(table.into());
        self
    }

    // ==================== WHERE ====================

    pub fn where_(
        mut self,
        field: impl Into<Field>,
        operator: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_clause
            .add(Connector::And, Predicate::new(field, operator, value));
        self
    }

    pub fn or_where(
        mut self,
        field: impl Into<Field>,
        operator: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_clause
            .add(Connector::Or, Predicate::new(field, operator, value));
        self
    }

    pub fn where_and(mut self) -> Self {
        self.where_clause.open_group(Connector::And);
        self
    }

    pub fn where_or(mut self) -> Self {
        self.where_clause.open_group(Connector::Or);
        self
    }

    pub fn where_end(mut self) -> Self {
        self.where_clause.close_group();
        self
    }

    /// Set RETURNING columns. `Columns::All` renders `*`.
    pub fn returning(mut self, columns: impl Into<Columns>) -> Self {
        self.returning = Some(columns.into());
        self
    }
}

impl SqlStatement for Delete {
    fn kind(&self) -> &'static str {
        "delete"
    }

    fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    fn render(&self, ctx: &mut Render<'_>) -> SqlResult<String> {
        self.where_clause.check()?;
        let dialect = ctx.dialect();
        let source = self
            .table
            .as_ref()
            .ok_or_else(|| SqlError::assembly("DELETE requires a target table"))?;
        let target = source.resolve_target("DELETE")?;
        let owner = source.descriptor();

        let mut sql = format!("DELETE FROM {}", target.render(dialect));

        let where_sql = self.where_clause.build_into(ctx, owner)?;
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if let Some(returning) = &self.returning {
            sql.push_str(" RETURNING ");
            sql.push_str(&render_returning(returning, dialect, owner)?);
        }
        Ok(sql)
    }
}
