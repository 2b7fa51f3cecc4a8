//! INSERT builder.

use crate::dialect::{Dialect, default_dialect};
use crate::error::{SqlError, SqlResult};
use crate::ident::{Columns, Source};
use crate::qb::clause::Operand;
use crate::qb::param::Render;
use crate::qb::traits::SqlStatement;
use crate::qb::{column_name, render_returning};
use crate::record::{Record, RecordDescriptor, RecordRef};
use std::sync::Arc;

/// One VALUES row.
#[derive(Clone, Debug)]
enum Row {
    /// Matched to the field list by position.
    Positional(Vec<Operand>),
    /// Matched to the field list by name.
    Named(Vec<(String, Operand)>),
}

/// INSERT builder.
#[derive(Clone, Debug)]
#[must_use]
pub struct Insert {
    dialect: Arc<dyn Dialect>,
    /// Target table
    table: Option<Source>,
    /// Field names, attribute names allowed for record targets
    fields: Vec<String>,
    rows: Vec<Row>,
    /// RETURNING columns
    returning: Option<Columns>,
    build_error: Option<SqlError>,
}

impl Default for Insert {
    fn default() -> Self {
        Self::new()
    }
}

impl Insert {
    /// Create an INSERT using the generic dialect.
    pub fn new() -> Self {
        Self::with_dialect(default_dialect())
    }

    pub fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            table: None,
            fields: Vec::new(),
            rows: Vec::new(),
            returning: None,
            build_error: None,
        }
    }

    /// Set the target table.
    pub fn table(mut self, table: impl Into<Source>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the field list. Positional rows are matched against it.
    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a row of values in field order.
    pub fn values<V: Into<Operand>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.rows
            .push(Row::Positional(values.into_iter().map(Into::into).collect()));
        self
    }

    /// Add a row given as `(field, value)` pairs.
    ///
    /// The first named row defines the field list when none was set.
    pub fn values_map<K, V>(mut self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Operand>,
    {
        self.rows.push(Row::Named(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    /// Add a row from a record instance; its set attributes become the values.
    ///
    /// Targets the record's table when no table was set. An error kept by the
    /// record is reported by `assemble()`.
    pub fn record(mut self, record: &dyn Record) -> Self {
        if self.build_error.is_none() {
            self.build_error = record.error().cloned();
        }
        if self.table.is_none() {
            self.table = Some(Source::table(RecordRef::new(record.descriptor())));
        }
        self.rows.push(Row::Named(
            record
                .column_values()
                .into_iter()
                .map(|(col, value)| (col, Operand::Value(value)))
                .collect(),
        ));
        self
    }

    /// Set RETURNING columns. `Columns::All` renders `*`.
    pub fn returning(mut self, columns: impl Into<Columns>) -> Self {
        self.returning = Some(columns.into());
        self
    }

    /// Field names translated to columns, and each row ordered to match.
    fn normalized_rows<'a>(
        &'a self,
        owner: Option<&RecordDescriptor>,
    ) -> SqlResult<(Vec<String>, Vec<Vec<&'a Operand>>)> {
        let mut columns: Vec<String> = self
            .fields
            .iter()
            .map(|f| column_name(f, owner))
            .collect::<SqlResult<_>>()?;
        if columns.is_empty() {
            if let Some(Row::Named(first)) = self.rows.iter().find(|r| matches!(r, Row::Named(_))) {
                for (name, _) in first {
                    columns.push(column_name(name, owner)?);
                }
            }
        }
        if columns.is_empty() {
            return Err(SqlError::assembly("INSERT requires at least one field"));
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(SqlError::assembly(format!(
                    "INSERT field '{column}' is listed twice"
                )));
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for (n, row) in self.rows.iter().enumerate() {
            let ordered: Vec<&Operand> = match row {
                Row::Positional(values) => {
                    if values.len() != columns.len() {
                        return Err(SqlError::assembly(format!(
                            "INSERT row {} has {} values for {} fields",
                            n + 1,
                            values.len(),
                            columns.len()
                        )));
                    }
                    values.iter().collect()
                }
                Row::Named(pairs) => {
                    let mut named = Vec::with_capacity(pairs.len());
                    for (name, value) in pairs {
                        named.push((column_name(name, owner)?, value));
                    }
                    if named.len() != columns.len() {
                        return Err(SqlError::assembly(format!(
                            "INSERT row {} has {} values for {} fields",
                            n + 1,
                            named.len(),
                            columns.len()
                        )));
                    }
                    columns
                        .iter()
                        .map(|col| {
                            named
                                .iter()
                                .find(|(name, _)| name == col)
                                .map(|(_, value)| *value)
                                .ok_or_else(|| {
                                    SqlError::assembly(format!(
                                        "INSERT row {} has no value for field '{col}'",
                                        n + 1
                                    ))
                                })
                        })
                        .collect::<SqlResult<_>>()?
                }
            };
            rows.push(ordered);
        }
        Ok((columns, rows))
    }
}

impl SqlStatement for Insert {
    fn kind(&self) -> &'static str {
        "insert"
    }

    fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    fn render(&self, ctx: &mut Render<'_>) -> SqlResult<String> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        let dialect = ctx.dialect();
        let source = self
            .table
            .as_ref()
            .ok_or_else(|| SqlError::assembly("INSERT requires a target table"))?;
        let target = source.resolve_target("INSERT")?;
        let owner = source.descriptor();
        if self.rows.is_empty() {
            return Err(SqlError::assembly("INSERT requires at least one row of values"));
        }
        let (columns, rows) = self.normalized_rows(owner)?;

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ",
            target.render(dialect),
            columns
                .iter()
                .map(|c| dialect.quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut rendered_rows = Vec::with_capacity(rows.len());
        for (n, row) in rows.iter().enumerate() {
            let mut values = Vec::with_capacity(row.len());
            for (value, column) in row.iter().zip(&columns) {
                let value = value.render(ctx, owner)?.ok_or_else(|| {
                    SqlError::assembly(format!(
                        "INSERT row {} has no value for field '{column}'",
                        n + 1
                    ))
                })?;
                values.push(value);
            }
            rendered_rows.push(format!("({})", values.join(", ")));
        }
        sql.push_str(&rendered_rows.join(", "));

        if let Some(returning) = &self.returning {
            sql.push_str(" RETURNING ");
            sql.push_str(&render_returning(returning, dialect, owner)?);
        }
        Ok(sql)
    }
}
