//! UPDATE builder.

use crate::dialect::{Dialect, default_dialect};
use crate::error::{SqlError, SqlResult};
use crate::ident::{Columns, Field, Source};
use crate::qb::clause::{ClauseStack, ClauseStyle, Connector, Operand, Predicate};
use crate::qb::param::Render;
use crate::qb::traits::SqlStatement;
use crate::qb::{column_name, render_returning};
use crate::record::{Record, RecordRef};
use std::sync::Arc;

/// UPDATE builder.
///
/// Positional values are matched to `fields` first; `set`, `values_map` and
/// `record` assignments apply after them in call order, the last assignment to
/// a field winning.
#[derive(Clone, Debug)]
#[must_use]
pub struct Update {
    dialect: Arc<dyn Dialect>,
    /// Target table
    table: Option<Source>,
    /// Field names for positional values
    fields: Vec<String>,
    positional: Option<Vec<Operand>>,
    /// Named assignments, in call order
    assignments: Vec<(String, Operand)>,
    /// WHERE conditions
    where_clause: ClauseStack,
    /// RETURNING columns
    returning: Option<Columns>,
    build_error: Option<SqlError>,
}

impl Default for Update {
    fn default() -> Self {
        Self::new()
    }
}

impl Update {
    /// Create an UPDATE using the generic dialect.
    pub fn new() -> Self {
        Self::with_dialect(default_dialect())
    }

    pub fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            table: None,
            fields: Vec::new(),
            positional: None,
            assignments: Vec::new(),
            where_clause: ClauseStack::new(ClauseStyle::Bare),
            returning: None,
            build_error: None,
        }
    }

    /// Set the target table.
    pub fn table(mut self, table: impl Into<Source>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Field names for [`values`](Self::values).
    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Values in field order. Replaces earlier positional values.
    pub fn values<V: Into<Operand>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.positional = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Assign a column value.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.assignments.push((field.into(), value.into()));
        self
    }

    /// Assign a column value (None => skip).
    pub fn set_opt<T: Into<Operand>>(self, field: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(field, v),
            None => self,
        }
    }

    /// Assign every `(field, value)` pair.
    pub fn values_map<K, V>(mut self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Operand>,
    {
        self.assignments
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Assign the set attributes of a record instance.
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
        self.assignments.extend(
            record
                .column_values()
                .into_iter()
                .map(|(col, value)| (col, Operand::Value(value))),
        );
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

impl SqlStatement for Update {
    fn kind(&self) -> &'static str {
        "update"
    }

    fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    fn render(&self, ctx: &mut Render<'_>) -> SqlResult<String> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        self.where_clause.check()?;
        let dialect = ctx.dialect();
        let source = self
            .table
            .as_ref()
            .ok_or_else(|| SqlError::assembly("UPDATE requires a target table"))?;
        let target = source.resolve_target("UPDATE")?;
        let owner = source.descriptor();

        let mut merged: Vec<(String, &Operand)> = Vec::new();
        match &self.positional {
            Some(values) if values.len() != self.fields.len() => {
                return Err(SqlError::assembly(format!(
                    "UPDATE has {} values for {} fields",
                    values.len(),
                    self.fields.len()
                )));
            }
            Some(values) => {
                for (field, value) in self.fields.iter().zip(values) {
                    assign(&mut merged, column_name(field, owner)?, value);
                }
            }
            None => {}
        }
        for (field, value) in &self.assignments {
            assign(&mut merged, column_name(field, owner)?, value);
        }
        if merged.is_empty() {
            return Err(SqlError::assembly("UPDATE requires at least one assignment"));
        }

        let mut sets = Vec::with_capacity(merged.len());
        for (column, value) in &merged {
            let value = value.render(ctx, owner)?.ok_or_else(|| {
                SqlError::assembly(format!("UPDATE has no value for field '{column}'"))
            })?;
            sets.push(format!("{}={}", dialect.quote_identifier(column), value));
        }

        let mut sql = format!("UPDATE {} SET {}", target.render(dialect), sets.join(", "));

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

fn assign<'a>(merged: &mut Vec<(String, &'a Operand)>, column: String, value: &'a Operand) {
    match merged.iter_mut().find(|(c, _)| *c == column) {
        Some(entry) => entry.1 = value,
        None => merged.push((column, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PgDialect;
    use crate::ident::Literal;
    use crate::record::{RecordData, RecordDescriptor};
    use crate::value::Value;

    #[test]
    fn update_set_where_returning() {
        let (sql, values) = Update::new()
            .table("t")
            .set("a", 1)
            .set("b", "x")
            .where_("id", "=", 9)
            .returning(["id", "a"])
            .assemble()
            .unwrap();
        assert_eq!(
            sql,
            r#"UPDATE "t" SET "a"=?, "b"=? WHERE "id" = ? RETURNING "id", "a""#
        );
        assert_eq!(values, vec![Value::from(1), Value::from("x"), Value::from(9)]);
    }

    #[test]
    fn update_positional_values() {
        let (sql, values) = Update::with_dialect(Arc::new(PgDialect))
            .table("t")
            .fields(["a", "b"])
            .values([1, 2])
            .where_("id", "=", 3)
            .assemble()
            .unwrap();
        assert_eq!(sql, r#"UPDATE "t" SET "a"=$1, "b"=$2 WHERE "id" = $3"#);
        assert_eq!(values, vec![Value::from(1), Value::from(2), Value::from(3)]);
    }

    #[test]
    fn update_later_assignment_overrides() {
        let (sql, values) = Update::new()
            .table("t")
            .fields(["a", "b"])
            .values([1, 2])
            .set("a", 10)
            .set("c", 3)
            .set("c", 30)
            .assemble()
            .unwrap();
        assert_eq!(sql, r#"UPDATE "t" SET "a"=?, "b"=?, "c"=?"#);
        assert_eq!(values, vec![Value::from(10), Value::from(2), Value::from(30)]);
    }

    #[test]
    fn update_errors() {
        assert!(Update::new().table("t").assemble().unwrap_err().is_assembly());
        assert!(Update::new().set("a", 1).assemble().unwrap_err().is_assembly());
        let err = Update::new()
            .table("t")
            .fields(["a", "b"])
            .values([1])
            .assemble()
            .unwrap_err();
        assert!(err.is_assembly());
        let err = Update::new()
            .table("t")
            .set("a", 1)
            .where_or()
            .assemble()
            .unwrap_err();
        assert!(err.is_assembly());
    }

    #[test]
    fn update_raw_value_and_grouped_where() {
        let sql = Update::new()
            .table("t")
            .set("touched", Literal::new("CURRENT_TIMESTAMP"))
            .set_opt("note", None::<&str>)
            .where_("a", "=", 1)
            .where_or()
            .where_("b", "=", 2)
            .or_where("c", "=", 3)
            .where_end()
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            r#"UPDATE "t" SET "touched"=CURRENT_TIMESTAMP WHERE "a" = ? OR ("b" = ? OR "c" = ?)"#
        );
    }

    #[test]
    fn update_record_translates_attributes() {
        let d = RecordDescriptor::builder("book")
            .field("id", "id_book")
            .field("title", "title")
            .build();
        let rec = RecordData::new(&d).set("title", "Dune");
        let (sql, values) = Update::new()
            .record(&rec)
            .where_(RecordRef::new(&d).field("id"), "=", 1)
            .assemble()
            .unwrap();
        assert_eq!(sql, r#"UPDATE "book" SET "title"=? WHERE "book"."id_book" = ?"#);
        assert_eq!(values, vec![Value::from("Dune"), Value::from(1)]);
    }

    #[test]
    fn update_record_where_uses_attributes() {
        let d = RecordDescriptor::builder("book")
            .field("id", "id_book")
            .field("title", "title")
            .build();
        let rec = RecordData::new(&d).set("title", "Dune");
        let (sql, values) = Update::new()
            .record(&rec)
            .where_("id", "=", 1)
            .assemble()
            .unwrap();
        assert_eq!(sql, r#"UPDATE "book" SET "title"=? WHERE "id_book" = ?"#);
        assert_eq!(values, vec![Value::from("Dune"), Value::from(1)]);

        let err = Update::new()
            .record(&rec)
            .where_("bogus", "=", 1)
            .assemble()
            .unwrap_err();
        assert!(err.is_identifier());
    }

    #[test]
    fn update_record_reports_unknown_attribute() {
        let d = RecordDescriptor::builder("book").field("title", "title").build();
        let rec = RecordData::new(&d).set("titel", "Dune");
        let err = Update::new().record(&rec).assemble().unwrap_err();
        assert!(err.is_identifier());
    }
}
