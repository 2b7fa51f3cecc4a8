//! SELECT builder.

use crate::dialect::{Dialect, Token, default_dialect};
use crate::error::{SqlError, SqlResult};
use crate::ident::{
    Column, Columns, Field, Identifier, Literal, Resolved, ResolvedTable, Source, resolve_column,
    resolve_field, resolve_qualifier, resolve_table,
};
use crate::qb::clause::{ClauseStack, ClauseStyle, Connector, Operand, Predicate};
use crate::qb::param::Render;
use crate::qb::traits::{SqlStatement, Statement};
use crate::record::RecordDescriptor;
use std::sync::Arc;

/// JOIN flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Natural,
    InnerLateral,
    LeftLateral,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::Natural => "NATURAL JOIN",
            JoinKind::InnerLateral => "INNER JOIN LATERAL",
            JoinKind::LeftLateral => "LEFT JOIN LATERAL",
        }
    }

    fn takes_condition(self) -> bool {
        !matches!(self, JoinKind::Cross | JoinKind::Natural)
    }
}

#[derive(Debug, Clone)]
enum JoinOn {
    /// `other.other_field <op> joined.field`
    Fields {
        field: Identifier,
        other: Identifier,
        other_field: Identifier,
        operator: String,
    },
    Expr(Literal),
}

/// A JOIN clause with optional extra columns for the select list.
#[derive(Debug, Clone)]
#[must_use]
pub struct Join {
    kind: JoinKind,
    source: Source,
    on: Option<JoinOn>,
    columns: Option<Columns>,
}

impl Join {
    pub fn new(kind: JoinKind, source: impl Into<Source>) -> Self {
        Self {
            kind,
            source: source.into(),
            on: None,
            columns: None,
        }
    }

    pub fn inner(source: impl Into<Source>) -> Self {
        Self::new(JoinKind::Inner, source)
    }

    pub fn left(source: impl Into<Source>) -> Self {
        Self::new(JoinKind::Left, source)
    }

    pub fn right(source: impl Into<Source>) -> Self {
        Self::new(JoinKind::Right, source)
    }

    pub fn full(source: impl Into<Source>) -> Self {
        Self::new(JoinKind::Full, source)
    }

    pub fn cross(source: impl Into<Source>) -> Self {
        Self::new(JoinKind::Cross, source)
    }

    pub fn natural(source: impl Into<Source>) -> Self {
        Self::new(JoinKind::Natural, source)
    }

    /// `INNER JOIN LATERAL (query) AS "alias"`; needs an ON condition,
    /// usually [`on_expr`](Self::on_expr).
    pub fn inner_lateral(query: impl Into<Source>, alias: impl Into<String>) -> Self {
        Self::new(JoinKind::InnerLateral, query.into().alias(alias))
    }

    /// `LEFT JOIN LATERAL (query) AS "alias"`
    pub fn left_lateral(query: impl Into<Source>, alias: impl Into<String>) -> Self {
        Self::new(JoinKind::LeftLateral, query.into().alias(alias))
    }

    /// `ON "other"."other_field"="joined"."field"`
    ///
    /// `other` must name a table registered earlier in the statement.
    pub fn on(
        self,
        field: impl Into<Identifier>,
        other: impl Into<Identifier>,
        other_field: impl Into<Identifier>,
    ) -> Self {
        self.on_op(field, "=", other, other_field)
    }

    /// Like [`on`](Self::on) with a custom comparison operator.
    pub fn on_op(
        mut self,
        field: impl Into<Identifier>,
        operator: impl Into<String>,
        other: impl Into<Identifier>,
        other_field: impl Into<Identifier>,
    ) -> Self {
        self.on = Some(JoinOn::Fields {
            field: field.into(),
            other: other.into(),
            other_field: other_field.into(),
            operator: operator.into(),
        });
        self
    }

    /// `ON (expr)`
    pub fn on_expr(mut self, expr: Literal) -> Self {
        self.on = Some(JoinOn::Expr(expr));
        self
    }

    /// Columns of the joined source to add to the select list.
    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = Some(columns.into());
        self
    }
}

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn keyword(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// Set operator placed before a union member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnionKind {
    #[default]
    Union,
    All,
}

impl UnionKind {
    pub fn keyword(self) -> &'static str {
        match self {
            UnionKind::Union => "UNION",
            UnionKind::All => "UNION ALL",
        }
    }
}

#[derive(Debug, Clone)]
enum SourceEntry {
    From { source: Source, columns: Columns },
    /// Rendered after the plain FROM tables.
    Lateral { source: Source, columns: Columns },
    Expr(Vec<Column>),
}

/// SELECT builder.
///
/// Calls accumulate into independent buckets in any order; `assemble()` renders
/// them in SQL order and validates the result.
#[derive(Debug, Clone)]
#[must_use]
pub struct Select {
    dialect: Arc<dyn Dialect>,
    distinct: bool,
    sources: Vec<SourceEntry>,
    joins: Vec<Join>,
    where_clause: ClauseStack,
    group_by: Vec<Field>,
    having: ClauseStack,
    order_by: Vec<(Field, Order)>,
    limit: Option<i64>,
    offset: Option<i64>,
    for_update: bool,
    unions: Vec<(Statement, UnionKind)>,
    build_error: Option<SqlError>,
}

impl Default for Select {
    fn default() -> Self {
        Self::new()
    }
}

impl Select {
    /// Create a SELECT using the generic dialect.
    pub fn new() -> Self {
        Self::with_dialect(default_dialect())
    }

    pub fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            distinct: false,
            sources: Vec::new(),
            joins: Vec::new(),
            where_clause: ClauseStack::new(ClauseStyle::Parenthesized),
            group_by: Vec::new(),
            having: ClauseStack::new(ClauseStyle::Parenthesized),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            for_update: false,
            unions: Vec::new(),
            build_error: None,
        }
    }

    fn defer(&mut self, err: SqlError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    // ==================== Sources ====================

    /// Add a FROM source with all its columns (`"t".*`).
    pub fn from(self, source: impl Into<Source>) -> Self {
        self.from_cols(source, Columns::All)
    }

    /// Add a FROM source with an explicit column list.
    pub fn from_cols(mut self, source: impl Into<Source>, columns: impl Into<Columns>) -> Self {
        self.sources.push(SourceEntry::From {
            source: source.into(),
            columns: columns.into(),
        });
        self
    }

    /// Add `LATERAL (query) AS "alias"` to the FROM list; its columns are
    /// qualified with `alias`.
    pub fn lateral(
        mut self,
        query: impl Into<Source>,
        alias: impl Into<String>,
        columns: impl Into<Columns>,
    ) -> Self {
        self.sources.push(SourceEntry::Lateral {
            source: query.into().alias(alias),
            columns: columns.into(),
        });
        self
    }

    /// Add columns that belong to no table, e.g. `SELECT 1`.
    pub fn expr(mut self, columns: impl Into<Columns>) -> Self {
        let columns = match columns.into() {
            Columns::All => vec![Column::new("*")],
            Columns::List(cols) => cols,
        };
        self.sources.push(SourceEntry::Expr(columns));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    // ==================== JOIN ====================

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// `INNER JOIN source ON "other"."other_field"="source"."field"`
    pub fn inner_join(
        self,
        source: impl Into<Source>,
        field: impl Into<Identifier>,
        other: impl Into<Identifier>,
        other_field: impl Into<Identifier>,
    ) -> Self {
        self.join(Join::inner(source).on(field, other, other_field))
    }

    pub fn left_join(
        self,
        source: impl Into<Source>,
        field: impl Into<Identifier>,
        other: impl Into<Identifier>,
        other_field: impl Into<Identifier>,
    ) -> Self {
        self.join(Join::left(source).on(field, other, other_field))
    }

    pub fn right_join(
        self,
        source: impl Into<Source>,
        field: impl Into<Identifier>,
        other: impl Into<Identifier>,
        other_field: impl Into<Identifier>,
    ) -> Self {
        self.join(Join::right(source).on(field, other, other_field))
    }

    pub fn full_join(
        self,
        source: impl Into<Source>,
        field: impl Into<Identifier>,
        other: impl Into<Identifier>,
        other_field: impl Into<Identifier>,
    ) -> Self {
        self.join(Join::full(source).on(field, other, other_field))
    }

    pub fn cross_join(self, source: impl Into<Source>) -> Self {
        self.join(Join::cross(source))
    }

    pub fn natural_join(self, source: impl Into<Source>) -> Self {
        self.join(Join::natural(source))
    }

    /// `INNER JOIN LATERAL (query) AS "alias" ON (on)`
    pub fn join_inner_lateral(
        self,
        query: impl Into<Source>,
        alias: impl Into<String>,
        on: Literal,
    ) -> Self {
        self.join(Join::inner_lateral(query, alias).on_expr(on))
    }

    /// `LEFT JOIN LATERAL (query) AS "alias" ON (on)`
    pub fn join_left_lateral(
        self,
        query: impl Into<Source>,
        alias: impl Into<String>,
        on: Literal,
    ) -> Self {
        self.join(Join::left_lateral(query, alias).on_expr(on))
    }

    // ==================== WHERE ====================

    /// Add `field operator value`, joined with AND.
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

    /// Add `field operator value`, joined with OR.
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

    /// Open a WHERE group joined with AND.
    pub fn where_and(mut self) -> Self {
        self.where_clause.open_group(Connector::And);
        self
    }

    /// Open a WHERE group joined with OR.
    pub fn where_or(mut self) -> Self {
        self.where_clause.open_group(Connector::Or);
        self
    }

    /// Close the innermost WHERE group.
    pub fn where_end(mut self) -> Self {
        self.where_clause.close_group();
        self
    }

    // ==================== GROUP BY / HAVING ====================

    /// Add GROUP BY fields. A field listed twice is reported by `assemble()`.
    pub fn group_by<F: Into<Field>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        for field in fields {
            let field = field.into();
            if self.group_by.contains(&field) {
                self.defer(SqlError::assembly(format!(
                    "duplicate GROUP BY field {:?}",
                    field.name
                )));
                continue;
            }
            self.group_by.push(field);
        }
        self
    }

    pub fn having(
        mut self,
        field: impl Into<Field>,
        operator: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        self.having.add(Connector::And, Predicate::new(field, operator, value));
        self
    }

    pub fn or_having(
        mut self,
        field: impl Into<Field>,
        operator: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        self.having.add(Connector::Or, Predicate::new(field, operator, value));
        self
    }

    pub fn having_and(mut self) -> Self {
        self.having.open_group(Connector::And);
        self
    }

    pub fn having_or(mut self) -> Self {
        self.having.open_group(Connector::Or);
        self
    }

    pub fn having_end(mut self) -> Self {
        self.having.close_group();
        self
    }

    // ==================== ORDER BY / LIMIT ====================

    pub fn order_by(mut self, field: impl Into<Field>, order: Order) -> Self {
        self.order_by.push((field.into(), order));
        self
    }

    pub fn order_by_asc(self, field: impl Into<Field>) -> Self {
        self.order_by(field, Order::Asc)
    }

    pub fn order_by_desc(self, field: impl Into<Field>) -> Self {
        self.order_by(field, Order::Desc)
    }

    /// Set LIMIT. A negative limit renders `LIMIT ALL`.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Pagination helper; `page` is 1-based. Both arguments must be at least 1.
    pub fn page(mut self, page: i64, rows: i64) -> Self {
        if page < 1 || rows < 1 {
            self.defer(SqlError::assembly(format!(
                "page and rows must be >= 1, got page={page} rows={rows}"
            )));
            return self;
        }
        let Some(offset) = (page - 1).checked_mul(rows) else {
            self.defer(SqlError::assembly(format!(
                "page offset overflows for page={page} rows={rows}"
            )));
            return self;
        };
        self.limit = Some(rows);
        self.offset = Some(offset);
        self
    }

    // ==================== UNION ====================

    /// Append a union member preceded by `kind`.
    pub fn union(mut self, member: impl Into<Statement>, kind: UnionKind) -> Self {
        self.unions.push((member.into(), kind));
        self
    }

    pub fn union_all(self, member: impl Into<Statement>) -> Self {
        self.union(member, UnionKind::All)
    }

    // ==================== Rendering ====================

    fn validate(&self) -> SqlResult<()> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        self.where_clause.check()?;
        self.having.check()?;

        if self.sources.is_empty() {
            if self.unions.is_empty() {
                return Err(SqlError::assembly(
                    "SELECT requires a FROM source, an expression or union members",
                ));
            }
            if !self.joins.is_empty()
                || !self.where_clause.is_empty()
                || !self.group_by.is_empty()
                || !self.having.is_empty()
            {
                return Err(SqlError::assembly(
                    "a union without its own source cannot carry JOIN, WHERE, GROUP BY or HAVING",
                ));
            }
            if self.unions.len() < 2 {
                return Err(SqlError::assembly(
                    "a union without its own source needs at least two members",
                ));
            }
        }

        let has_from = self
            .sources
            .iter()
            .any(|s| matches!(s, SourceEntry::From { .. } | SourceEntry::Lateral { .. }));
        if !self.joins.is_empty() && !has_from {
            return Err(SqlError::assembly("JOIN requires a FROM source"));
        }

        for (member, _) in &self.unions {
            if !matches!(member, Statement::Select(_) | Statement::Literal(_)) {
                return Err(SqlError::assembly(format!(
                    "union members must be SELECT statements or literals, got {}",
                    member.kind()
                )));
            }
        }
        Ok(())
    }

    fn render_columns(
        &self,
        dialect: &dyn Dialect,
        from: &[Option<Bound<'_>>],
        joins: &[Bound<'_>],
    ) -> SqlResult<Vec<String>> {
        let mut out = Vec::new();
        for (entry, bound) in self.sources.iter().zip(from) {
            match (entry, bound) {
                (
                    SourceEntry::From { columns, .. } | SourceEntry::Lateral { columns, .. },
                    Some(bound),
                ) => {
                    bound.render_columns(dialect, columns, bound.aliased, &mut out)?;
                }
                (SourceEntry::Expr(columns), _) => {
                    for column in columns {
                        out.push(column.render(dialect, None, None, None)?);
                    }
                }
                (SourceEntry::From { .. } | SourceEntry::Lateral { .. }, None) => {}
            }
        }
        for (join, bound) in self.joins.iter().zip(joins) {
            if let Some(columns) = &join.columns {
                bound.render_columns(dialect, columns, true, &mut out)?;
            }
        }
        if out.is_empty() {
            return Err(SqlError::assembly("SELECT list is empty"));
        }
        Ok(out)
    }

    /// Record whose attributes unqualified WHERE fields name: the only FROM
    /// source, when nothing is joined.
    fn target(&self) -> Option<&RecordDescriptor> {
        match self.sources.as_slice() {
            [SourceEntry::From { source, .. }] if self.joins.is_empty() => source.descriptor(),
            _ => None,
        }
    }

    fn render_join(
        &self,
        join: &Join,
        bound: &Bound<'_>,
        prior: &[&Bound<'_>],
        ctx: &mut Render<'_>,
    ) -> SqlResult<String> {
        let dialect = ctx.dialect();
        let target = bound.render_table(ctx)?;
        let mut sql = format!("{} {}", join.kind.keyword(), target);

        match (&join.on, join.kind.takes_condition()) {
            (None, false) => {}
            (Some(_), false) => {
                return Err(SqlError::assembly(format!(
                    "{} takes no ON condition",
                    join.kind.keyword()
                )));
            }
            (None, true) => {
                return Err(SqlError::assembly(format!(
                    "{} requires an ON condition",
                    join.kind.keyword()
                )));
            }
            (Some(JoinOn::Expr(expr)), true) => {
                sql.push_str(&format!(" ON ({})", expr.as_str()));
            }
            (
                Some(JoinOn::Fields {
                    field,
                    other,
                    other_field,
                    operator,
                }),
                true,
            ) => {
                let (qualifier, _, other_descriptor) = resolve_qualifier(other)?;
                let other_bound = prior
                    .iter()
                    .find(|b| b.qualifier == qualifier)
                    .ok_or_else(|| {
                        SqlError::identifier(format!(
                            "unknown table or alias '{qualifier}' in JOIN condition"
                        ))
                    })?;
                let (left_name, _) =
                    resolve_column(other_field, other_descriptor.or(other_bound.descriptor))?;
                let left = dialect.quote_column(
                    left_name.token(),
                    None,
                    Some(&other_bound.qualifier),
                    other_bound.schema.as_deref(),
                )?;
                let (right_name, _) = resolve_column(field, bound.descriptor)?;
                let right = dialect.quote_column(
                    right_name.token(),
                    None,
                    Some(&bound.qualifier),
                    bound.schema.as_deref(),
                )?;
                sql.push_str(&format!(" ON {left}{}{right}", operator.trim()));
            }
        }
        Ok(sql)
    }

    fn render_unions(&self, ctx: &mut Render<'_>, standalone: bool) -> SqlResult<String> {
        let mut parts = Vec::with_capacity(self.unions.len() * 2);
        for (i, (member, kind)) in self.unions.iter().enumerate() {
            if i > 0 || !standalone {
                parts.push(kind.keyword().to_string());
            }
            parts.push(member.render(ctx)?);
        }
        Ok(parts.join(" "))
    }
}

impl SqlStatement for Select {
    fn kind(&self) -> &'static str {
        "select"
    }

    fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    fn render(&self, ctx: &mut Render<'_>) -> SqlResult<String> {
        self.validate()?;
        let dialect = ctx.dialect();
        let mut parts: Vec<String> = Vec::new();

        if self.sources.is_empty() {
            parts.push(self.render_unions(ctx, true)?);
        } else {
            // Register sources before rendering anything: the select list needs
            // every qualifier, and JOIN conditions may only see earlier tables.
            let mut taken: Vec<String> = Vec::new();
            let mut from: Vec<Option<Bound<'_>>> = Vec::with_capacity(self.sources.len());
            for entry in &self.sources {
                match entry {
                    SourceEntry::From { source, .. } | SourceEntry::Lateral { source, .. } => {
                        let mut bound = Bound::new(source, &taken)?;
                        bound.lateral = matches!(entry, SourceEntry::Lateral { .. });
                        taken.push(bound.qualifier.clone());
                        from.push(Some(bound));
                    }
                    SourceEntry::Expr(_) => from.push(None),
                }
            }
            let mut joins: Vec<Bound<'_>> = Vec::with_capacity(self.joins.len());
            for join in &self.joins {
                let bound = Bound::new(&join.source, &taken)?;
                taken.push(bound.qualifier.clone());
                joins.push(bound);
            }

            let columns = self.render_columns(dialect, &from, &joins)?;
            let mut select = String::from("SELECT ");
            if self.distinct {
                select.push_str("DISTINCT ");
            }
            select.push_str(&columns.join(","));
            parts.push(select);

            let from: Vec<&Bound<'_>> = from.iter().flatten().collect();
            if !from.is_empty() {
                let mut tables = Vec::with_capacity(from.len());
                let plain = from.iter().filter(|b| !b.lateral);
                for bound in plain.chain(from.iter().filter(|b| b.lateral)) {
                    tables.push(bound.render_table(ctx)?);
                }
                parts.push(format!("FROM {}", tables.join(", ")));
            }

            for (i, (join, bound)) in self.joins.iter().zip(&joins).enumerate() {
                let prior: Vec<&Bound<'_>> =
                    from.iter().copied().chain(joins[..i].iter()).collect();
                parts.push(self.render_join(join, bound, &prior, ctx)?);
            }

            let where_sql = self.where_clause.build_into(ctx, self.target())?;
            if !where_sql.is_empty() {
                parts.push(format!("WHERE {where_sql}"));
            }

            if !self.group_by.is_empty() {
                let fields = self
                    .group_by
                    .iter()
                    .map(|f| -> SqlResult<String> { resolve_field(f)?.render(dialect) })
                    .collect::<SqlResult<Vec<_>>>()?;
                parts.push(format!("GROUP BY {}", fields.join(", ")));
            }

            let having_sql = self.having.build_into(ctx, None)?;
            if !having_sql.is_empty() {
                parts.push(format!("HAVING {having_sql}"));
            }
        }

        if !self.order_by.is_empty() {
            let fields = self
                .order_by
                .iter()
                .map(|(f, order)| -> SqlResult<String> {
                    let field = resolve_field(f)?.render(dialect)?;
                    Ok(format!("{field} {}", order.keyword()))
                })
                .collect::<SqlResult<Vec<_>>>()?;
            parts.push(format!("ORDER BY {}", fields.join(",")));
        }

        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                let mut sql = if limit < 0 {
                    "LIMIT ALL".to_string()
                } else {
                    format!("LIMIT {limit}")
                };
                if let Some(offset) = offset {
                    sql.push_str(&format!(" OFFSET {offset}"));
                }
                parts.push(sql);
            }
            (None, Some(offset)) => parts.push(format!("OFFSET {offset}")),
            (None, None) => {}
        }

        if self.for_update {
            parts.push("FOR UPDATE".to_string());
        }

        if !self.sources.is_empty() && !self.unions.is_empty() {
            parts.push(self.render_unions(ctx, false)?);
        }

        Ok(parts.join(" "))
    }
}

/// A registered FROM/JOIN source.
#[derive(Debug)]
struct Bound<'s> {
    /// Name columns are qualified with.
    qualifier: String,
    /// Rendered alias, explicit or generated.
    alias: Option<String>,
    /// Schema prefix for qualified columns; only for unaliased tables.
    schema: Option<String>,
    /// Whether explicit columns get the qualifier.
    aliased: bool,
    /// Rendered as `LATERAL ...` in the FROM list.
    lateral: bool,
    descriptor: Option<&'s RecordDescriptor>,
    kind: BoundKind<'s>,
}

#[derive(Debug)]
enum BoundKind<'s> {
    Table(ResolvedTable),
    Subquery(&'s Select),
}

fn unique_alias(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|t| t == base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn explicit_alias(alias: &str, taken: &[String]) -> SqlResult<String> {
    if alias.is_empty() {
        return Err(SqlError::identifier("alias cannot be empty"));
    }
    if taken.iter().any(|t| t == alias) {
        return Err(SqlError::assembly(format!("duplicate table alias '{alias}'")));
    }
    Ok(alias.to_string())
}

impl<'s> Bound<'s> {
    fn new(source: &'s Source, taken: &[String]) -> SqlResult<Self> {
        match source {
            Source::Table { ident, schema } => {
                let table = resolve_table(ident, schema.as_deref())?;
                let (alias, qualifier, aliased) = match (&table.alias, table.qualifier()) {
                    // an alias equal to the table name is dropped
                    (Some(alias), _) => {
                        let alias = explicit_alias(alias, taken)?;
                        if matches!(&table.table, Resolved::Name(name) if *name == alias) {
                            (None, alias, false)
                        } else {
                            (Some(alias.clone()), alias, true)
                        }
                    }
                    (None, Some(name)) if taken.iter().any(|t| t == name) => {
                        let alias = unique_alias(name, taken);
                        (Some(alias.clone()), alias, true)
                    }
                    (None, Some(name)) => (None, name.to_string(), false),
                    (None, None) => {
                        let alias = unique_alias("t", taken);
                        (Some(alias.clone()), alias, true)
                    }
                };
                let schema = if alias.is_none() { table.schema.clone() } else { None };
                Ok(Self {
                    qualifier,
                    alias,
                    schema,
                    aliased,
                    lateral: false,
                    descriptor: ident.descriptor(),
                    kind: BoundKind::Table(table),
                })
            }
            Source::Subquery { query, alias } => {
                let alias = match alias {
                    Some(alias) => explicit_alias(alias, taken)?,
                    None => unique_alias("t", taken),
                };
                Ok(Self {
                    qualifier: alias.clone(),
                    alias: Some(alias),
                    schema: None,
                    aliased: true,
                    lateral: false,
                    descriptor: None,
                    kind: BoundKind::Subquery(query),
                })
            }
        }
    }

    fn render_table(&self, ctx: &mut Render<'_>) -> SqlResult<String> {
        let dialect = ctx.dialect();
        let table = match &self.kind {
            BoundKind::Table(table) => dialect.quote_table(
                table.table.token(),
                self.alias.as_deref(),
                table.schema.as_deref(),
            ),
            BoundKind::Subquery(query) => {
                let sql = query.render(ctx)?;
                dialect.quote_table(Token::Raw(&sql), self.alias.as_deref(), None)
            }
        };
        Ok(if self.lateral { format!("LATERAL {table}") } else { table })
    }

    fn render_columns(
        &self,
        dialect: &dyn Dialect,
        columns: &Columns,
        qualify: bool,
        out: &mut Vec<String>,
    ) -> SqlResult<()> {
        match columns.items() {
            None => out.push(dialect.quote_column(
                Token::Ident("*"),
                None,
                Some(&self.qualifier),
                self.schema.as_deref(),
            )?),
            Some(columns) => {
                let (table, schema) = if qualify {
                    (Some(self.qualifier.as_str()), self.schema.as_deref())
                } else {
                    (None, None)
                };
                for column in columns {
                    out.push(column.render(dialect, self.descriptor, table, schema)?);
                }
            }
        }
        Ok(())
    }
}
