//! Identifiers and their resolution.
//!
//! Tables, columns and qualifiers are named with an [`Identifier`]:
//!
//! - `Name("users")`: a plain name, quoted by the dialect
//! - `Aliased(base, "u")`: any identifier with an alias that overrides the base's
//!   name for rendering and field qualification
//! - `Literal(..)`: raw SQL, emitted verbatim
//! - `Record(..)`: a [`RecordRef`], taking table, schema and attribute to column
//!   translation from its descriptor
//!
//! Builders store identifiers unresolved; [`resolve_table`], [`resolve_field`]
//! and friends run at assemble time and report [`SqlError::Identifier`] for
//! malformed names or unknown record attributes.

use crate::dialect::{Dialect, FieldAlias, Token};
use crate::error::{SqlError, SqlResult};
use crate::qb::Select;
use crate::record::{RecordDescriptor, RecordRef};
use std::sync::Arc;

/// Raw SQL that bypasses quoting. The caller owns its safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal(String);

impl Literal {
    pub fn new(sql: impl Into<String>) -> Self {
        Literal(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A table, column or qualifier name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Name(String),
    Aliased(Box<Identifier>, String),
    Literal(Literal),
    Record(RecordRef),
}

impl Identifier {
    pub fn name(name: impl Into<String>) -> Self {
        Identifier::Name(name.into())
    }

    /// Wrap this identifier with an alias.
    #[must_use]
    pub fn alias(self, alias: impl Into<String>) -> Self {
        Identifier::Aliased(Box::new(self), alias.into())
    }

    /// Descriptor behind this identifier, looking through aliases.
    pub fn descriptor(&self) -> Option<&RecordDescriptor> {
        match self {
            Identifier::Record(r) => Some(&*r.descriptor),
            Identifier::Aliased(base, _) => base.descriptor(),
            _ => None,
        }
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Name(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier::Name(s)
    }
}

/// `(name, alias)`
impl From<(&str, &str)> for Identifier {
    fn from((name, alias): (&str, &str)) -> Self {
        Identifier::name(name).alias(alias)
    }
}

impl From<Literal> for Identifier {
    fn from(l: Literal) -> Self {
        Identifier::Literal(l)
    }
}

impl From<RecordRef> for Identifier {
    fn from(r: RecordRef) -> Self {
        Identifier::Record(r)
    }
}

impl From<&Arc<RecordDescriptor>> for Identifier {
    fn from(d: &Arc<RecordDescriptor>) -> Self {
        Identifier::Record(RecordRef::new(d))
    }
}

/// A resolved name: quoted identifier or raw SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Name(String),
    Literal(String),
}

impl Resolved {
    pub fn token(&self) -> Token<'_> {
        match self {
            Resolved::Name(n) => Token::Ident(n),
            Resolved::Literal(l) => Token::Raw(l),
        }
    }
}

/// Canonical `(schema, table_or_expr, alias)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTable {
    pub schema: Option<String>,
    pub table: Resolved,
    pub alias: Option<String>,
}

impl ResolvedTable {
    /// Name columns of this table are qualified with. `None` for an
    /// unaliased raw expression.
    pub fn qualifier(&self) -> Option<&str> {
        match (&self.alias, &self.table) {
            (Some(alias), _) => Some(alias),
            (None, Resolved::Name(name)) => Some(name),
            (None, Resolved::Literal(_)) => None,
        }
    }

    pub fn render(&self, dialect: &dyn Dialect) -> String {
        dialect.quote_table(self.table.token(), self.alias.as_deref(), self.schema.as_deref())
    }
}

/// Canonical `(field_name, alias, table_context)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: Resolved,
    pub alias: Option<String>,
    pub table: Option<String>,
    pub schema: Option<String>,
}

impl ResolvedField {
    pub fn render(&self, dialect: &dyn Dialect) -> SqlResult<String> {
        let alias = self.alias.clone().map(FieldAlias::Alias);
        dialect.quote_column(
            self.name.token(),
            alias.as_ref(),
            self.table.as_deref(),
            self.schema.as_deref(),
        )
    }
}

fn check_name(kind: &str, name: &str) -> SqlResult<()> {
    if name.is_empty() {
        return Err(SqlError::identifier(format!("{kind} cannot be empty")));
    }
    if name.contains('\0') {
        return Err(SqlError::identifier(format!(
            "{kind} cannot contain NUL character"
        )));
    }
    Ok(())
}

/// Resolve a table identifier. `schema` applies to plain names only; a record
/// brings its own schema.
pub fn resolve_table(ident: &Identifier, schema: Option<&str>) -> SqlResult<ResolvedTable> {
    match ident {
        Identifier::Record(r) => {
            if let Some(alias) = &r.alias {
                check_name("alias", alias)?;
            }
            Ok(ResolvedTable {
                schema: r.descriptor.schema().or(schema).map(str::to_string),
                table: Resolved::Name(r.descriptor.table().to_string()),
                alias: r.alias.clone(),
            })
        }
        Identifier::Aliased(base, alias) => {
            check_name("alias", alias)?;
            let mut resolved = resolve_table(base, schema)?;
            resolved.alias = Some(alias.clone());
            Ok(resolved)
        }
        Identifier::Literal(l) => Ok(ResolvedTable {
            schema: None,
            table: Resolved::Literal(l.as_str().to_string()),
            alias: None,
        }),
        Identifier::Name(name) => {
            check_name("table name", name)?;
            if let Some(schema) = schema {
                check_name("schema name", schema)?;
            }
            Ok(ResolvedTable {
                schema: schema.map(str::to_string),
                table: Resolved::Name(name.clone()),
                alias: None,
            })
        }
    }
}

/// Resolve a column name, translating record attributes through `owner`.
///
/// Returns the name and the alias carried by an `Aliased` identifier.
pub fn resolve_column(
    name: &Identifier,
    owner: Option<&RecordDescriptor>,
) -> SqlResult<(Resolved, Option<String>)> {
    match name {
        Identifier::Record(r) => Err(SqlError::identifier(format!(
            "record '{}' cannot be used as a column name",
            r.descriptor.table()
        ))),
        Identifier::Aliased(base, alias) => {
            check_name("alias", alias)?;
            let (resolved, _) = resolve_column(base, owner)?;
            Ok((resolved, Some(alias.clone())))
        }
        Identifier::Literal(l) => Ok((Resolved::Literal(l.as_str().to_string()), None)),
        Identifier::Name(n) => {
            check_name("column name", n)?;
            match owner {
                Some(d) if n != "*" => Ok((Resolved::Name(d.resolve_column(n)?.to_string()), None)),
                _ => Ok((Resolved::Name(n.clone()), None)),
            }
        }
    }
}

/// How an identifier qualifies fields: the qualifier name, the schema to
/// prefix (unaliased records only), and the descriptor for attribute lookup.
pub fn resolve_qualifier(
    ident: &Identifier,
) -> SqlResult<(String, Option<String>, Option<&RecordDescriptor>)> {
    match ident {
        Identifier::Name(n) => {
            check_name("table name", n)?;
            Ok((n.clone(), None, None))
        }
        Identifier::Aliased(base, alias) => {
            check_name("alias", alias)?;
            Ok((alias.clone(), None, base.descriptor()))
        }
        Identifier::Record(r) => {
            let schema = match r.alias {
                Some(_) => None,
                None => r.descriptor.schema().map(str::to_string),
            };
            Ok((r.qualifier().to_string(), schema, Some(&*r.descriptor)))
        }
        Identifier::Literal(l) => Err(SqlError::identifier(format!(
            "literal '{}' cannot qualify a field",
            l.as_str()
        ))),
    }
}

/// A column reference, optionally qualified by a table or alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub(crate) table: Option<Identifier>,
    pub(crate) name: Identifier,
}

impl Field {
    pub fn new(name: impl Into<Identifier>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    /// `"table"."name"`; a record table also translates `name` from an
    /// attribute to its column.
    pub fn qualified(table: impl Into<Identifier>, name: impl Into<Identifier>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// Qualify this field with `table`.
    #[must_use]
    pub fn of(mut self, table: impl Into<Identifier>) -> Self {
        self.table = Some(table.into());
        self
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::new(s)
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::new(s)
    }
}

impl From<Literal> for Field {
    fn from(l: Literal) -> Self {
        Field::new(l)
    }
}

impl From<Identifier> for Field {
    fn from(i: Identifier) -> Self {
        Field::new(i)
    }
}

/// Resolve a field reference.
pub fn resolve_field(field: &Field) -> SqlResult<ResolvedField> {
    resolve_field_in(field, None)
}

/// Resolve a field reference inside a statement targeting `target`:
/// unqualified names are record attributes of `target`.
pub fn resolve_field_in(
    field: &Field,
    target: Option<&RecordDescriptor>,
) -> SqlResult<ResolvedField> {
    let (table, schema, owner) = match &field.table {
        Some(ident) => {
            let (q, s, d) = resolve_qualifier(ident)?;
            (Some(q), s, d)
        }
        None => (None, None, target),
    };
    let (name, alias) = resolve_column(&field.name, owner)?;
    Ok(ResolvedField {
        name,
        alias,
        table,
        schema,
    })
}

/// One entry of a select list: a name or expression with optional alias and cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub(crate) name: Identifier,
    pub(crate) alias: Option<String>,
    pub(crate) cast: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            cast: None,
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Render as `CAST(col AS cast_type)`, or the dialect's equivalent.
    #[must_use]
    pub fn cast(mut self, cast_type: impl Into<String>) -> Self {
        self.cast = Some(cast_type.into());
        self
    }

    /// Render this column. `table`/`schema` qualify plain names;
    /// `owner` translates record attributes.
    pub(crate) fn render(
        &self,
        dialect: &dyn Dialect,
        owner: Option<&RecordDescriptor>,
        table: Option<&str>,
        schema: Option<&str>,
    ) -> SqlResult<String> {
        let (name, ident_alias) = resolve_column(&self.name, owner)?;
        let alias = self.alias.as_deref().or(ident_alias.as_deref());
        if let Some(alias) = alias {
            check_name("alias", alias)?;
        }
        let field_alias = FieldAlias::from_parts(self.cast.as_deref(), alias);
        dialect.quote_column(name.token(), field_alias.as_ref(), table, schema)
    }
}

impl From<&str> for Column {
    fn from(s: &str) -> Self {
        Column::new(s)
    }
}

impl From<String> for Column {
    fn from(s: String) -> Self {
        Column::new(s)
    }
}

/// `(name, alias)`
impl From<(&str, &str)> for Column {
    fn from((name, alias): (&str, &str)) -> Self {
        Column::new(name).alias(alias)
    }
}

impl From<Literal> for Column {
    fn from(l: Literal) -> Self {
        Column::new(l)
    }
}

impl From<Identifier> for Column {
    fn from(i: Identifier) -> Self {
        Column::new(i)
    }
}

/// The column list of one source. `All` is the wildcard; an empty list means
/// the same.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Columns {
    #[default]
    All,
    List(Vec<Column>),
}

impl Columns {
    pub(crate) fn items(&self) -> Option<&[Column]> {
        match self {
            Columns::List(cols) if !cols.is_empty() => Some(cols),
            _ => None,
        }
    }
}

impl From<&str> for Columns {
    fn from(s: &str) -> Self {
        Columns::List(vec![Column::from(s)])
    }
}

impl From<String> for Columns {
    fn from(s: String) -> Self {
        Columns::List(vec![Column::from(s)])
    }
}

impl From<Column> for Columns {
    fn from(c: Column) -> Self {
        Columns::List(vec![c])
    }
}

impl From<Literal> for Columns {
    fn from(l: Literal) -> Self {
        Columns::List(vec![Column::from(l)])
    }
}

impl<T: Into<Column>> From<Vec<T>> for Columns {
    fn from(cols: Vec<T>) -> Self {
        Columns::List(cols.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Column>, const N: usize> From<[T; N]> for Columns {
    fn from(cols: [T; N]) -> Self {
        Columns::List(cols.into_iter().map(Into::into).collect())
    }
}

/// A FROM/JOIN/target source: a table-like identifier or a subquery.
#[derive(Debug, Clone)]
pub enum Source {
    Table {
        ident: Identifier,
        schema: Option<String>,
    },
    Subquery {
        query: Box<Select>,
        alias: Option<String>,
    },
}

impl Source {
    pub fn table(ident: impl Into<Identifier>) -> Self {
        Source::Table {
            ident: ident.into(),
            schema: None,
        }
    }

    pub fn subquery(query: Select) -> Self {
        Source::Subquery {
            query: Box::new(query),
            alias: None,
        }
    }

    /// Set the schema of a plain table name.
    #[must_use]
    pub fn schema(mut self, name: impl Into<String>) -> Self {
        if let Source::Table { schema, .. } = &mut self {
            *schema = Some(name.into());
        }
        self
    }

    #[must_use]
    pub fn alias(self, alias: impl Into<String>) -> Self {
        match self {
            Source::Table { ident, schema } => Source::Table {
                ident: ident.alias(alias),
                schema,
            },
            Source::Subquery { query, .. } => Source::Subquery {
                query,
                alias: Some(alias.into()),
            },
        }
    }

    /// Resolve a table source, rejecting subqueries.
    pub(crate) fn resolve_target(&self, statement: &str) -> SqlResult<ResolvedTable> {
        match self {
            Source::Table { ident, schema } => resolve_table(ident, schema.as_deref()),
            Source::Subquery { .. } => Err(SqlError::assembly(format!(
                "{statement} target must be a table, not a subquery"
            ))),
        }
    }

    pub(crate) fn descriptor(&self) -> Option<&RecordDescriptor> {
        match self {
            Source::Table { ident, .. } => ident.descriptor(),
            Source::Subquery { .. } => None,
        }
    }
}

macro_rules! impl_source_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Source {
                fn from(v: $ty) -> Self {
                    Source::table(v)
                }
            }
        )*
    };
}

impl_source_from!(&str, String, (&str, &str), Identifier, Literal, RecordRef, &Arc<RecordDescriptor>);

impl From<Select> for Source {
    fn from(query: Select) -> Self {
        Source::subquery(query)
    }
}
