//! Boolean clause stack for WHERE/HAVING.
//!
//! Predicates are appended to the innermost open group; groups are opened and
//! closed explicitly, so nesting can be decided while a chain is built:
//!
//! ```ignore
//! select()
//!     .from("t")
//!     .where_("id", ">", 5)
//!     .where_and()
//!     .where_("n", "IS NOT NULL", ())
//!     .or_where("cp", "IN", vec![1, 2])
//!     .where_end();
//! // WHERE ("id" > ?) AND ( ("n" IS NOT NULL) OR ("cp" IN ?) )
//! ```
//!
//! Depth is checked when the owning statement is assembled, never earlier.

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident::{Field, Literal, resolve_field_in};
use crate::qb::param::Render;
use crate::qb::select::Select;
use crate::qb::traits::SqlStatement;
use crate::record::RecordDescriptor;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// Joins a node to its previous sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn keyword(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// Right-hand side of a predicate, or a value in INSERT/UPDATE.
#[derive(Debug, Clone)]
pub enum Operand {
    /// No value: `field OP` only.
    None,
    /// Bound to one placeholder, lists included.
    Value(Value),
    /// Emitted verbatim.
    Literal(Literal),
    /// Another column, quoted.
    Field(Field),
    /// `(SELECT ...)` with its values spliced in place.
    Subquery(Box<Select>),
}

impl Operand {
    /// Render the operand; `None` renders nothing. Unqualified field operands
    /// are translated through `owner`.
    pub(crate) fn render(
        &self,
        ctx: &mut Render<'_>,
        owner: Option<&RecordDescriptor>,
    ) -> SqlResult<Option<String>> {
        match self {
            Operand::None => Ok(None),
            Operand::Value(v) => Ok(Some(ctx.bind(v.clone()))),
            Operand::Literal(l) => Ok(Some(l.as_str().to_string())),
            Operand::Field(f) => resolve_field_in(f, owner)?.render(ctx.dialect()).map(Some),
            Operand::Subquery(q) => Ok(Some(format!("({})", q.render(ctx)?))),
        }
    }
}

macro_rules! impl_operand_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_operand_from_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    &str,
    &String,
    Uuid,
    NaiveDate,
    NaiveDateTime,
    DateTime<Utc>,
    serde_json::Value,
);

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(v: Vec<T>) -> Self {
        Operand::Value(Value::from(v))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(v: [T; N]) -> Self {
        Operand::Value(Value::from(v))
    }
}

impl From<()> for Operand {
    fn from(_: ()) -> Self {
        Operand::None
    }
}

impl From<Literal> for Operand {
    fn from(l: Literal) -> Self {
        Operand::Literal(l)
    }
}

impl From<Field> for Operand {
    fn from(f: Field) -> Self {
        Operand::Field(f)
    }
}

impl From<Select> for Operand {
    fn from(q: Select) -> Self {
        Operand::Subquery(Box::new(q))
    }
}

/// `field operator value`
///
/// A null value given to an operator with no value slot (`IS NULL`,
/// `IS NOT TRUE`, ...) binds nothing.
#[derive(Debug, Clone)]
pub struct Predicate {
    field: Field,
    operator: String,
    value: Operand,
}

impl Predicate {
    pub fn new(field: impl Into<Field>, operator: impl Into<String>, value: impl Into<Operand>) -> Self {
        let operator = operator.into();
        let value = match value.into() {
            Operand::Value(Value::Null) if !takes_value(&operator) => Operand::None,
            value => value,
        };
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// Whether `operator` expects a right-hand value.
fn takes_value(operator: &str) -> bool {
    match operator.split_whitespace().last() {
        None => false,
        Some(word) => !["NULL", "TRUE", "FALSE", "UNKNOWN"]
            .iter()
            .any(|k| word.eq_ignore_ascii_case(k)),
    }
}

/// How predicates and groups are wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseStyle {
    /// `("a" = ?) AND ( ("b" = ?) OR ("c" = ?) )`
    Parenthesized,
    /// `"a" = ? AND ("b" = ? OR "c" = ?)`
    Bare,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(Predicate),
    Group(Vec<(Connector, Node)>),
}

/// Nestable AND/OR clause tree with an explicit stack of open groups.
#[derive(Debug, Clone)]
pub struct ClauseStack {
    style: ClauseStyle,
    root: Vec<(Connector, Node)>,
    open: Vec<(Connector, Vec<(Connector, Node)>)>,
    excess_closes: usize,
}

impl ClauseStack {
    pub fn new(style: ClauseStyle) -> Self {
        Self {
            style,
            root: Vec::new(),
            open: Vec::new(),
            excess_closes: 0,
        }
    }

    fn top(&mut self) -> &mut Vec<(Connector, Node)> {
        match self.open.last_mut() {
            Some((_, children)) => children,
            None => &mut self.root,
        }
    }

    /// Append a predicate to the innermost open group.
    pub fn add(&mut self, connector: Connector, predicate: Predicate) {
        self.top().push((connector, Node::Leaf(predicate)));
    }

    /// Open a group joined to its previous sibling by `connector`.
    pub fn open_group(&mut self, connector: Connector) {
        self.open.push((connector, Vec::new()));
    }

    /// Close the innermost group. Closing with nothing open is reported at
    /// assemble time.
    pub fn close_group(&mut self) {
        match self.open.pop() {
            Some((connector, children)) => self.top().push((connector, Node::Group(children))),
            None => self.excess_closes += 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.open.is_empty()
    }

    /// Fail unless every opened group was closed exactly once.
    pub fn check(&self) -> SqlResult<()> {
        if !self.open.is_empty() {
            return Err(SqlError::assembly(format!(
                "{} clause group(s) opened but not closed",
                self.open.len()
            )));
        }
        if self.excess_closes > 0 {
            return Err(SqlError::assembly(format!(
                "{} clause group(s) closed without a matching open",
                self.excess_closes
            )));
        }
        Ok(())
    }

    /// Render into a shared context. Empty when there are no predicates.
    ///
    /// Unqualified fields are translated and checked through `owner`, the
    /// record the statement targets.
    pub fn build_into(
        &self,
        ctx: &mut Render<'_>,
        owner: Option<&RecordDescriptor>,
    ) -> SqlResult<String> {
        self.check()?;
        self.render_nodes(&self.root, ctx, owner)
    }

    /// Render on its own: `(fragment, values)`.
    pub fn build(&self, dialect: &dyn Dialect) -> SqlResult<(String, Vec<Value>)> {
        let mut ctx = Render::new(dialect);
        let sql = self.build_into(&mut ctx, None)?;
        Ok((sql, ctx.into_values()))
    }

    fn render_nodes(
        &self,
        nodes: &[(Connector, Node)],
        ctx: &mut Render<'_>,
        owner: Option<&RecordDescriptor>,
    ) -> SqlResult<String> {
        let mut out = String::new();
        let mut rendered = 0;
        for (connector, node) in nodes {
            let sql = match node {
                Node::Leaf(predicate) => self.render_predicate(predicate, ctx, owner)?,
                Node::Group(children) => {
                    let inner = self.render_nodes(children, ctx, owner)?;
                    if inner.is_empty() {
                        continue;
                    }
                    match self.style {
                        ClauseStyle::Parenthesized => format!("( {inner} )"),
                        ClauseStyle::Bare => format!("({inner})"),
                    }
                }
            };
            // the first rendered node binds to the enclosing group's position
            if rendered > 0 {
                out.push(' ');
                out.push_str(connector.keyword());
                out.push(' ');
            }
            out.push_str(&sql);
            rendered += 1;
        }
        Ok(out)
    }

    fn render_predicate(
        &self,
        predicate: &Predicate,
        ctx: &mut Render<'_>,
        owner: Option<&RecordDescriptor>,
    ) -> SqlResult<String> {
        let dialect = ctx.dialect();
        let operator = predicate.operator.trim();
        if !dialect.supports_ilike()
            && operator
                .split_whitespace()
                .any(|word| word.eq_ignore_ascii_case("ILIKE"))
        {
            return Err(SqlError::dialect(format!(
                "{} dialect does not support ILIKE",
                dialect.name()
            )));
        }

        let mut sql = resolve_field_in(&predicate.field, owner)?.render(dialect)?;
        if !operator.is_empty() {
            sql.push(' ');
            sql.push_str(operator);
        }
        if let Some(value) = predicate.value.render(ctx, owner)? {
            sql.push(' ');
            sql.push_str(&value);
        }

        Ok(match self.style {
            ClauseStyle::Parenthesized => format!("({sql})"),
            ClauseStyle::Bare => sql,
        })
    }
}
