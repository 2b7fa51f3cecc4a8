//! SQL dialects: identifier quoting, placeholders and casts.
//!
//! A [`Dialect`] is a pure set of rendering rules. Statement builders never
//! format identifiers or placeholders themselves; they hand resolved names to
//! the dialect of the statement being assembled.
//!
//! | dialect | placeholder | cast |
//! |---|---|---|
//! | [`GenericDialect`] | `?` | `CAST(x AS t)` |
//! | [`SqliteDialect`] | `?` | `CAST(x AS t)` |
//! | [`PgDialect`] | `$1`, `$2`, ... | `x::t` |

use crate::error::{SqlError, SqlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A name handed to the dialect: either an identifier to quote or raw SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Identifier, quoted on output (`*` excepted).
    Ident(&'a str),
    /// Raw SQL, emitted verbatim.
    Raw(&'a str),
}

/// Alias argument of [`Dialect::quote_column`].
///
/// `Cast` holds `[cast_type]` or `[cast_type, alias]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAlias {
    Alias(String),
    Cast(Vec<String>),
}

impl FieldAlias {
    /// Build the alias argument for an optional cast and alias.
    pub fn from_parts(cast: Option<&str>, alias: Option<&str>) -> Option<Self> {
        match (cast, alias) {
            (Some(cast), Some(alias)) => Some(Self::Cast(vec![cast.to_string(), alias.to_string()])),
            (Some(cast), None) => Some(Self::Cast(vec![cast.to_string()])),
            (None, Some(alias)) => Some(Self::Alias(alias.to_string())),
            (None, None) => None,
        }
    }
}

/// Rendering rules for one SQL engine.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Short engine name, used in logs.
    fn name(&self) -> &'static str;

    /// Placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Whether `ILIKE` may be used in predicates.
    fn supports_ilike(&self) -> bool {
        true
    }

    /// Cast expression.
    fn cast(&self, expr: &str, cast_type: &str) -> String {
        format!("CAST({expr} AS {cast_type})")
    }

    /// Quote a single identifier, doubling embedded quotes.
    fn quote_identifier(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        out.push('"');
        for ch in name.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
        out
    }

    /// `["schema".]"table" [AS "alias"]`; raw tables render as `(expr)`.
    fn quote_table(&self, table: Token<'_>, alias: Option<&str>, schema: Option<&str>) -> String {
        let mut out = match table {
            Token::Raw(expr) => format!("({expr})"),
            Token::Ident(name) => match schema {
                Some(schema) => format!(
                    "{}.{}",
                    self.quote_identifier(schema),
                    self.quote_identifier(name)
                ),
                None => self.quote_identifier(name),
            },
        };
        if let Some(alias) = alias {
            out.push_str(" AS ");
            out.push_str(&self.quote_identifier(alias));
        }
        out
    }

    /// `["schema".]["table".]"column"`, with an optional alias or cast.
    ///
    /// Raw columns ignore `table`/`schema`. A `FieldAlias::Cast` must carry one
    /// or two elements.
    fn quote_column(
        &self,
        column: Token<'_>,
        alias: Option<&FieldAlias>,
        table: Option<&str>,
        schema: Option<&str>,
    ) -> SqlResult<String> {
        let mut expr = match column {
            Token::Raw(raw) => raw.to_string(),
            Token::Ident(name) => {
                let mut out = String::new();
                if let Some(table) = table {
                    if let Some(schema) = schema {
                        out.push_str(&self.quote_identifier(schema));
                        out.push('.');
                    }
                    out.push_str(&self.quote_identifier(table));
                    out.push('.');
                }
                if name == "*" {
                    out.push('*');
                } else {
                    out.push_str(&self.quote_identifier(name));
                }
                out
            }
        };

        match alias {
            None => {}
            Some(FieldAlias::Alias(alias)) => {
                expr.push_str(" AS ");
                expr.push_str(&self.quote_identifier(alias));
            }
            Some(FieldAlias::Cast(parts)) => match parts.as_slice() {
                [cast_type] => expr = self.cast(&expr, cast_type),
                [cast_type, alias] => {
                    expr = format!("{} AS {}", self.cast(&expr, cast_type), self.quote_identifier(alias));
                }
                [] => return Err(SqlError::dialect("CAST requires a type argument")),
                _ => {
                    return Err(SqlError::dialect(format!(
                        "CAST takes a type and an optional alias, got {} arguments",
                        parts.len()
                    )));
                }
            },
        }
        Ok(expr)
    }
}

/// Engine-neutral rules: `?` placeholders and standard `CAST`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

/// SQLite: `?` placeholders, no `ILIKE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn supports_ilike(&self) -> bool {
        false
    }
}

/// PostgreSQL: numbered `$n` placeholders and `::` casts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgDialect;

impl Dialect for PgDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn cast(&self, expr: &str, cast_type: &str) -> String {
        format!("{expr}::{cast_type}")
    }
}

/// Dialect selection by name, e.g. from a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Generic,
    Sqlite,
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
}

impl DialectKind {
    /// Instantiate the selected dialect.
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            DialectKind::Generic => Arc::new(GenericDialect),
            DialectKind::Sqlite => Arc::new(SqliteDialect),
            DialectKind::Postgres => Arc::new(PgDialect),
        }
    }
}

impl FromStr for DialectKind {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(DialectKind::Generic),
            "sqlite" => Ok(DialectKind::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            other => Err(SqlError::dialect(format!("unknown dialect '{other}'"))),
        }
    }
}

pub(crate) fn default_dialect() -> Arc<dyn Dialect> {
    Arc::new(GenericDialect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_table_forms() {
        let d = GenericDialect;
        assert_eq!(d.quote_table(Token::Ident("t"), None, None), r#""t""#);
        assert_eq!(
            d.quote_table(Token::Ident("t"), Some("x"), Some("public")),
            r#""public"."t" AS "x""#
        );
        assert_eq!(
            d.quote_table(Token::Raw("SELECT 1"), Some("t"), Some("ignored")),
            r#"(SELECT 1) AS "t""#
        );
    }

    #[test]
    fn quote_column_forms() {
        let d = GenericDialect;
        assert_eq!(
            d.quote_column(Token::Ident("f"), None, Some("t"), Some("s")).unwrap(),
            r#""s"."t"."f""#
        );
        assert_eq!(
            d.quote_column(Token::Ident("*"), None, Some("t"), None).unwrap(),
            r#""t".*"#
        );
        assert_eq!(
            d.quote_column(
                Token::Raw("TOP(field)"),
                Some(&FieldAlias::Alias("alias".into())),
                Some("table"),
                Some("schema"),
            )
            .unwrap(),
            r#"TOP(field) AS "alias""#
        );
    }

    #[test]
    fn quote_column_cast() {
        let d = GenericDialect;
        let cast = FieldAlias::Cast(vec!["text".into()]);
        assert_eq!(
            d.quote_column(Token::Ident("f"), Some(&cast), None, None).unwrap(),
            r#"CAST("f" AS text)"#
        );
        let cast_alias = FieldAlias::Cast(vec!["text".into(), "x".into()]);
        assert_eq!(
            d.quote_column(Token::Ident("f"), Some(&cast_alias), Some("t"), None).unwrap(),
            r#"CAST("t"."f" AS text) AS "x""#
        );
        assert_eq!(
            PgDialect
                .quote_column(Token::Ident("f"), Some(&cast_alias), None, None)
                .unwrap(),
            r#""f"::text AS "x""#
        );
    }

    #[test]
    fn quote_column_empty_cast_is_dialect_error() {
        let err = GenericDialect
            .quote_column(Token::Ident("f"), Some(&FieldAlias::Cast(vec![])), None, None)
            .unwrap_err();
        assert!(err.is_dialect());
    }

    #[test]
    fn quote_identifier_escapes_quotes() {
        assert_eq!(PgDialect.quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn placeholders() {
        assert_eq!(SqliteDialect.placeholder(3), "?");
        assert_eq!(PgDialect.placeholder(3), "$3");
    }

    #[test]
    fn dialect_kind_parse() {
        assert_eq!("PostgreSQL".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("sqlite".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        assert!("oracle".parse::<DialectKind>().is_err());
        assert_eq!(DialectKind::Postgres.dialect().name(), "postgres");
    }
}
