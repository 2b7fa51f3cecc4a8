//! Record descriptors: table metadata consumed by the statement builders.
//!
//! A [`RecordDescriptor`] is built once and shared behind an [`Arc`]:
//!
//! ```ignore
//! use std::sync::{Arc, LazyLock};
//! use sqlcraft::RecordDescriptor;
//!
//! static BOOK: LazyLock<Arc<RecordDescriptor>> = LazyLock::new(|| {
//!     RecordDescriptor::builder("book")
//!         .schema("library")
//!         .primary_key("id_book")
//!         .field("id", "id_book")
//!         .field("title", "title")
//!         .build()
//! });
//! ```
//!
//! Instances are read through the [`Record`] trait; [`RecordData`] is a
//! ready-made dynamic instance.

use crate::error::{SqlError, SqlResult};
use crate::ident::{Field, Identifier};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Table name, schema, primary key and ordered attribute to column mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    table: String,
    schema: Option<String>,
    primary_key: Option<String>,
    fields: Vec<(String, String)>,
}

impl RecordDescriptor {
    /// Start describing a record stored in `table`.
    pub fn builder(table: impl Into<String>) -> RecordDescriptorBuilder {
        RecordDescriptorBuilder {
            descriptor: RecordDescriptor {
                table: table.into(),
                schema: None,
                primary_key: None,
                fields: Vec::new(),
            },
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Primary key column name.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// `(attribute, column)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    /// Column names in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, c)| c.as_str())
    }

    /// Translate an attribute name to its column. Column names are accepted
    /// as well and map to themselves.
    pub fn column(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(attr, _)| attr == name)
            .or_else(|| self.fields.iter().find(|(_, col)| col == name))
            .map(|(_, col)| col.as_str())
    }

    /// Like [`column`](Self::column), failing with an identifier error.
    pub fn resolve_column(&self, name: &str) -> SqlResult<&str> {
        self.column(name).ok_or_else(|| {
            SqlError::identifier(format!(
                "unknown attribute '{name}' for record '{}'",
                self.table
            ))
        })
    }
}

/// Builder for [`RecordDescriptor`].
#[derive(Debug, Clone)]
#[must_use]
pub struct RecordDescriptorBuilder {
    descriptor: RecordDescriptor,
}

impl RecordDescriptorBuilder {
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.descriptor.schema = Some(schema.into());
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.descriptor.primary_key = Some(column.into());
        self
    }

    /// Map `attribute` to `column`. Redeclaring an attribute replaces its
    /// column but keeps its position.
    pub fn field(mut self, attribute: impl Into<String>, column: impl Into<String>) -> Self {
        let attribute = attribute.into();
        let column = column.into();
        match self.descriptor.fields.iter_mut().find(|(a, _)| *a == attribute) {
            Some(entry) => entry.1 = column,
            None => self.descriptor.fields.push((attribute, column)),
        }
        self
    }

    pub fn build(self) -> Arc<RecordDescriptor> {
        Arc::new(self.descriptor)
    }
}

/// A reference to a record's table, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    pub(crate) descriptor: Arc<RecordDescriptor>,
    pub(crate) alias: Option<String>,
}

impl RecordRef {
    pub fn new(descriptor: &Arc<RecordDescriptor>) -> Self {
        Self {
            descriptor: Arc::clone(descriptor),
            alias: None,
        }
    }

    /// Qualify this table (and fields taken from it) with `alias`.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn descriptor(&self) -> &RecordDescriptor {
        &self.descriptor
    }

    /// Name used to qualify columns: the alias, else the table name.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.descriptor.table)
    }

    /// A field of this record, by attribute (or column) name.
    pub fn field(&self, attribute: impl Into<String>) -> Field {
        Field::qualified(Identifier::Record(self.clone()), attribute.into())
    }
}

/// A record instance: its descriptor and current attribute values.
///
/// `attribute` returns `None` for attributes that are not set; those are left
/// out of INSERT/UPDATE value lists.
pub trait Record {
    fn descriptor(&self) -> &Arc<RecordDescriptor>;

    fn attribute(&self, name: &str) -> Option<Value>;

    /// An error recorded while the instance was filled, reported by the
    /// statement it is added to.
    fn error(&self) -> Option<&SqlError> {
        None
    }

    /// `(column, value)` for every set attribute, in declaration order.
    fn column_values(&self) -> Vec<(String, Value)> {
        let descriptor = Arc::clone(self.descriptor());
        descriptor
            .fields()
            .filter_map(|(attr, col)| self.attribute(attr).map(|v| (col.to_string(), v)))
            .collect()
    }
}

/// A dynamic record instance keyed by attribute name.
#[derive(Debug, Clone)]
pub struct RecordData {
    descriptor: Arc<RecordDescriptor>,
    values: HashMap<String, Value>,
    error: Option<SqlError>,
}

impl RecordData {
    pub fn new(descriptor: &Arc<RecordDescriptor>) -> Self {
        Self {
            descriptor: Arc::clone(descriptor),
            values: HashMap::new(),
            error: None,
        }
    }

    /// Set an attribute. The first unknown attribute is kept and reported by
    /// `assemble()` of the statement this record is added to.
    #[must_use]
    pub fn set(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        if let Err(err) = self.try_set(attribute, value) {
            self.error.get_or_insert(err);
        }
        self
    }

    pub fn try_set(&mut self, attribute: &str, value: impl Into<Value>) -> SqlResult<()> {
        let attr = self
            .descriptor
            .fields()
            .find(|(a, c)| *a == attribute || *c == attribute)
            .map(|(a, _)| a.to_string())
            .ok_or_else(|| {
                SqlError::identifier(format!(
                    "unknown attribute '{attribute}' for record '{}'",
                    self.descriptor.table()
                ))
            })?;
        self.values.insert(attr, value.into());
        Ok(())
    }

    /// Fill an instance from a JSON object keyed by attribute (or column) name.
    pub fn from_json(
        descriptor: &Arc<RecordDescriptor>,
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> SqlResult<Self> {
        let mut data = Self::new(descriptor);
        for (key, value) in object {
            data.try_set(key, Value::from(value.clone()))?;
        }
        Ok(data)
    }
}

impl Record for RecordData {
    fn descriptor(&self) -> &Arc<RecordDescriptor> {
        &self.descriptor
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn error(&self) -> Option<&SqlError> {
        self.error.as_ref()
    }
}
