//! Parameter collection shared by a statement and everything nested in it.

use crate::dialect::Dialect;
use crate::value::Value;

/// Ordered parameter values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    values: Vec<Value>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Add a value and return its 1-based index.
    pub fn push(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

/// Rendering state for one `assemble()` call.
///
/// Sub-statements render into the same context, so placeholder numbering
/// continues across them and values land in textual order.
#[derive(Debug)]
pub struct Render<'d> {
    dialect: &'d dyn Dialect,
    params: ParamList,
}

impl<'d> Render<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            params: ParamList::new(),
        }
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Record `value` and return its placeholder.
    pub fn bind(&mut self, value: Value) -> String {
        let index = self.params.push(value);
        self.dialect.placeholder(index)
    }

    pub fn params(&self) -> &ParamList {
        &self.params
    }

    pub fn into_values(self) -> Vec<Value> {
        self.params.into_vec()
    }
}
