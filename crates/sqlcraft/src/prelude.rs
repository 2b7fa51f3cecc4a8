//! Convenient imports for typical `sqlcraft` usage.
//!
//! ```ignore
//! use sqlcraft::prelude::*;
//! ```

pub use crate::{
    Column, Config, Delete, Field, Insert, Join, Literal, Order, QueryBuilder, Record, RecordData,
    RecordDescriptor, RecordRef, Select, SqlError, SqlResult, SqlStatement, UnionKind, Update,
    Value, With, delete, insert, select, update, with,
};
