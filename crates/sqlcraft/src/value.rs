//! Database-agnostic parameter values.
//!
//! Every `assemble()` call returns its parameters as a `Vec<Value>`, in the
//! same left-to-right order as the placeholders in the SQL text. A
//! [`Value::List`] is bound to a single placeholder as a whole; expanding it is
//! left to the driver.
//!
//! With the `postgres` feature, [`Value`] implements
//! `tokio_postgres::types::ToSql` so the list can be passed to a client as is.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A single bound parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    /// A sequence bound to one placeholder (e.g. the right side of `IN`).
    List(Vec<Value>),
}

impl Value {
    /// Check if this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer content, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_value_from!(
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
);

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// JSON scalars map onto the matching variant; arrays become lists and objects
/// stay JSON.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Json(serde_json::Value::Number(n)), Value::Float),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            obj @ serde_json::Value::Object(_) => Value::Json(obj),
        }
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    use super::Value;
    use bytes::BytesMut;
    use std::error::Error;
    use tokio_postgres::types::{IsNull, Kind, ToSql, Type};

    impl ToSql for Value {
        fn to_sql(
            &self,
            ty: &Type,
            out: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
            match self {
                Value::Null => Ok(IsNull::Yes),
                Value::Bool(v) => v.to_sql(ty, out),
                Value::Int(v) => match *ty {
                    Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                    Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                    _ => v.to_sql(ty, out),
                },
                Value::Float(v) => match *ty {
                    Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                    _ => v.to_sql(ty, out),
                },
                Value::Text(v) => v.to_sql(ty, out),
                Value::Bytes(v) => v.to_sql(ty, out),
                Value::Json(v) => v.to_sql(ty, out),
                Value::Uuid(v) => v.to_sql(ty, out),
                Value::Date(v) => v.to_sql(ty, out),
                Value::Timestamp(v) => v.to_sql(ty, out),
                Value::TimestampTz(v) => v.to_sql(ty, out),
                Value::List(items) => {
                    if !matches!(ty.kind(), Kind::Array(_)) {
                        return Err(format!("list value bound to non-array type: {}", ty).into());
                    }
                    items.to_sql(ty, out)
                }
            }
        }

        fn accepts(_ty: &Type) -> bool {
            true
        }

        tokio_postgres::types::to_sql_checked!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_from_scalars() {
        assert_eq!(Value::from(5_i32), Value::Int(5));
        assert_eq!(Value::from("x"), Value::Text("x".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(true), Value::Bool(true));
    }

    #[test]
    fn value_from_sequence_is_one_list() {
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(Value::from(["a"]), Value::List(vec![Value::from("a")]));
    }

    #[test]
    fn value_from_json() {
        let v = Value::from(serde_json::json!([1, "a", null, 1.5]));
        assert_eq!(
            v,
            Value::List(vec![
                Value::Int(1),
                Value::from("a"),
                Value::Null,
                Value::Float(1.5)
            ])
        );
        assert!(matches!(
            Value::from(serde_json::json!({"k": 1})),
            Value::Json(_)
        ));
    }

    #[test]
    fn value_serializes_untagged() {
        let json = serde_json::to_string(&vec![Value::from(5), Value::from(vec![1, 2])]).unwrap();
        assert_eq!(json, "[5,[1,2]]");
    }
}
