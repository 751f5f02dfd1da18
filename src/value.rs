//! The generated value tree.
//!
//! This mirrors `apache_avro::types::Value` shape-for-shape so that, under
//! the `apache-avro-interop` feature, a generated tree can be hand-off
//! converted with `.into()` to the value type the real encoders expect,
//! without this crate hard-depending on any particular Avro implementation
//! by default.
use std::collections::HashMap;

use serde::Serialize;

/// A single generated value, matching one schema node's shape.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// `null`.
    Null,
    /// `boolean`.
    Boolean(bool),
    /// `int`, 32-bit signed.
    Int(i32),
    /// `long`, 64-bit signed.
    Long(i64),
    /// `float`, 32-bit IEEE.
    Float(f32),
    /// `double`, 64-bit IEEE.
    Double(f64),
    /// `bytes`, including decimal-logical-type encodings.
    Bytes(Vec<u8>),
    /// `string`, UTF-8 text.
    String(String),
    /// `fixed`, a byte buffer of the schema's declared size.
    Fixed(Vec<u8>),
    /// `enum`, an ordinal plus the symbol name at that ordinal.
    Enum(u32, String),
    /// `array`, an ordered sequence of values.
    Array(Vec<Value>),
    /// `map`, a string-keyed mapping of values.
    Map(HashMap<String, Value>),
    /// `record`, an ordered sequence of (field name, value) pairs.
    Record(Vec<(String, Value)>),
    /// `union`, the index of the selected member plus its value.
    Union(u32, Box<Value>),
}

#[cfg(feature = "apache-avro-interop")]
impl From<Value> for apache_avro::types::Value {
    fn from(v: Value) -> Self {
        use apache_avro::types::Value as A;
        match v {
            Value::Null => A::Null,
            Value::Boolean(b) => A::Boolean(b),
            Value::Int(i) => A::Int(i),
            Value::Long(l) => A::Long(l),
            Value::Float(f) => A::Float(f),
            Value::Double(d) => A::Double(d),
            Value::Bytes(b) => A::Bytes(b),
            Value::String(s) => A::String(s),
            Value::Fixed(b) => A::Fixed(b.len(), b),
            Value::Enum(i, s) => A::Enum(i as i32, s),
            Value::Array(vs) => A::Array(vs.into_iter().map(Into::into).collect()),
            Value::Map(m) => A::Map(m.into_iter().map(|(k, v)| (k, v.into())).collect()),
            Value::Record(fields) => {
                A::Record(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Union(idx, inner) => A::Union(idx, Box::new((*inner).into())),
        }
    }
}
