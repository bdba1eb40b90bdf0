//! Storable value shapes
//!
//! A registry stores ten concrete shapes: `i32`, `f32` and their 2 to 4
//! component arrays, `bool` and `String`. Each shape has a [`ValueType`] tag
//! and lives in its own typed mapping inside the registry.

pub mod handle;
pub(crate) mod typed;

use std::fmt;
use std::str::FromStr;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

pub use handle::ValueRef;
pub(crate) use typed::TypedMaps;

/// Tag recording which shape a name currently holds.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Not registered
    #[default]
    #[display("none")]
    None,
    #[display("int")]
    Int,
    #[display("int2")]
    Int2,
    #[display("int3")]
    Int3,
    #[display("int4")]
    Int4,
    #[display("float")]
    Float,
    #[display("float2")]
    Float2,
    #[display("float3")]
    Float3,
    #[display("float4")]
    Float4,
    #[display("bool")]
    Bool,
    #[display("string")]
    String,
}

impl ValueType {
    /// Number of whitespace separated components in the text form.
    ///
    /// Strings and `None` have no fixed count and report `None`.
    pub fn components(self) -> Option<usize> {
        match self {
            ValueType::Int | ValueType::Float | ValueType::Bool => Some(1),
            ValueType::Int2 | ValueType::Float2 => Some(2),
            ValueType::Int3 | ValueType::Float3 => Some(3),
            ValueType::Int4 | ValueType::Float4 => Some(4),
            ValueType::String | ValueType::None => None,
        }
    }
}

/// Error for a type name that is not one of the storable shapes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value type '{0}'")]
pub struct UnknownValueType(pub String);

impl FromStr for ValueType {
    type Err = UnknownValueType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.to_ascii_lowercase().as_str() {
            "none" => ValueType::None,
            "int" => ValueType::Int,
            "int2" => ValueType::Int2,
            "int3" => ValueType::Int3,
            "int4" => ValueType::Int4,
            "float" => ValueType::Float,
            "float2" => ValueType::Float2,
            "float3" => ValueType::Float3,
            "float4" => ValueType::Float4,
            "bool" => ValueType::Bool,
            "string" => ValueType::String,
            _ => return Err(UnknownValueType(s.to_string())),
        };
        Ok(ty)
    }
}

/// A value of any storable shape.
///
/// Used by host code that only learns the type at runtime.
#[derive(Debug, Clone, PartialEq, From, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Int(i32),
    Int2([i32; 2]),
    Int3([i32; 3]),
    Int4([i32; 4]),
    Float(f32),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    Bool(bool),
    String(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Int2(_) => ValueType::Int2,
            Value::Int3(_) => ValueType::Int3,
            Value::Int4(_) => ValueType::Int4,
            Value::Float(_) => ValueType::Float,
            Value::Float2(_) => ValueType::Float2,
            Value::Float3(_) => ValueType::Float3,
            Value::Float4(_) => ValueType::Float4,
            Value::Bool(_) => ValueType::Bool,
            Value::String(_) => ValueType::String,
        }
    }
}

fn write_components<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Int2(v) => write_components(f, v),
            Value::Int3(v) => write_components(f, v),
            Value::Int4(v) => write_components(f, v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Float2(v) => write_components(f, v),
            Value::Float3(v) => write_components(f, v),
            Value::Float4(v) => write_components(f, v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
        }
    }
}

/// A Rust type that the registry can store.
///
/// Implemented for exactly the ten supported shapes; the trait is sealed.
/// Each implementation picks the typed mapping its values live in.
pub trait StoredValue: typed::Sealed + Clone + Send + Sync + 'static {
    /// Tag recorded for names holding this type.
    const TYPE: ValueType;

    fn into_value(self) -> Value;
}
