use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::member::Function;
pub use crate::symbol::SymbolId;

/// Unique identifier for a type descriptor
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(pub u32);

/// Unique identifier for an interface descriptor
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct InterfaceId(pub u32);

/// Unique identifier for an instance
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct InstanceId(pub u32);

/// Unique identifier for a meta-type
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MetaTypeId(pub u32);

/// A runtime value: member values, call arguments and results.
#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    BigInt(BigInt), // Arbitrary precision integer
    Float(f64),
    String(String),
    Function(Function),
    Type(TypeId),
    Interface(InterfaceId),
    Instance(InstanceId),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::BigInt(b) => b.to_i64(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::BigInt(b) => b.to_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<InstanceId> {
        match self {
            Value::Instance(id) => Some(*id),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Integer(_) | Value::BigInt(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Type(_) => "type",
            Value::Interface(_) => "interface",
            Value::Instance(_) => "instance",
        }
    }
}

// Numeric equality crosses representations: 1 == BigInt(1) == 1.0
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Integer(a), Value::BigInt(b)) | (Value::BigInt(b), Value::Integer(a)) => {
                BigInt::from(*a) == *b
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::BigInt(a), Value::Float(b)) | (Value::Float(b), Value::BigInt(a)) => {
                a.to_f64().unwrap_or(f64::INFINITY) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Interface(a), Value::Interface(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::BigInt(a), Value::BigInt(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::BigInt(b)) => BigInt::from(*a).partial_cmp(b),
            (Value::BigInt(a), Value::Integer(b)) => a.partial_cmp(&BigInt::from(*b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::BigInt(a), Value::Float(b)) => {
                a.to_f64().unwrap_or(f64::INFINITY).partial_cmp(b)
            }
            (Value::Float(a), Value::BigInt(b)) => {
                a.partial_cmp(&b.to_f64().unwrap_or(f64::INFINITY))
            }
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<BigInt> for Value {
    /// Small magnitudes collapse back to `Integer`.
    fn from(v: BigInt) -> Self {
        match v.to_i64() {
            Some(i) => Value::Integer(i),
            None => Value::BigInt(v),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Function> for Value {
    fn from(v: Function) -> Self {
        Value::Function(v)
    }
}

impl From<TypeId> for Value {
    fn from(v: TypeId) -> Self {
        Value::Type(v)
    }
}

impl From<InterfaceId> for Value {
    fn from(v: InterfaceId) -> Self {
        Value::Interface(v)
    }
}

impl From<InstanceId> for Value {
    fn from(v: InstanceId) -> Self {
        Value::Instance(v)
    }
}

/// Context-free rendering. Descriptor names need the runtime, see `printer`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::BigInt(b) => write!(f, "{}", b),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Function(func) => match func.context() {
                Some(ctx) => write!(f, "#<method {} of type {}>", ctx.name.0, ctx.owner.0),
                None => write!(f, "#<function>"),
            },
            Value::Type(id) => write!(f, "#<type {}>", id.0),
            Value::Interface(id) => write!(f, "#<interface {}>", id.0),
            Value::Instance(id) => write!(f, "#<instance {}>", id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_equality_crosses_representations() {
        assert_eq!(Value::Integer(3), Value::BigInt(BigInt::from(3)));
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_ne!(Value::Integer(2), Value::String("2".into()));
    }

    #[test]
    fn bigint_conversion_collapses_small_values() {
        let small = Value::from(BigInt::from(7));
        assert!(matches!(small, Value::Integer(7)));
        let huge = BigInt::from(i64::MAX) * 4;
        assert!(matches!(Value::from(huge), Value::BigInt(_)));
    }

    #[test]
    fn ordering_mixes_numeric_kinds() {
        assert!(Value::Integer(1) < Value::Float(1.5));
        assert!(Value::BigInt(BigInt::from(i64::MAX) * 2) > Value::Integer(i64::MAX));
        assert_eq!(Value::Nil.partial_cmp(&Value::Integer(0)), None);
    }
}
