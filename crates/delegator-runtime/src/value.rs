//! Runtime values
//!
//! Scalars are stored inline; objects and classes are shared handles that
//! compare by identity, never by content.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::{ReflectError, ReflectResult};
use crate::object::{ClassRef, ObjectRef};

/// A dynamically typed runtime value
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Ordered list of values
    List(Vec<Value>),
    /// Object handle
    Object(ObjectRef),
    /// Class handle (used where a caller is a type rather than an instance)
    Class(ClassRef),
}

impl Value {
    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's type, used in diagnostics
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Object(obj) => obj.class().name().to_string(),
            Value::Class(class) => format!("class {}", class.name()),
        }
    }

    /// Integer payload, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// String payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Object payload, if any
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Object payload or a type error
    pub fn expect_object(&self) -> ReflectResult<&ObjectRef> {
        self.as_object()
            .ok_or_else(|| ReflectError::TypeError(format!("expected object, got {}", self.type_name())))
    }

    /// Integer payload or a type error
    pub fn expect_int(&self) -> ReflectResult<i64> {
        self.as_int()
            .ok_or_else(|| ReflectError::TypeError(format!("expected int, got {}", self.type_name())))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Object(obj) => write!(f, "{}#{}", obj.class().name(), obj.id()),
            Value::Class(class) => write!(f, "class {}", class.name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                serializer.serialize_str(&format!("{}#{}", obj.class().name(), obj.id()))
            }
            Value::Class(class) => serializer.serialize_str(class.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<ClassRef> for Value {
    fn from(class: ClassRef) -> Self {
        Value::Class(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ClassBuilder, Object};

    #[test]
    fn test_scalar_equality() {
        assert_eq!(Value::from(7), Value::Int(7));
        assert_ne!(Value::Int(7), Value::Float(7.0));
        assert_eq!(Value::from("abc"), Value::Str("abc".into()));
        assert!(Value::default().is_null());
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let class = ClassBuilder::new("Point").build();
        let a = Object::instantiate(&class);
        let b = Object::instantiate(&class);

        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn test_serialize_for_log_payloads() {
        let class = ClassBuilder::new("Point").build();
        let obj = Object::instantiate(&class);
        let payload = serde_json::to_value(Value::List(vec![
            Value::Int(1),
            Value::Str("x".into()),
            Value::Null,
            Value::Object(obj.clone()),
        ]))
        .unwrap();

        assert_eq!(
            payload,
            serde_json::json!([1, "x", null, format!("Point#{}", obj.id())])
        );
    }
}
