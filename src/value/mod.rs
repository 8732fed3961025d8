use crate::types::generics::{ConcreteType, Primitive};
use ordered_float::OrderedFloat;
use std::{
    fmt::{Debug, Display, Formatter},
    sync::Arc,
};

pub mod object;

pub use object::{Instance, ObjectRef};

/// A constructor argument. Equality and hashing are structural, except for
/// [`Value::Instance`], which compares by identity.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Char(char),
    String(Arc<str>),
    Instance(ObjectRef),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    pub fn float(f: f64) -> Self {
        Value::Float(OrderedFloat(f))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::String(_) => "String",
            Value::Instance(_) => "instance",
        }
    }

    /// Whether this value may be passed where `t` is declared.
    pub fn conforms_to(&self, t: &ConcreteType) -> bool {
        use Primitive::*;
        match (self, t) {
            (_, ConcreteType::Void) => false,
            (Value::Null, t) => t.is_reference(),
            (_, ConcreteType::Object) => true,
            (Value::Boolean(_), ConcreteType::Primitive(Boolean)) => true,
            (Value::Int(i), ConcreteType::Primitive(p)) => match p {
                Byte => i8::try_from(*i).is_ok(),
                Short => i16::try_from(*i).is_ok(),
                Int => i32::try_from(*i).is_ok(),
                Long | Float | Double => true,
                _ => false,
            },
            (Value::Float(_), ConcreteType::Primitive(Float | Double)) => true,
            (Value::Char(_), ConcreteType::Primitive(Char | Int | Long | Float | Double)) => true,
            (Value::String(_), ConcreteType::String) => true,
            (Value::Instance(obj), ConcreteType::Type(td)) => obj.target().is_a(td),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::float(f)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Arc<Instance>> for Value {
    fn from(instance: Arc<Instance>) -> Self {
        Value::Instance(ObjectRef(instance))
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Instance(obj) => write!(f, "{:?}", obj),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        assert_eq!(Value::string("a"), Value::from(String::from("a")));
        assert_eq!(Value::float(0.5), Value::from(0.5));
        assert_ne!(Value::from(1), Value::from(2));
        assert_ne!(Value::from(1), Value::from(1.0));

        let set: HashSet<_> = [Value::from("x"), Value::from("x"), Value::Null]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_conformance() {
        use Primitive::*;
        assert!(Value::from(300).conforms_to(&ConcreteType::Primitive(Int)));
        assert!(!Value::from(300).conforms_to(&ConcreteType::Primitive(Byte)));
        assert!(Value::from(1.5).conforms_to(&ConcreteType::Primitive(Double)));
        assert!(Value::from("s").conforms_to(&ConcreteType::String));
        assert!(Value::from("s").conforms_to(&ConcreteType::Object));
        assert!(Value::Null.conforms_to(&ConcreteType::String));
        assert!(!Value::Null.conforms_to(&ConcreteType::Primitive(Int)));
        assert!(!Value::from(true).conforms_to(&ConcreteType::Primitive(Int)));
        assert!(!Value::from('c').conforms_to(&ConcreteType::Void));

        // widening primitive conversions
        assert!(Value::from(7).conforms_to(&ConcreteType::Primitive(Float)));
        assert!(Value::from(7).conforms_to(&ConcreteType::Primitive(Double)));
        assert!(Value::from('c').conforms_to(&ConcreteType::Primitive(Int)));
        assert!(Value::from('c').conforms_to(&ConcreteType::Primitive(Long)));
        assert!(Value::from('c').conforms_to(&ConcreteType::Primitive(Double)));
        assert!(!Value::from('c').conforms_to(&ConcreteType::Primitive(Short)));
        assert!(!Value::from(1.5).conforms_to(&ConcreteType::Primitive(Long)));
        assert!(!Value::from(7).conforms_to(&ConcreteType::Primitive(Char)));
    }
}
