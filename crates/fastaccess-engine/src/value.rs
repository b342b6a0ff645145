//! Boxed values crossing the dispatch boundary
//!
//! `Value` is the uniform reference type of the accessor contract. Primitive
//! slots are "unboxed" by converting to the canonical variant for the
//! declared kind: numeric kinds accept any numeric variant and narrow it,
//! the way a boxed number's scalar accessors do. `Bool` and `Char` only
//! accept themselves.

use std::fmt;
use std::sync::Arc;

use crate::error::{AccessError, AccessResult};
use crate::model::{ClassId, ObjectRef, ValueType};

/// A boxed value
#[derive(Clone, Default)]
pub enum Value {
    /// Null reference (also the result of a `void` call)
    #[default]
    Null,
    /// Boxed `bool`
    Bool(bool),
    /// Boxed 8-bit integer
    Byte(i8),
    /// Boxed character
    Char(char),
    /// Boxed 16-bit integer
    Short(i16),
    /// Boxed 32-bit integer
    Int(i32),
    /// Boxed 64-bit integer
    Long(i64),
    /// Boxed 32-bit float
    Float(f32),
    /// Boxed 64-bit float
    Double(f64),
    /// String reference
    Str(Arc<str>),
    /// Instance reference
    Object(ObjectRef),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Instance reference, if this is one
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Class of a reference value (`None` for null and boxed primitives)
    pub fn class_of(&self) -> Option<ClassId> {
        match self {
            Value::Str(_) => Some(ClassId::STRING),
            Value::Object(o) => Some(o.class_id()),
            _ => None,
        }
    }

    /// Short description used in cast errors
    pub fn type_label(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Byte(_) => "byte".to_string(),
            Value::Char(_) => "char".to_string(),
            Value::Short(_) => "short".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Long(_) => "long".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Double(_) => "double".to_string(),
            Value::Str(_) => ClassId::STRING.to_string(),
            Value::Object(o) => o.class_id().to_string(),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(v as i64),
            Value::Short(v) => Some(v as i64),
            Value::Int(v) => Some(v as i64),
            Value::Long(v) => Some(v),
            Value::Float(v) => Some(v as i64),
            Value::Double(v) => Some(v as i64),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v as f64),
            Value::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    fn mismatch(&self, expected: ValueType) -> AccessError {
        if self.is_null() {
            AccessError::NullValue(expected)
        } else {
            AccessError::ClassCast {
                found: self.type_label(),
                expected: expected.to_string(),
            }
        }
    }

    /// `boolean` scalar accessor
    pub fn bool_value(&self) -> AccessResult<bool> {
        match *self {
            Value::Bool(b) => Ok(b),
            _ => Err(self.mismatch(ValueType::Boolean)),
        }
    }

    /// `char` scalar accessor
    pub fn char_value(&self) -> AccessResult<char> {
        match *self {
            Value::Char(c) => Ok(c),
            _ => Err(self.mismatch(ValueType::Char)),
        }
    }

    /// `byte` scalar accessor (narrows any number)
    pub fn byte_value(&self) -> AccessResult<i8> {
        self.as_i64().map(|v| v as i8).ok_or_else(|| self.mismatch(ValueType::Byte))
    }

    /// `short` scalar accessor (narrows any number)
    pub fn short_value(&self) -> AccessResult<i16> {
        self.as_i64().map(|v| v as i16).ok_or_else(|| self.mismatch(ValueType::Short))
    }

    /// `int` scalar accessor (narrows any number)
    pub fn int_value(&self) -> AccessResult<i32> {
        self.as_i64().map(|v| v as i32).ok_or_else(|| self.mismatch(ValueType::Int))
    }

    /// `long` scalar accessor (narrows any number)
    pub fn long_value(&self) -> AccessResult<i64> {
        self.as_i64().ok_or_else(|| self.mismatch(ValueType::Long))
    }

    /// `float` scalar accessor (any number)
    pub fn float_value(&self) -> AccessResult<f32> {
        self.as_f64().map(|v| v as f32).ok_or_else(|| self.mismatch(ValueType::Float))
    }

    /// `double` scalar accessor (any number)
    pub fn double_value(&self) -> AccessResult<f64> {
        self.as_f64().ok_or_else(|| self.mismatch(ValueType::Double))
    }

    /// Check that a member result is already the canonical variant of
    /// `kind`. Unlike [`unbox`](Self::unbox) nothing is converted.
    pub fn boxed(self, kind: ValueType) -> AccessResult<Value> {
        let canonical = matches!(
            (&self, kind),
            (Value::Bool(_), ValueType::Boolean)
                | (Value::Byte(_), ValueType::Byte)
                | (Value::Char(_), ValueType::Char)
                | (Value::Short(_), ValueType::Short)
                | (Value::Int(_), ValueType::Int)
                | (Value::Long(_), ValueType::Long)
                | (Value::Float(_), ValueType::Float)
                | (Value::Double(_), ValueType::Double)
                | (_, ValueType::Void | ValueType::Reference(_))
        );
        if canonical {
            Ok(self)
        } else {
            Err(self.mismatch(kind))
        }
    }

    /// Convert to the canonical variant of a primitive kind.
    ///
    /// Reference and `void` kinds return the value unchanged; casts to
    /// reference types need the type model and happen in the interpreter.
    pub fn unbox(&self, kind: ValueType) -> AccessResult<Value> {
        let value = match kind {
            ValueType::Boolean => Value::Bool(self.bool_value()?),
            ValueType::Byte => Value::Byte(self.byte_value()?),
            ValueType::Char => Value::Char(self.char_value()?),
            ValueType::Short => Value::Short(self.short_value()?),
            ValueType::Int => Value::Int(self.int_value()?),
            ValueType::Long => Value::Long(self.long_value()?),
            ValueType::Float => Value::Float(self.float_value()?),
            ValueType::Double => Value::Double(self.double_value()?),
            ValueType::Void | ValueType::Reference(_) => self.clone(),
        };
        Ok(value)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}b", v),
            Value::Char(v) => write!(f, "{:?}", v),
            Value::Short(v) => write!(f, "{}s", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::Float(v) => write!(f, "{}f", v),
            Value::Double(v) => write!(f, "{}d", v),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(o) => write!(f, "{:?}", o),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Byte,
    char => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    ObjectRef => Object,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}
