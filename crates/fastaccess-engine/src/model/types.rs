//! Class, scope and slot type identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a class in the type model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub u32);

impl ClassId {
    /// The universal object type. Casts to it are never emitted.
    pub const OBJECT: ClassId = ClassId(0);
    /// The class of string values
    pub const STRING: ClassId = ClassId(1);

    /// Raw numeric id
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ClassId::OBJECT => write!(f, "object"),
            ClassId::STRING => write!(f, "string"),
            ClassId(id) => write!(f, "class#{}", id),
        }
    }
}

/// Identity of an isolation domain (loader scope)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The scope the engine itself is defined in
    pub const SYSTEM: ScopeId = ScopeId(0);
}

/// Declared type of a parameter, return value or field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// No value (method returns only)
    Void,
    /// `bool`
    Boolean,
    /// 8-bit signed integer
    Byte,
    /// Unicode scalar value
    Char,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// Reference to an instance of the given class
    Reference(ClassId),
}

impl ValueType {
    /// Universal object reference
    pub const OBJECT: ValueType = ValueType::Reference(ClassId::OBJECT);
    /// String reference
    pub const STRING: ValueType = ValueType::Reference(ClassId::STRING);

    /// Encoding used by the `BOX` / `UNBOX` operands
    pub fn primitive_code(self) -> Option<u8> {
        let code = match self {
            ValueType::Boolean => 1,
            ValueType::Byte => 2,
            ValueType::Char => 3,
            ValueType::Short => 4,
            ValueType::Int => 5,
            ValueType::Long => 6,
            ValueType::Float => 7,
            ValueType::Double => 8,
            ValueType::Void | ValueType::Reference(_) => return None,
        };
        Some(code)
    }

    /// Inverse of [`ValueType::primitive_code`]
    pub fn from_primitive_code(code: u8) -> Option<ValueType> {
        let ty = match code {
            1 => ValueType::Boolean,
            2 => ValueType::Byte,
            3 => ValueType::Char,
            4 => ValueType::Short,
            5 => ValueType::Int,
            6 => ValueType::Long,
            7 => ValueType::Float,
            8 => ValueType::Double,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Void => write!(f, "void"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Byte => write!(f, "byte"),
            ValueType::Char => write!(f, "char"),
            ValueType::Short => write!(f, "short"),
            ValueType::Int => write!(f, "int"),
            ValueType::Long => write!(f, "long"),
            ValueType::Float => write!(f, "float"),
            ValueType::Double => write!(f, "double"),
            ValueType::Reference(class) => write!(f, "{}", class),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_codes_round_trip() {
        for ty in [
            ValueType::Boolean,
            ValueType::Byte,
            ValueType::Char,
            ValueType::Short,
            ValueType::Int,
            ValueType::Long,
            ValueType::Float,
            ValueType::Double,
        ] {
            let code = ty.primitive_code().unwrap();
            assert_eq!(ValueType::from_primitive_code(code), Some(ty));
        }
        assert_eq!(ValueType::Void.primitive_code(), None);
        assert_eq!(ValueType::OBJECT.primitive_code(), None);
        assert_eq!(ValueType::from_primitive_code(0), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ValueType::Int.to_string(), "int");
        assert_eq!(ValueType::OBJECT.to_string(), "object");
        assert_eq!(ValueType::Reference(ClassId(7)).to_string(), "class#7");
    }

    #[test]
    fn test_reference_json_shape() {
        let json = serde_json::to_string(&ValueType::Reference(ClassId(4))).unwrap();
        assert_eq!(json, r#"{"reference":4}"#);
        let parsed: ValueType = serde_json::from_str(r#""int""#).unwrap();
        assert_eq!(parsed, ValueType::Int);
    }
}
