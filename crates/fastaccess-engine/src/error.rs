//! Error types for the call path and the generation path

use crate::model::{ClassId, ValueType};

/// Error raised by a member body, passed through the dispatcher unchanged
pub type MemberError = Box<dyn std::error::Error + Send + Sync>;

/// Shape violation: argument sequence missing
pub const MSG_ARGS_NULL: &str = "arguments must be not null";
/// Shape violation: argument count differs from the declared parameter count
pub const MSG_WRONG_ARG_COUNT: &str = "wrong number of arguments";
/// Bounds violation on the constructor table
pub const MSG_WRONG_CONSTRUCTOR_OFFSET: &str = "wrong offset of constructor";
/// Bounds violation on the method table
pub const MSG_WRONG_METHOD_OFFSET: &str = "wrong offset of method";
/// Bounds violation on the field table
pub const MSG_WRONG_FIELD_OFFSET: &str = "wrong offset of field";

/// Errors raised while calling through an accessor
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Bad selector, bad argument count or missing argument sequence
    #[error("{0}")]
    IllegalArgument(String),

    /// `new_instance()` on a type without a zero-parameter constructor
    #[error("{0} has no zero-argument constructor")]
    NoDefaultConstructor(String),

    /// Instance member reached with a null receiver
    #[error("null receiver for instance member")]
    NullReceiver,

    /// Null where a primitive was declared
    #[error("null cannot be unboxed to {0}")]
    NullValue(ValueType),

    /// Value not assignable to the declared type
    #[error("cannot cast {found} to {expected}")]
    ClassCast {
        /// Description of the value that was supplied
        found: String,
        /// Declared type
        expected: String,
    },

    /// Abstract or interface method with no implementation on the receiver
    #[error("no implementation of {method} for {receiver}")]
    AbstractMethod {
        /// Method name
        method: String,
        /// Runtime class of the receiver
        receiver: ClassId,
    },

    /// The member itself failed
    #[error("{0}")]
    Target(MemberError),

    /// Installed code did not decode; verification should have caught it
    #[error("corrupt dispatcher code: {0}")]
    CorruptCode(String),
}

impl AccessError {
    /// Shape or bounds violation with the given fixed message
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        AccessError::IllegalArgument(message.into())
    }

    /// Whether this is an `IllegalArgument` carrying `message`
    pub fn is_illegal_argument(&self, message: &str) -> bool {
        matches!(self, AccessError::IllegalArgument(m) if m == message)
    }
}

/// Result alias for accessor calls
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors raised while generating, installing or instantiating a dispatcher.
///
/// All of these indicate a defect in the builder, the installer or the type
/// model and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The type model does not know the class
    #[error("unknown type {0}")]
    UnknownType(ClassId),

    /// A unit with the same canonical name is already installed
    #[error("unit `{unit}` is already defined in loading context {context}")]
    DuplicateDefinition {
        /// Canonical unit name
        unit: String,
        /// Loading context id
        context: u32,
    },

    /// The image failed verification at install time
    #[error("malformed image for `{unit}`: {reason}")]
    MalformedImage {
        /// Canonical unit name
        unit: String,
        /// Verification failure
        reason: String,
    },

    /// The installed unit could not be linked or instantiated
    #[error("failed to instantiate accessor for `{type_name}`: {reason}")]
    Instantiation {
        /// Target type name
        type_name: String,
        /// Linkage failure
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_argument_display_is_message() {
        let err = AccessError::illegal_argument(MSG_WRONG_METHOD_OFFSET);
        assert_eq!(err.to_string(), "wrong offset of method");
        assert!(err.is_illegal_argument(MSG_WRONG_METHOD_OFFSET));
        assert!(!err.is_illegal_argument(MSG_WRONG_FIELD_OFFSET));
    }

    #[test]
    fn test_target_error_passes_message_through() {
        let inner: MemberError = "index 3 out of bounds".into();
        let err = AccessError::Target(inner);
        assert_eq!(err.to_string(), "index 3 out of bounds");
    }

    #[test]
    fn test_instantiation_names_type() {
        let err = GenerationError::Instantiation {
            type_name: "demo.List".to_string(),
            reason: "missing method handle 1".to_string(),
        };
        assert!(err.to_string().contains("demo.List"));
    }
}
