//! Member descriptors supplied by the type model
//!
//! A member's ordinal is its position in the list the type model returns.
//! Descriptors carry signatures only; executable handles are requested
//! separately when an installed unit is linked.

use serde::{Deserialize, Serialize};

use super::types::{ClassId, ValueType};

/// Member visibility class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to subclasses
    Protected,
    /// Visible to the declaring type only
    Private,
}

/// Modifier flags for class members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Visibility class
    pub visibility: Visibility,
    /// Static member
    pub is_static: bool,
    /// Final member (cannot be overridden or reassigned)
    pub is_final: bool,
    /// Abstract member (no body on the declaring type)
    pub is_abstract: bool,
}

impl Modifiers {
    /// Public, instance, non-final
    pub fn public() -> Self {
        Self::default()
    }

    /// Private instance member
    pub fn private() -> Self {
        Self {
            visibility: Visibility::Private,
            ..Self::default()
        }
    }

    /// Protected instance member
    pub fn protected() -> Self {
        Self {
            visibility: Visibility::Protected,
            ..Self::default()
        }
    }

    /// Mark as static
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as final
    pub fn with_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Mark as abstract
    pub fn with_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Whether the member is private
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

/// How a generated branch calls a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvokeKind {
    /// No receiver
    Static,
    /// Direct binding to the declared method, no override resolution
    Special,
    /// Override resolution through the receiver's runtime class
    Virtual,
    /// Resolution through the interface's implementors
    Interface,
}

impl InvokeKind {
    /// Mnemonic used by the disassembler
    pub fn mnemonic(self) -> &'static str {
        match self {
            InvokeKind::Static => "invoke_static",
            InvokeKind::Special => "invoke_special",
            InvokeKind::Virtual => "invoke_virtual",
            InvokeKind::Interface => "invoke_interface",
        }
    }
}

/// A declared constructor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConstructorDescriptor {
    /// Parameter types in declaration order
    #[serde(default)]
    pub parameters: Vec<ValueType>,
    /// Modifier flags
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl ConstructorDescriptor {
    /// Public constructor with the given parameters
    pub fn new(parameters: Vec<ValueType>) -> Self {
        Self {
            parameters,
            modifiers: Modifiers::public(),
        }
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// A declared method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// Parameter types in declaration order
    #[serde(default)]
    pub parameters: Vec<ValueType>,
    /// Return type (`Void` for none)
    pub return_type: ValueType,
    /// Class that declares the method
    pub declaring_class: ClassId,
    /// Whether the declaring class is an interface
    #[serde(default)]
    pub declaring_is_interface: bool,
    /// Modifier flags
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl MethodDescriptor {
    /// Public instance method
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<ValueType>,
        return_type: ValueType,
        declaring_class: ClassId,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type,
            declaring_class,
            declaring_is_interface: false,
            modifiers: Modifiers::public(),
        }
    }

    /// Replace the modifier flags
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Mark the declaring class as an interface
    pub fn on_interface(mut self) -> Self {
        self.declaring_is_interface = true;
        self
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Call strategy for this method.
    ///
    /// Interface ownership wins over everything else, then static, then
    /// private or final (non-overridable), and virtual otherwise.
    pub fn invoke_kind(&self) -> InvokeKind {
        if self.declaring_is_interface {
            InvokeKind::Interface
        } else if self.modifiers.is_static {
            InvokeKind::Static
        } else if self.modifiers.is_private() || self.modifiers.is_final {
            InvokeKind::Special
        } else {
            InvokeKind::Virtual
        }
    }

    /// Whether `other` is an override-compatible declaration of this method
    pub fn overrides_signature(&self, other: &MethodDescriptor) -> bool {
        self.name == other.name && self.parameters == other.parameters
    }
}

/// A declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Declared value type
    pub value_type: ValueType,
    /// Class that declares the field
    pub declaring_class: ClassId,
    /// Modifier flags
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl FieldDescriptor {
    /// Public instance field
    pub fn new(name: impl Into<String>, value_type: ValueType, declaring_class: ClassId) -> Self {
        Self {
            name: name.into(),
            value_type,
            declaring_class,
            modifiers: Modifiers::public(),
        }
    }

    /// Replace the modifier flags
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether the field is static
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }
}

/// One snapshot of a type's members, in the order ordinals index into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescription {
    /// Class being described
    pub class: ClassId,
    /// Fully qualified type name
    pub name: String,
    /// Declared constructors
    #[serde(default)]
    pub constructors: Vec<ConstructorDescriptor>,
    /// Declared methods
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    /// Declared fields
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescription {
    /// Description with no members
    pub fn new(class: ClassId, name: impl Into<String>) -> Self {
        Self {
            class,
            name: name.into(),
            constructors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Total number of members across all three families
    pub fn member_count(&self) -> usize {
        self.constructors.len() + self.methods.len() + self.fields.len()
    }

    /// Ordinal of the first zero-parameter constructor
    pub fn default_constructor(&self) -> Option<usize> {
        self.constructors.iter().position(|c| c.parameters.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(modifiers: Modifiers) -> MethodDescriptor {
        MethodDescriptor::new("run", vec![], ValueType::Void, ClassId(10)).with_modifiers(modifiers)
    }

    #[test]
    fn test_invoke_kind_selection() {
        assert_eq!(method(Modifiers::public()).invoke_kind(), InvokeKind::Virtual);
        assert_eq!(method(Modifiers::protected()).invoke_kind(), InvokeKind::Virtual);
        assert_eq!(method(Modifiers::public().with_static()).invoke_kind(), InvokeKind::Static);
        assert_eq!(method(Modifiers::private()).invoke_kind(), InvokeKind::Special);
        assert_eq!(method(Modifiers::public().with_final()).invoke_kind(), InvokeKind::Special);
        assert_eq!(
            method(Modifiers::public().with_abstract()).on_interface().invoke_kind(),
            InvokeKind::Interface
        );
    }

    #[test]
    fn test_static_private_is_static() {
        let m = method(Modifiers::private().with_static());
        assert_eq!(m.invoke_kind(), InvokeKind::Static);
    }

    #[test]
    fn test_default_constructor_lookup() {
        let mut desc = TypeDescription::new(ClassId(10), "demo.List");
        desc.constructors.push(ConstructorDescriptor::new(vec![ValueType::Int]));
        assert_eq!(desc.default_constructor(), None);

        desc.constructors.push(ConstructorDescriptor::new(vec![]));
        assert_eq!(desc.default_constructor(), Some(1));
        assert_eq!(desc.member_count(), 2);
    }

    #[test]
    fn test_description_from_json() {
        let json = r#"{
            "class": 12,
            "name": "demo.Point",
            "constructors": [{ "parameters": ["int", "int"] }],
            "methods": [{
                "name": "norm",
                "return_type": "double",
                "declaring_class": 12,
                "modifiers": { "is_final": true }
            }],
            "fields": [{ "name": "x", "value_type": "int", "declaring_class": 12 }]
        }"#;

        let desc: TypeDescription = serde_json::from_str(json).unwrap();
        assert_eq!(desc.class, ClassId(12));
        assert_eq!(desc.constructors[0].arity(), 2);
        assert_eq!(desc.methods[0].invoke_kind(), InvokeKind::Special);
        assert!(!desc.fields[0].is_static());
    }
}
