//! Collaborator traits: the type model and the scope resolver

use std::fmt;
use std::sync::Arc;

use crate::error::MemberError;
use crate::value::Value;

use super::descriptor::{ConstructorDescriptor, FieldDescriptor, MethodDescriptor, TypeDescription};
use super::object::ObjectRef;
use super::types::{ClassId, ScopeId};

/// Executable constructor: already-unboxed arguments in, new instance out
pub type ConstructorFn = Arc<dyn Fn(&[Value]) -> Result<ObjectRef, MemberError> + Send + Sync>;

/// Executable method: receiver (`Value::Null` for static methods) and arguments
pub type MethodFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, MemberError> + Send + Sync>;

type FieldGetFn = dyn Fn(&Value) -> Result<Value, MemberError> + Send + Sync;
type FieldSetFn = dyn Fn(&Value, Value) -> Result<(), MemberError> + Send + Sync;

/// Read/write pair for one field
#[derive(Clone)]
pub struct FieldHandle {
    get: Arc<FieldGetFn>,
    set: Arc<FieldSetFn>,
}

impl FieldHandle {
    /// Create a handle from a getter and a setter
    pub fn new<G, S>(get: G, set: S) -> Self
    where
        G: Fn(&Value) -> Result<Value, MemberError> + Send + Sync + 'static,
        S: Fn(&Value, Value) -> Result<(), MemberError> + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Read the field (receiver is `Value::Null` for static fields)
    pub fn get(&self, target: &Value) -> Result<Value, MemberError> {
        (self.get)(target)
    }

    /// Write the field (receiver is `Value::Null` for static fields)
    pub fn set(&self, target: &Value, value: Value) -> Result<(), MemberError> {
        (self.set)(target, value)
    }
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldHandle")
    }
}

/// Structural description and linkage of target types.
///
/// List order must be stable for a given class: ordinals index into it.
pub trait TypeModel: Send + Sync {
    /// Fully qualified name, `None` if the class is unknown
    fn type_name(&self, class: ClassId) -> Option<String>;

    /// Declared constructors in ordinal order
    fn list_constructors(&self, class: ClassId) -> Vec<ConstructorDescriptor>;

    /// Declared methods in ordinal order
    fn list_methods(&self, class: ClassId) -> Vec<MethodDescriptor>;

    /// Declared fields in ordinal order
    fn list_fields(&self, class: ClassId) -> Vec<FieldDescriptor>;

    /// Executable body of the constructor at `ordinal`
    fn constructor_handle(&self, class: ClassId, ordinal: usize) -> Option<ConstructorFn>;

    /// Executable body of the method at `ordinal` (`None` when abstract)
    fn method_handle(&self, class: ClassId, ordinal: usize) -> Option<MethodFn>;

    /// Accessors of the field at `ordinal`
    fn field_handle(&self, class: ClassId, ordinal: usize) -> Option<FieldHandle>;

    /// Most specific implementation of `method` visible from `runtime_class`
    fn resolve_override(&self, runtime_class: ClassId, method: &MethodDescriptor) -> Option<MethodFn>;

    /// Whether an instance of `from` may be used where `to` is declared
    fn is_assignable(&self, from: ClassId, to: ClassId) -> bool;

    /// Snapshot of all three member lists
    fn describe(&self, class: ClassId) -> Option<TypeDescription> {
        let name = self.type_name(class)?;
        Some(TypeDescription {
            class,
            name,
            constructors: self.list_constructors(class),
            methods: self.list_methods(class),
            fields: self.list_fields(class),
        })
    }
}

/// Maps a class to the isolation domain that must host its dispatcher
pub trait ScopeResolver: Send + Sync {
    /// Defining scope of `class`
    fn scope_of(&self, class: ClassId) -> ScopeId;
}

impl<F> ScopeResolver for F
where
    F: Fn(ClassId) -> ScopeId + Send + Sync,
{
    fn scope_of(&self, class: ClassId) -> ScopeId {
        self(class)
    }
}
