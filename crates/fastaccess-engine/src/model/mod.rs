//! Type model interfaces
//!
//! The engine does not own a type system. Everything it knows about a target
//! type arrives through the [`TypeModel`] and [`ScopeResolver`] traits:
//!
//! - ordered member descriptors (the ordinals a dispatcher switches on)
//! - executable member handles the installed code links against
//! - override resolution and assignability for virtual calls and casts

mod descriptor;
mod object;
mod provider;
mod types;

pub use descriptor::{
    ConstructorDescriptor, FieldDescriptor, InvokeKind, MethodDescriptor, Modifiers,
    TypeDescription, Visibility,
};
pub use object::{downcast_object, Object, ObjectRef};
pub use provider::{ConstructorFn, FieldHandle, MethodFn, ScopeResolver, TypeModel};
pub use types::{ClassId, ScopeId, ValueType};
