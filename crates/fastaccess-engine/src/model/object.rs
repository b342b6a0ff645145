//! Instances handed across the dispatch boundary

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::types::ClassId;

/// An instance of a type-model class.
///
/// Implementations own their state (with interior mutability where fields
/// are writable); the engine only needs the runtime class for casts and
/// override resolution.
pub trait Object: Any + Send + Sync + fmt::Debug {
    /// Runtime class of this instance
    fn class_id(&self) -> ClassId;

    /// Upcast for downcasting in member handles
    fn as_any(&self) -> &dyn Any;
}

/// Shared reference to an instance
pub type ObjectRef = Arc<dyn Object>;

/// Downcast an instance to its concrete Rust type
pub fn downcast_object<T: Object>(object: &ObjectRef) -> Option<&T> {
    object.as_any().downcast_ref::<T>()
}
