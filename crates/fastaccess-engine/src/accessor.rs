//! The operation set every generated dispatcher implements

use crate::error::AccessResult;
use crate::model::{ClassId, ObjectRef};
use crate::value::Value;

/// Ordinal-indexed access to one type's constructors, methods and fields.
///
/// Selectors are zero-based positions in the member lists the dispatcher was
/// generated from. They are only meaningful for that snapshot and must not be
/// persisted. `args == None` stands for an absent argument sequence and is
/// rejected before any other check.
pub trait Accessor: Send + Sync {
    /// Construct through the first zero-parameter constructor
    fn new_instance(&self) -> AccessResult<ObjectRef>;

    /// Construct through the constructor at `selector`
    fn new_instance_with(&self, selector: i32, args: Option<&[Value]>) -> AccessResult<ObjectRef>;

    /// Call the method at `selector`; `target` is ignored for static methods.
    /// `void` methods return [`Value::Null`].
    fn invoke(&self, target: &Value, selector: i32, args: Option<&[Value]>) -> AccessResult<Value>;

    /// Read the field at `selector`
    fn get_field(&self, target: &Value, selector: i32) -> AccessResult<Value>;

    /// Write the field at `selector`
    fn set_field(&self, target: &Value, selector: i32, value: Value) -> AccessResult<()>;

    /// Class this accessor serves
    fn target_class(&self) -> ClassId;
}
