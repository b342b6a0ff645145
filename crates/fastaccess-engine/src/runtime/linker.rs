//! Binding symbolic member references to executable handles

use std::fmt;

use crate::codegen::{Constant, DispatcherImage};
use crate::error::GenerationError;
use crate::model::{
    ConstructorFn, FieldHandle, InvokeKind, MethodDescriptor, MethodFn, TypeModel, ValueType,
};

/// Linked constructor
pub(crate) struct LinkedConstructor {
    pub(crate) arity: usize,
    pub(crate) handle: ConstructorFn,
}

/// Linked method. `handle` is absent for abstract methods, which can only
/// be reached through an override on the receiver's class.
pub(crate) struct LinkedMethod {
    pub(crate) descriptor: MethodDescriptor,
    pub(crate) handle: Option<MethodFn>,
}

enum LinkedMember {
    Unlinked,
    Constructor(LinkedConstructor),
    Method(LinkedMethod),
    Field(FieldHandle),
}

/// Resolved member handles, parallel to an image's constant pool
pub struct Linkage {
    members: Vec<LinkedMember>,
}

impl Linkage {
    /// Number of member references that were resolved
    pub fn member_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| !matches!(m, LinkedMember::Unlinked))
            .count()
    }

    pub(crate) fn constructor(&self, index: u16) -> Option<&LinkedConstructor> {
        match self.members.get(index as usize)? {
            LinkedMember::Constructor(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn method(&self, index: u16) -> Option<&LinkedMethod> {
        match self.members.get(index as usize)? {
            LinkedMember::Method(m) => Some(m),
            _ => None,
        }
    }

    pub(crate) fn field(&self, index: u16) -> Option<&FieldHandle> {
        match self.members.get(index as usize)? {
            LinkedMember::Field(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Debug for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linkage")
            .field("constants", &self.members.len())
            .field("members", &self.member_count())
            .finish()
    }
}

/// Resolve every member reference in `image` against `model`.
///
/// Each reference must still match the descriptor the model reports at the
/// same ordinal. Static and direct calls, constructors and fields need a
/// handle; virtual and interface methods may be abstract.
pub(crate) fn link(model: &dyn TypeModel, image: &DispatcherImage) -> Result<Linkage, GenerationError> {
    let class = image.target;
    let fail = |reason: String| GenerationError::Instantiation {
        type_name: image.type_name.clone(),
        reason,
    };

    let constructors = model.list_constructors(class);
    let methods = model.list_methods(class);
    let fields = model.list_fields(class);

    let mut members = Vec::with_capacity(image.constants.len());
    for constant in &image.constants {
        let member = match constant {
            Constant::Constructor { ordinal, parameters } => {
                let ordinal = *ordinal as usize;
                let desc = constructors
                    .get(ordinal)
                    .ok_or_else(|| fail(format!("constructor {} no longer exists", ordinal)))?;
                if desc.parameters != *parameters {
                    return Err(fail(format!(
                        "constructor {} signature changed: ({}) became ({})",
                        ordinal,
                        render(parameters),
                        render(&desc.parameters)
                    )));
                }
                let handle = model
                    .constructor_handle(class, ordinal)
                    .ok_or_else(|| fail(format!("missing handle for constructor {}", ordinal)))?;
                LinkedMember::Constructor(LinkedConstructor {
                    arity: parameters.len(),
                    handle,
                })
            }
            Constant::Method {
                ordinal,
                name,
                parameters,
                return_type,
                kind,
            } => {
                let ordinal = *ordinal as usize;
                let desc = methods
                    .get(ordinal)
                    .ok_or_else(|| fail(format!("method {} no longer exists", ordinal)))?;
                if desc.name != *name
                    || desc.parameters != *parameters
                    || desc.return_type != *return_type
                    || desc.invoke_kind() != *kind
                {
                    return Err(fail(format!(
                        "method {} signature changed: {}({}) became {}({})",
                        ordinal,
                        name,
                        render(parameters),
                        desc.name,
                        render(&desc.parameters)
                    )));
                }
                let handle = model.method_handle(class, ordinal);
                if handle.is_none() && matches!(kind, InvokeKind::Static | InvokeKind::Special) {
                    return Err(fail(format!("missing handle for method {} ({})", ordinal, name)));
                }
                LinkedMember::Method(LinkedMethod {
                    descriptor: desc.clone(),
                    handle,
                })
            }
            Constant::Field {
                ordinal,
                name,
                value_type,
                is_static,
            } => {
                let ordinal = *ordinal as usize;
                let desc = fields
                    .get(ordinal)
                    .ok_or_else(|| fail(format!("field {} no longer exists", ordinal)))?;
                if desc.name != *name || desc.value_type != *value_type || desc.is_static() != *is_static {
                    return Err(fail(format!("field {} ({}) signature changed", ordinal, name)));
                }
                let handle = model
                    .field_handle(class, ordinal)
                    .ok_or_else(|| fail(format!("missing handle for field {} ({})", ordinal, name)))?;
                LinkedMember::Field(handle)
            }
            Constant::Message(_) | Constant::ArityTable(_) | Constant::Class(_) => LinkedMember::Unlinked,
        };
        members.push(member);
    }

    Ok(Linkage { members })
}

fn render(types: &[ValueType]) -> String {
    types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}
