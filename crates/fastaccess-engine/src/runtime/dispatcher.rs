//! Instantiated dispatchers

use std::fmt;
use std::sync::Arc;

use crate::accessor::Accessor;
use crate::codegen::EntryPoint;
use crate::error::{AccessError, AccessResult, GenerationError};
use crate::loader::LoadedUnit;
use crate::model::{ClassId, ObjectRef, TypeModel};
use crate::value::Value;

use super::interpreter::{Frame, Interpreter};
use super::linker::{link, Linkage};

static NULL: Value = Value::Null;

/// Accessor backed by an installed unit and its linkage
pub struct GeneratedDispatcher {
    unit: Arc<LoadedUnit>,
    linkage: Arc<Linkage>,
    model: Arc<dyn TypeModel>,
}

impl GeneratedDispatcher {
    /// Link `unit` against `model` (first call per unit and model only) and
    /// wrap it
    pub fn instantiate(unit: Arc<LoadedUnit>, model: Arc<dyn TypeModel>) -> Result<Self, GenerationError> {
        let linkage = unit.linkage_for(&model, || {
            let linkage = link(model.as_ref(), unit.image())?;
            tracing::debug!(
                unit = unit.name(),
                members = linkage.member_count(),
                "linked accessor unit"
            );
            Ok(linkage)
        })?;
        Ok(Self { unit, linkage, model })
    }

    /// Installed unit this dispatcher executes
    pub fn unit(&self) -> &Arc<LoadedUnit> {
        &self.unit
    }

    fn run(&self, entry: EntryPoint, frame: Frame<'_>) -> AccessResult<Value> {
        Interpreter::new(self.unit.image(), &self.linkage, self.model.as_ref()).run(entry, frame)
    }

    fn construct(&self, entry: EntryPoint, frame: Frame<'_>) -> AccessResult<ObjectRef> {
        match self.run(entry, frame)? {
            Value::Object(object) => Ok(object),
            other => Err(AccessError::CorruptCode(format!(
                "constructor produced {}",
                other.type_label()
            ))),
        }
    }
}

impl Accessor for GeneratedDispatcher {
    fn new_instance(&self) -> AccessResult<ObjectRef> {
        let frame = Frame {
            receiver: &NULL,
            selector: 0,
            args: None,
            value: None,
        };
        self.construct(EntryPoint::NewDefault, frame)
    }

    fn new_instance_with(&self, selector: i32, args: Option<&[Value]>) -> AccessResult<ObjectRef> {
        let frame = Frame {
            receiver: &NULL,
            selector,
            args,
            value: None,
        };
        self.construct(EntryPoint::NewInstance, frame)
    }

    fn invoke(&self, target: &Value, selector: i32, args: Option<&[Value]>) -> AccessResult<Value> {
        let frame = Frame {
            receiver: target,
            selector,
            args,
            value: None,
        };
        self.run(EntryPoint::Invoke, frame)
    }

    fn get_field(&self, target: &Value, selector: i32) -> AccessResult<Value> {
        let frame = Frame {
            receiver: target,
            selector,
            args: None,
            value: None,
        };
        self.run(EntryPoint::GetField, frame)
    }

    fn set_field(&self, target: &Value, selector: i32, value: Value) -> AccessResult<()> {
        let frame = Frame {
            receiver: target,
            selector,
            args: None,
            value: Some(&value),
        };
        self.run(EntryPoint::SetField, frame).map(|_| ())
    }

    fn target_class(&self) -> ClassId {
        self.unit.image().target
    }
}

impl fmt::Debug for GeneratedDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedDispatcher")
            .field("unit", &self.unit.name())
            .field("linkage", &self.linkage)
            .finish()
    }
}
