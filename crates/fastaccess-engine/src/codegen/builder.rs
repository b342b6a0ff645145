//! Dispatcher code builder
//!
//! Pure transformation from a [`TypeDescription`] to a [`DispatcherImage`].
//! Each selector-taking entry point has the same shape:
//!
//! ```text
//! check_args   "arguments must be not null"      ; constructors and methods
//! check_bounds <count> "wrong offset of <family>"
//! check_arity  <table> "wrong number of arguments" ; constructors and methods
//! table_switch <count> default=L_err [L_0 .. L_n]  ; omitted when count == 0
//! L_i:   <one branch per ordinal>
//! L_err: throw_illegal "wrong offset of <family>"
//! ```

use crate::error::{
    GenerationError, MSG_ARGS_NULL, MSG_WRONG_ARG_COUNT, MSG_WRONG_CONSTRUCTOR_OFFSET,
    MSG_WRONG_FIELD_OFFSET, MSG_WRONG_METHOD_OFFSET,
};
use crate::model::{ClassId, InvokeKind, TypeDescription, ValueType};

use super::emitter::CodeEmitter;
use super::image::{Constant, DispatcherImage, EntryPoint};
use super::opcode;

type BranchFn<'a> = fn(&mut DispatcherBuilder<'a>, usize) -> Result<(), GenerationError>;

/// Build the dispatcher image for one type snapshot.
///
/// Only fails when the description cannot be encoded (more than `u16::MAX`
/// parameters or constants), which is a contract violation by the type model.
pub fn build_dispatcher(desc: &TypeDescription) -> Result<DispatcherImage, GenerationError> {
    let mut builder = DispatcherBuilder::new(desc);

    let mut entry_points = [0u32; EntryPoint::COUNT];
    entry_points[EntryPoint::NewDefault as usize] = builder.emit_new_default();
    entry_points[EntryPoint::NewInstance as usize] = builder.emit_selector_dispatch(
        desc.constructors.len(),
        MSG_WRONG_CONSTRUCTOR_OFFSET,
        Some(arity_table(desc, desc.constructors.iter().map(|c| c.arity()))?),
        DispatcherBuilder::emit_constructor_branch,
    )?;
    entry_points[EntryPoint::Invoke as usize] = builder.emit_selector_dispatch(
        desc.methods.len(),
        MSG_WRONG_METHOD_OFFSET,
        Some(arity_table(desc, desc.methods.iter().map(|m| m.arity()))?),
        DispatcherBuilder::emit_method_branch,
    )?;
    entry_points[EntryPoint::GetField as usize] = builder.emit_selector_dispatch(
        desc.fields.len(),
        MSG_WRONG_FIELD_OFFSET,
        None,
        DispatcherBuilder::emit_get_field_branch,
    )?;
    entry_points[EntryPoint::SetField as usize] = builder.emit_selector_dispatch(
        desc.fields.len(),
        MSG_WRONG_FIELD_OFFSET,
        None,
        DispatcherBuilder::emit_set_field_branch,
    )?;

    let emitted = builder.emitter.finish().map_err(|reason| malformed(desc, reason))?;
    Ok(DispatcherImage {
        target: desc.class,
        type_name: desc.name.clone(),
        code: emitted.code,
        constants: emitted.constants,
        entry_points,
        max_stack: emitted.max_stack,
    })
}

fn malformed(desc: &TypeDescription, reason: impl Into<String>) -> GenerationError {
    GenerationError::MalformedImage {
        unit: desc.name.clone(),
        reason: reason.into(),
    }
}

fn arity_table(
    desc: &TypeDescription,
    arities: impl Iterator<Item = usize>,
) -> Result<Vec<u16>, GenerationError> {
    arities
        .map(|n| u16::try_from(n).map_err(|_| malformed(desc, format!("{} parameters exceed the encodable limit", n))))
        .collect()
}

struct DispatcherBuilder<'a> {
    desc: &'a TypeDescription,
    emitter: CodeEmitter,
}

impl<'a> DispatcherBuilder<'a> {
    fn new(desc: &'a TypeDescription) -> Self {
        Self {
            desc,
            emitter: CodeEmitter::new(),
        }
    }

    fn entry_offset(&self) -> u32 {
        self.emitter.offset() as u32
    }

    /// `new_instance()`: always the first zero-parameter constructor
    fn emit_new_default(&mut self) -> u32 {
        let entry = self.entry_offset();
        match self.desc.default_constructor() {
            Some(ordinal) => {
                let ctor = self.emitter.constant(Constant::Constructor {
                    ordinal: ordinal as u32,
                    parameters: Vec::new(),
                });
                self.emitter.emit_new(ctor, 0);
                self.emitter.emit_return();
            }
            None => self.emitter.emit_throw_no_default(),
        }
        entry
    }

    fn emit_selector_dispatch(
        &mut self,
        count: usize,
        offset_message: &str,
        arities: Option<Vec<u16>>,
        branch: BranchFn<'a>,
    ) -> Result<u32, GenerationError> {
        let entry = self.entry_offset();
        let offset_msg = self.emitter.message(offset_message);

        if let Some(table) = arities {
            let null_msg = self.emitter.message(MSG_ARGS_NULL);
            self.emitter.emit_check_args(null_msg);
            self.emitter.emit_check_bounds(count as u32, offset_msg);
            let table = self.emitter.constant(Constant::ArityTable(table));
            let arity_msg = self.emitter.message(MSG_WRONG_ARG_COUNT);
            self.emitter.emit_check_arity(table, arity_msg);
        } else {
            self.emitter.emit_check_bounds(count as u32, offset_msg);
        }

        let error = self.emitter.define_label();
        if count > 0 {
            let labels: Vec<_> = (0..count).map(|_| self.emitter.define_label()).collect();
            self.emitter.emit_table_switch(&labels, error);
            for (ordinal, &label) in labels.iter().enumerate() {
                self.emitter.mark_label(label);
                branch(self, ordinal)?;
            }
        }

        self.emitter.mark_label(error);
        self.emitter.emit_throw_illegal(offset_msg);
        Ok(entry)
    }

    fn emit_cast_receiver(&mut self) {
        self.emitter.emit_load_receiver();
        self.emit_cast(self.desc.class);
    }

    fn emit_cast(&mut self, class: ClassId) {
        // Everything is an object; the cast would never fail
        if class != ClassId::OBJECT {
            let class = self.emitter.constant(Constant::Class(class));
            self.emitter.emit_check_cast(class);
        }
    }

    /// Convert the top of stack to a declared parameter or field type
    fn emit_coerce(&mut self, ty: ValueType) {
        match ty {
            ValueType::Reference(class) => self.emit_cast(class),
            ValueType::Void => {}
            primitive => self.emitter.emit_unbox(primitive),
        }
    }

    fn emit_load_args(&mut self, parameters: &[ValueType]) -> Result<(), GenerationError> {
        for (index, &ty) in parameters.iter().enumerate() {
            let index = u16::try_from(index).map_err(|_| malformed(self.desc, "argument index overflow"))?;
            self.emitter.emit_load_arg(index);
            self.emit_coerce(ty);
        }
        Ok(())
    }

    fn emit_constructor_branch(&mut self, ordinal: usize) -> Result<(), GenerationError> {
        let desc = self.desc;
        let parameters = &desc.constructors[ordinal].parameters;
        self.emit_load_args(parameters)?;
        let ctor = self.emitter.constant(Constant::Constructor {
            ordinal: ordinal as u32,
            parameters: parameters.clone(),
        });
        self.emitter.emit_new(ctor, parameters.len());
        self.emitter.emit_return();
        Ok(())
    }

    fn emit_method_branch(&mut self, ordinal: usize) -> Result<(), GenerationError> {
        let desc = self.desc;
        let method = &desc.methods[ordinal];
        let kind = method.invoke_kind();

        if kind != InvokeKind::Static {
            self.emit_cast_receiver();
        }
        self.emit_load_args(&method.parameters)?;

        let op = match kind {
            InvokeKind::Static => opcode::INVOKE_STATIC,
            InvokeKind::Special => opcode::INVOKE_SPECIAL,
            InvokeKind::Virtual => opcode::INVOKE_VIRTUAL,
            InvokeKind::Interface => opcode::INVOKE_INTERFACE,
        };
        let method_ref = self.emitter.constant(Constant::Method {
            ordinal: ordinal as u32,
            name: method.name.clone(),
            parameters: method.parameters.clone(),
            return_type: method.return_type,
            kind,
        });
        self.emitter.emit_invoke(op, method_ref, method.parameters.len());

        match method.return_type {
            ValueType::Void => {
                self.emitter.emit_pop();
                self.emitter.emit_const_null();
            }
            ty => self.emitter.emit_box(ty),
        }
        self.emitter.emit_return();
        Ok(())
    }

    fn field_constant(&mut self, ordinal: usize) -> (u16, bool, ValueType) {
        let field = &self.desc.fields[ordinal];
        let is_static = field.is_static();
        let value_type = field.value_type;
        let index = self.emitter.constant(Constant::Field {
            ordinal: ordinal as u32,
            name: field.name.clone(),
            value_type,
            is_static,
        });
        (index, is_static, value_type)
    }

    fn emit_get_field_branch(&mut self, ordinal: usize) -> Result<(), GenerationError> {
        let (field, is_static, value_type) = self.field_constant(ordinal);
        if !is_static {
            self.emit_cast_receiver();
        }
        self.emitter.emit_get_field(field, is_static);
        self.emitter.emit_box(value_type);
        self.emitter.emit_return();
        Ok(())
    }

    fn emit_set_field_branch(&mut self, ordinal: usize) -> Result<(), GenerationError> {
        let (field, is_static, value_type) = self.field_constant(ordinal);
        if !is_static {
            self.emit_cast_receiver();
        }
        self.emitter.emit_load_value();
        self.emit_coerce(value_type);
        self.emitter.emit_put_field(field, is_static);
        self.emitter.emit_return_void();
        Ok(())
    }
}
