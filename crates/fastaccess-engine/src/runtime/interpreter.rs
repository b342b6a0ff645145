//! Execution of installed dispatcher code

use crate::codegen::opcode;
use crate::codegen::{Constant, Cursor, DispatcherImage, EntryPoint};
use crate::error::{AccessError, AccessResult};
use crate::model::{ClassId, MethodFn, TypeModel, ValueType};
use crate::value::Value;

use super::linker::{LinkedMethod, Linkage};

/// Inputs of one accessor call
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame<'a> {
    pub(crate) receiver: &'a Value,
    pub(crate) selector: i32,
    pub(crate) args: Option<&'a [Value]>,
    pub(crate) value: Option<&'a Value>,
}

/// Stack machine over one linked image
pub(crate) struct Interpreter<'a> {
    image: &'a DispatcherImage,
    linkage: &'a Linkage,
    model: &'a dyn TypeModel,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(image: &'a DispatcherImage, linkage: &'a Linkage, model: &'a dyn TypeModel) -> Self {
        Self { image, linkage, model }
    }

    /// Run `entry` to its `RETURN`/`RETURN_VOID` or first error
    pub(crate) fn run(&self, entry: EntryPoint, frame: Frame<'_>) -> AccessResult<Value> {
        let mut stack: Vec<Value> = Vec::with_capacity(self.image.max_stack);
        let mut cursor = Cursor::new(&self.image.code, self.image.entry(entry));

        loop {
            let pc = cursor.pc();
            let op = cursor.read_u8().ok_or_else(|| corrupt(pc, "ran off the end of the code"))?;

            match op {
                opcode::CHECK_ARGS => {
                    let msg = read_u16(&mut cursor, pc)?;
                    if frame.args.is_none() {
                        return Err(self.illegal(msg, pc));
                    }
                }
                opcode::CHECK_BOUNDS => {
                    let count = read_u32(&mut cursor, pc)?;
                    let msg = read_u16(&mut cursor, pc)?;
                    if frame.selector < 0 || frame.selector as u32 >= count {
                        return Err(self.illegal(msg, pc));
                    }
                }
                opcode::CHECK_ARITY => {
                    let table = read_u16(&mut cursor, pc)?;
                    let msg = read_u16(&mut cursor, pc)?;
                    let expected = match self.image.constant(table) {
                        Some(Constant::ArityTable(t)) => t.get(frame.selector as usize).copied(),
                        _ => None,
                    }
                    .ok_or_else(|| corrupt(pc, "arity table lookup failed"))?;
                    let given = frame.args.map_or(0, <[Value]>::len);
                    if given != expected as usize {
                        return Err(self.illegal(msg, pc));
                    }
                }
                opcode::TABLE_SWITCH => {
                    let count = read_u32(&mut cursor, pc)?;
                    let default = read_u32(&mut cursor, pc)?;
                    let target = if frame.selector >= 0 && (frame.selector as u32) < count {
                        cursor.jump(cursor.pc() + 4 * frame.selector as usize);
                        read_u32(&mut cursor, pc)?
                    } else {
                        default
                    };
                    cursor.jump(target as usize);
                }
                opcode::THROW_ILLEGAL => {
                    let msg = read_u16(&mut cursor, pc)?;
                    return Err(self.illegal(msg, pc));
                }
                opcode::THROW_NO_DEFAULT => {
                    return Err(AccessError::NoDefaultConstructor(self.image.type_name.clone()));
                }

                opcode::LOAD_RECEIVER => stack.push(frame.receiver.clone()),
                opcode::LOAD_ARG => {
                    let index = read_u16(&mut cursor, pc)?;
                    let arg = frame
                        .args
                        .and_then(|args| args.get(index as usize))
                        .ok_or_else(|| corrupt(pc, "argument index out of range"))?;
                    stack.push(arg.clone());
                }
                opcode::LOAD_VALUE => stack.push(frame.value.cloned().unwrap_or_default()),
                opcode::CONST_NULL => stack.push(Value::Null),
                opcode::POP => {
                    pop(&mut stack, pc)?;
                }

                opcode::UNBOX | opcode::BOX => {
                    let kind = cursor
                        .read_u8()
                        .and_then(ValueType::from_primitive_code)
                        .ok_or_else(|| corrupt(pc, "bad primitive kind"))?;
                    let value = pop(&mut stack, pc)?;
                    let value = if op == opcode::BOX { value.boxed(kind)? } else { value.unbox(kind)? };
                    stack.push(value);
                }
                opcode::CHECK_CAST => {
                    let index = read_u16(&mut cursor, pc)?;
                    let class = match self.image.constant(index) {
                        Some(Constant::Class(class)) => *class,
                        _ => return Err(corrupt(pc, "cast target is not a class")),
                    };
                    let top = stack.last().ok_or_else(|| corrupt(pc, "stack underflow"))?;
                    self.check_cast(top, class)?;
                }

                opcode::NEW => {
                    let index = read_u16(&mut cursor, pc)?;
                    let ctor = self
                        .linkage
                        .constructor(index)
                        .ok_or_else(|| corrupt(pc, "unlinked constructor"))?;
                    let args = pop_n(&mut stack, ctor.arity, pc)?;
                    let object = (ctor.handle)(&args).map_err(AccessError::Target)?;
                    stack.push(Value::Object(object));
                }
                opcode::INVOKE_STATIC
                | opcode::INVOKE_SPECIAL
                | opcode::INVOKE_VIRTUAL
                | opcode::INVOKE_INTERFACE => {
                    let index = read_u16(&mut cursor, pc)?;
                    let method = self
                        .linkage
                        .method(index)
                        .ok_or_else(|| corrupt(pc, "unlinked method"))?;
                    let args = pop_n(&mut stack, method.descriptor.parameters.len(), pc)?;
                    let result = if op == opcode::INVOKE_STATIC {
                        let handle = direct_handle(method, &Value::Null)?;
                        handle(&Value::Null, &args)
                    } else {
                        let receiver = pop(&mut stack, pc)?;
                        if receiver.is_null() {
                            return Err(AccessError::NullReceiver);
                        }
                        let handle = if op == opcode::INVOKE_SPECIAL {
                            direct_handle(method, &receiver)?
                        } else {
                            self.dispatch_handle(method, &receiver)?
                        };
                        handle(&receiver, &args)
                    };
                    stack.push(result.map_err(AccessError::Target)?);
                }
                opcode::GET_STATIC | opcode::GET_FIELD => {
                    let index = read_u16(&mut cursor, pc)?;
                    let field = self.linkage.field(index).ok_or_else(|| corrupt(pc, "unlinked field"))?;
                    let receiver = if op == opcode::GET_FIELD {
                        non_null(pop(&mut stack, pc)?)?
                    } else {
                        Value::Null
                    };
                    stack.push(field.get(&receiver).map_err(AccessError::Target)?);
                }
                opcode::PUT_STATIC | opcode::PUT_FIELD => {
                    let index = read_u16(&mut cursor, pc)?;
                    let field = self.linkage.field(index).ok_or_else(|| corrupt(pc, "unlinked field"))?;
                    let value = pop(&mut stack, pc)?;
                    let receiver = if op == opcode::PUT_FIELD {
                        non_null(pop(&mut stack, pc)?)?
                    } else {
                        Value::Null
                    };
                    field.set(&receiver, value).map_err(AccessError::Target)?;
                }

                opcode::RETURN => return pop(&mut stack, pc),
                opcode::RETURN_VOID => return Ok(Value::Null),

                other => return Err(corrupt(pc, &format!("invalid opcode {:#04x}", other))),
            }
        }
    }

    fn illegal(&self, msg: u16, pc: usize) -> AccessError {
        match self.image.constant(msg) {
            Some(Constant::Message(text)) => AccessError::IllegalArgument(text.clone()),
            _ => corrupt(pc, "message constant missing"),
        }
    }

    /// Null passes; references must be assignable; boxed primitives only
    /// pass as `object`, whose casts are never emitted
    fn check_cast(&self, value: &Value, class: ClassId) -> AccessResult<()> {
        let assignable = value.is_null()
            || match value.class_of() {
                Some(found) => found == class || self.model.is_assignable(found, class),
                None => false,
            };
        if assignable {
            Ok(())
        } else {
            Err(AccessError::ClassCast {
                found: value.type_label(),
                expected: self.model.type_name(class).unwrap_or_else(|| class.to_string()),
            })
        }
    }

    /// Virtual and interface calls: most specific override on the
    /// receiver's runtime class, else the declared body
    fn dispatch_handle(&self, method: &LinkedMethod, receiver: &Value) -> AccessResult<MethodFn> {
        if let Some(runtime) = receiver.class_of() {
            if runtime != self.image.target || method.handle.is_none() {
                if let Some(handle) = self.model.resolve_override(runtime, &method.descriptor) {
                    return Ok(handle);
                }
            }
        }
        direct_handle(method, receiver)
    }
}

fn direct_handle(method: &LinkedMethod, receiver: &Value) -> AccessResult<MethodFn> {
    method.handle.clone().ok_or_else(|| AccessError::AbstractMethod {
        method: method.descriptor.name.clone(),
        receiver: receiver.class_of().unwrap_or(ClassId::OBJECT),
    })
}

fn non_null(receiver: Value) -> AccessResult<Value> {
    if receiver.is_null() {
        Err(AccessError::NullReceiver)
    } else {
        Ok(receiver)
    }
}

fn corrupt(pc: usize, what: &str) -> AccessError {
    AccessError::CorruptCode(format!("{} at {}", what, pc))
}

fn read_u16(cursor: &mut Cursor<'_>, pc: usize) -> AccessResult<u16> {
    cursor.read_u16().ok_or_else(|| corrupt(pc, "truncated operand"))
}

fn read_u32(cursor: &mut Cursor<'_>, pc: usize) -> AccessResult<u32> {
    cursor.read_u32().ok_or_else(|| corrupt(pc, "truncated operand"))
}

fn pop(stack: &mut Vec<Value>, pc: usize) -> AccessResult<Value> {
    stack.pop().ok_or_else(|| corrupt(pc, "stack underflow"))
}

fn pop_n(stack: &mut Vec<Value>, n: usize, pc: usize) -> AccessResult<Vec<Value>> {
    if stack.len() < n {
        return Err(corrupt(pc, "stack underflow"));
    }
    Ok(stack.split_off(stack.len() - n))
}
