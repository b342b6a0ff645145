//! Instruction emission with label patching
//!
//! Labels mark branch heads. Every branch in a dispatcher starts with an
//! empty operand stack, so marking a label resets the tracked depth.

use rustc_hash::FxHashMap;

use crate::model::ValueType;

use super::image::Constant;
use super::opcode;

/// A jump target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label {
    id: usize,
}

/// Unresolved jump that needs label patching
#[derive(Debug, Clone)]
struct UnresolvedJump {
    /// Position in code where the target needs to be written
    offset_position: usize,
    /// Target label
    target_label: Label,
}

/// Output of a finished emitter
#[derive(Debug)]
pub struct EmittedCode {
    /// Encoded instructions
    pub code: Vec<u8>,
    /// Constant pool
    pub constants: Vec<Constant>,
    /// Maximum operand stack depth
    pub max_stack: usize,
}

/// Builder for dispatcher instruction streams
#[derive(Debug, Default)]
pub struct CodeEmitter {
    code: Vec<u8>,
    constants: Vec<Constant>,
    constant_indices: FxHashMap<Constant, u16>,
    next_label_id: usize,
    label_positions: FxHashMap<usize, usize>,
    unresolved_jumps: Vec<UnresolvedJump>,
    depth: usize,
    max_stack: usize,
    errors: Vec<String>,
}

impl CodeEmitter {
    /// Create an empty emitter
    pub fn new() -> Self {
        Self {
            code: Vec::with_capacity(256),
            ..Self::default()
        }
    }

    /// Current code offset
    pub fn offset(&self) -> usize {
        self.code.len()
    }

    fn push(&mut self, n: usize) {
        self.depth += n;
        self.max_stack = self.max_stack.max(self.depth);
    }

    fn pop(&mut self, n: usize) {
        if n > self.depth {
            self.errors
                .push(format!("stack underflow at {}: need {}, have {}", self.offset(), n, self.depth));
        }
        self.depth = self.depth.saturating_sub(n);
    }

    fn emit_u16(&mut self, value: u16) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    fn emit_u32(&mut self, value: u32) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    fn emit_label_ref(&mut self, label: Label) {
        self.unresolved_jumps.push(UnresolvedJump {
            offset_position: self.offset(),
            target_label: label,
        });
        self.emit_u32(0);
    }

    // ===== Labels and constants =====

    /// Define a new, unmarked label
    pub fn define_label(&mut self) -> Label {
        let label = Label { id: self.next_label_id };
        self.next_label_id += 1;
        label
    }

    /// Bind a label to the current offset
    pub fn mark_label(&mut self, label: Label) {
        if self.label_positions.insert(label.id, self.offset()).is_some() {
            self.errors.push(format!("label {} marked twice", label.id));
        }
        self.depth = 0;
    }

    /// Intern a constant, returning its pool index
    pub fn constant(&mut self, constant: Constant) -> u16 {
        if let Some(&index) = self.constant_indices.get(&constant) {
            return index;
        }
        let index = match u16::try_from(self.constants.len()) {
            Ok(index) => index,
            Err(_) => {
                self.errors.push("constant pool overflow".to_string());
                return 0;
            }
        };
        self.constants.push(constant.clone());
        self.constant_indices.insert(constant, index);
        index
    }

    /// Intern a message constant
    pub fn message(&mut self, text: &str) -> u16 {
        self.constant(Constant::Message(text.to_string()))
    }

    // ===== Shape checks and control flow =====

    /// `CHECK_ARGS msg`
    pub fn emit_check_args(&mut self, msg: u16) {
        self.code.push(opcode::CHECK_ARGS);
        self.emit_u16(msg);
    }

    /// `CHECK_BOUNDS count msg`
    pub fn emit_check_bounds(&mut self, count: u32, msg: u16) {
        self.code.push(opcode::CHECK_BOUNDS);
        self.emit_u32(count);
        self.emit_u16(msg);
    }

    /// `CHECK_ARITY table msg`
    pub fn emit_check_arity(&mut self, table: u16, msg: u16) {
        self.code.push(opcode::CHECK_ARITY);
        self.emit_u16(table);
        self.emit_u16(msg);
    }

    /// `TABLE_SWITCH` over `targets`, falling back to `default`
    pub fn emit_table_switch(&mut self, targets: &[Label], default: Label) {
        self.code.push(opcode::TABLE_SWITCH);
        self.emit_u32(targets.len() as u32);
        self.emit_label_ref(default);
        for &target in targets {
            self.emit_label_ref(target);
        }
    }

    /// `THROW_ILLEGAL msg`
    pub fn emit_throw_illegal(&mut self, msg: u16) {
        self.code.push(opcode::THROW_ILLEGAL);
        self.emit_u16(msg);
    }

    /// `THROW_NO_DEFAULT`
    pub fn emit_throw_no_default(&mut self) {
        self.code.push(opcode::THROW_NO_DEFAULT);
    }

    // ===== Loads and conversions =====

    /// `LOAD_RECEIVER`
    pub fn emit_load_receiver(&mut self) {
        self.code.push(opcode::LOAD_RECEIVER);
        self.push(1);
    }

    /// `LOAD_ARG index`
    pub fn emit_load_arg(&mut self, index: u16) {
        self.code.push(opcode::LOAD_ARG);
        self.emit_u16(index);
        self.push(1);
    }

    /// `LOAD_VALUE`
    pub fn emit_load_value(&mut self) {
        self.code.push(opcode::LOAD_VALUE);
        self.push(1);
    }

    /// `CONST_NULL`
    pub fn emit_const_null(&mut self) {
        self.code.push(opcode::CONST_NULL);
        self.push(1);
    }

    /// `POP`
    pub fn emit_pop(&mut self) {
        self.code.push(opcode::POP);
        self.pop(1);
    }

    /// `UNBOX kind` (no-op for non-primitive kinds)
    pub fn emit_unbox(&mut self, kind: ValueType) {
        if let Some(code) = kind.primitive_code() {
            self.code.push(opcode::UNBOX);
            self.code.push(code);
        }
    }

    /// `BOX kind` (no-op for non-primitive kinds)
    pub fn emit_box(&mut self, kind: ValueType) {
        if let Some(code) = kind.primitive_code() {
            self.code.push(opcode::BOX);
            self.code.push(code);
        }
    }

    /// `CHECK_CAST class`
    pub fn emit_check_cast(&mut self, class: u16) {
        self.code.push(opcode::CHECK_CAST);
        self.emit_u16(class);
    }

    // ===== Member access =====

    /// `NEW ctor`, consuming `argc` arguments
    pub fn emit_new(&mut self, ctor: u16, argc: usize) {
        self.code.push(opcode::NEW);
        self.emit_u16(ctor);
        self.pop(argc);
        self.push(1);
    }

    /// One of the `INVOKE_*` opcodes, consuming `argc` arguments and the
    /// receiver unless the call is static
    pub fn emit_invoke(&mut self, op: u8, method: u16, argc: usize) {
        self.code.push(op);
        self.emit_u16(method);
        let receiver = usize::from(op != opcode::INVOKE_STATIC);
        self.pop(argc + receiver);
        self.push(1);
    }

    /// `GET_STATIC field` / `GET_FIELD field`
    pub fn emit_get_field(&mut self, field: u16, is_static: bool) {
        if is_static {
            self.code.push(opcode::GET_STATIC);
        } else {
            self.code.push(opcode::GET_FIELD);
            self.pop(1);
        }
        self.emit_u16(field);
        self.push(1);
    }

    /// `PUT_STATIC field` / `PUT_FIELD field`
    pub fn emit_put_field(&mut self, field: u16, is_static: bool) {
        if is_static {
            self.code.push(opcode::PUT_STATIC);
            self.pop(1);
        } else {
            self.code.push(opcode::PUT_FIELD);
            self.pop(2);
        }
        self.emit_u16(field);
    }

    /// `RETURN`
    pub fn emit_return(&mut self) {
        self.code.push(opcode::RETURN);
        self.pop(1);
    }

    /// `RETURN_VOID`
    pub fn emit_return_void(&mut self) {
        self.code.push(opcode::RETURN_VOID);
    }

    /// Patch jump targets and hand over the code.
    ///
    /// Fails on labels that were referenced but never marked, or on any
    /// inconsistency recorded during emission.
    pub fn finish(mut self) -> Result<EmittedCode, String> {
        for jump in &self.unresolved_jumps {
            match self.label_positions.get(&jump.target_label.id) {
                Some(&target) => {
                    let bytes = (target as u32).to_le_bytes();
                    self.code[jump.offset_position..jump.offset_position + 4].copy_from_slice(&bytes);
                }
                None => self
                    .errors
                    .push(format!("label {} was never marked", jump.target_label.id)),
            }
        }

        if !self.errors.is_empty() {
            return Err(self.errors.join("; "));
        }

        Ok(EmittedCode {
            code: self.code,
            constants: self.constants,
            max_stack: self.max_stack,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_patched() {
        let mut e = CodeEmitter::new();
        let target = e.define_label();
        let default = e.define_label();
        e.emit_table_switch(&[target], default);
        e.mark_label(default);
        e.emit_return_void();
        e.mark_label(target);
        e.emit_const_null();
        e.emit_return();

        let out = e.finish().unwrap();
        // TABLE_SWITCH (1) + count (4) + default (4) + one target (4) = 13
        assert_eq!(out.code[0], opcode::TABLE_SWITCH);
        assert_eq!(u32::from_le_bytes([out.code[5], out.code[6], out.code[7], out.code[8]]), 13);
        assert_eq!(u32::from_le_bytes([out.code[9], out.code[10], out.code[11], out.code[12]]), 14);
        assert_eq!(out.code[14], opcode::CONST_NULL);
    }

    #[test]
    fn test_unmarked_label_fails() {
        let mut e = CodeEmitter::new();
        let label = e.define_label();
        e.emit_table_switch(&[], label);

        let err = e.finish().unwrap_err();
        assert!(err.contains("never marked"));
    }

    #[test]
    fn test_double_mark_fails() {
        let mut e = CodeEmitter::new();
        let label = e.define_label();
        e.mark_label(label);
        e.mark_label(label);
        assert!(e.finish().unwrap_err().contains("marked twice"));
    }

    #[test]
    fn test_constants_are_interned() {
        let mut e = CodeEmitter::new();
        let a = e.message("wrong offset of field");
        let b = e.message("wrong offset of field");
        let c = e.message("wrong number of arguments");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let out = e.finish().unwrap();
        assert_eq!(out.constants.len(), 2);
    }

    #[test]
    fn test_max_stack_tracks_invoke() {
        let mut e = CodeEmitter::new();
        e.emit_load_receiver();
        e.emit_load_arg(0);
        e.emit_load_arg(1);
        e.emit_invoke(opcode::INVOKE_VIRTUAL, 0, 2);
        e.emit_return();

        let out = e.finish().unwrap();
        assert_eq!(out.max_stack, 3);
    }

    #[test]
    fn test_underflow_is_reported() {
        let mut e = CodeEmitter::new();
        e.emit_invoke(opcode::INVOKE_STATIC, 0, 1);
        assert!(e.finish().unwrap_err().contains("underflow"));
    }

    #[test]
    fn test_unbox_skips_references() {
        let mut e = CodeEmitter::new();
        e.emit_unbox(ValueType::OBJECT);
        e.emit_box(ValueType::Void);
        e.emit_unbox(ValueType::Int);
        let out = e.finish().unwrap();
        assert_eq!(out.code, vec![opcode::UNBOX, ValueType::Int.primitive_code().unwrap()]);
    }
}
