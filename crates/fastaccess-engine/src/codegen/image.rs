//! Dispatcher code images
//!
//! An image is the unit the builder produces and a loading context installs:
//! one instruction stream with five entry points, plus the constant pool its
//! operands index into.

use rustc_hash::FxHashSet;

use crate::model::{ClassId, InvokeKind, ValueType};

use super::opcode;

/// Constant pool entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    /// Fixed error message
    Message(String),
    /// Expected argument count per ordinal
    ArityTable(Vec<u16>),
    /// Cast target
    Class(ClassId),
    /// Symbolic constructor reference
    Constructor {
        /// Ordinal in the constructor list
        ordinal: u32,
        /// Parameter types
        parameters: Vec<ValueType>,
    },
    /// Symbolic method reference
    Method {
        /// Ordinal in the method list
        ordinal: u32,
        /// Method name
        name: String,
        /// Parameter types
        parameters: Vec<ValueType>,
        /// Return type
        return_type: ValueType,
        /// Call strategy chosen at generation time
        kind: InvokeKind,
    },
    /// Symbolic field reference
    Field {
        /// Ordinal in the field list
        ordinal: u32,
        /// Field name
        name: String,
        /// Declared type
        value_type: ValueType,
        /// Whether the field is static
        is_static: bool,
    },
}

/// Operations of the accessor contract, each with its own entry offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// `new_instance()`
    NewDefault = 0,
    /// `new_instance_with(selector, args)`
    NewInstance = 1,
    /// `invoke(target, selector, args)`
    Invoke = 2,
    /// `get_field(target, selector)`
    GetField = 3,
    /// `set_field(target, selector, value)`
    SetField = 4,
}

impl EntryPoint {
    /// Number of entry points
    pub const COUNT: usize = 5;

    /// All entry points in slot order
    pub const ALL: [EntryPoint; Self::COUNT] = [
        EntryPoint::NewDefault,
        EntryPoint::NewInstance,
        EntryPoint::Invoke,
        EntryPoint::GetField,
        EntryPoint::SetField,
    ];

    /// Name used by the disassembler
    pub fn name(self) -> &'static str {
        match self {
            EntryPoint::NewDefault => "new_instance",
            EntryPoint::NewInstance => "new_instance_with",
            EntryPoint::Invoke => "invoke",
            EntryPoint::GetField => "get_field",
            EntryPoint::SetField => "set_field",
        }
    }
}

/// Generated dispatcher code for one target type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherImage {
    /// Target class
    pub target: ClassId,
    /// Target type name
    pub type_name: String,
    /// Encoded instructions
    pub code: Vec<u8>,
    /// Constant pool
    pub constants: Vec<Constant>,
    /// Code offset of each entry point, indexed by `EntryPoint as usize`
    pub entry_points: [u32; EntryPoint::COUNT],
    /// Maximum operand stack depth of any path
    pub max_stack: usize,
}

impl DispatcherImage {
    /// Code offset of an entry point
    pub fn entry(&self, entry: EntryPoint) -> usize {
        self.entry_points[entry as usize] as usize
    }

    /// Constant at `index`
    pub fn constant(&self, index: u16) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    /// Opcodes in code order, operands skipped
    pub fn opcodes(&self) -> Vec<u8> {
        let mut ops = Vec::new();
        let mut pc = 0;
        while pc < self.code.len() {
            ops.push(self.code[pc]);
            match opcode::operand_len(&self.code, pc) {
                Some(len) => pc += 1 + len,
                None => break,
            }
        }
        ops
    }

    /// Structural verification run before installation.
    ///
    /// Checks that every instruction decodes, every constant operand points
    /// at a constant of the right kind, and every jump target and entry
    /// point lands on an instruction boundary.
    pub fn verify(&self) -> Result<(), String> {
        let mut boundaries = FxHashSet::default();
        let mut targets = Vec::new();
        let mut cursor = Cursor::new(&self.code, 0);

        while !cursor.at_end() {
            let pc = cursor.pc();
            boundaries.insert(pc);
            let op = cursor
                .read_u8()
                .ok_or_else(|| format!("truncated code at {}", pc))?;
            if opcode::mnemonic(op).is_none() {
                return Err(format!("invalid opcode {:#04x} at {}", op, pc));
            }
            if opcode::operand_len(&self.code, pc).map_or(true, |len| pc + 1 + len > self.code.len()) {
                return Err(format!("truncated operands at {}", pc));
            }
            self.verify_operands(op, pc, &mut cursor, &mut targets)?;
        }

        for (entry, &offset) in EntryPoint::ALL.iter().zip(self.entry_points.iter()) {
            if !boundaries.contains(&(offset as usize)) {
                return Err(format!("entry point {} at {} is not an instruction", entry.name(), offset));
            }
        }
        for (pc, target) in targets {
            if !boundaries.contains(&target) {
                return Err(format!("jump at {} targets {} which is not an instruction", pc, target));
            }
        }
        Ok(())
    }

    fn verify_operands(
        &self,
        op: u8,
        pc: usize,
        cursor: &mut Cursor<'_>,
        targets: &mut Vec<(usize, usize)>,
    ) -> Result<(), String> {
        let truncated = || format!("truncated operands at {}", pc);
        match op {
            opcode::CHECK_ARGS | opcode::THROW_ILLEGAL => {
                let msg = cursor.read_u16().ok_or_else(truncated)?;
                self.expect_constant(pc, msg, |c| matches!(c, Constant::Message(_)))
            }
            opcode::CHECK_BOUNDS => {
                cursor.read_u32().ok_or_else(truncated)?;
                let msg = cursor.read_u16().ok_or_else(truncated)?;
                self.expect_constant(pc, msg, |c| matches!(c, Constant::Message(_)))
            }
            opcode::CHECK_ARITY => {
                let table = cursor.read_u16().ok_or_else(truncated)?;
                let msg = cursor.read_u16().ok_or_else(truncated)?;
                self.expect_constant(pc, table, |c| matches!(c, Constant::ArityTable(_)))?;
                self.expect_constant(pc, msg, |c| matches!(c, Constant::Message(_)))
            }
            opcode::TABLE_SWITCH => {
                let count = cursor.read_u32().ok_or_else(truncated)?;
                let default = cursor.read_u32().ok_or_else(truncated)?;
                targets.push((pc, default as usize));
                for _ in 0..count {
                    let target = cursor.read_u32().ok_or_else(truncated)?;
                    targets.push((pc, target as usize));
                }
                Ok(())
            }
            opcode::LOAD_ARG => cursor.read_u16().map(|_| ()).ok_or_else(truncated),
            opcode::UNBOX | opcode::BOX => {
                let kind = cursor.read_u8().ok_or_else(truncated)?;
                ValueType::from_primitive_code(kind)
                    .map(|_| ())
                    .ok_or_else(|| format!("invalid primitive kind {} at {}", kind, pc))
            }
            opcode::CHECK_CAST => {
                let class = cursor.read_u16().ok_or_else(truncated)?;
                self.expect_constant(pc, class, |c| matches!(c, Constant::Class(_)))
            }
            opcode::NEW => {
                let ctor = cursor.read_u16().ok_or_else(truncated)?;
                self.expect_constant(pc, ctor, |c| matches!(c, Constant::Constructor { .. }))
            }
            opcode::INVOKE_STATIC
            | opcode::INVOKE_SPECIAL
            | opcode::INVOKE_VIRTUAL
            | opcode::INVOKE_INTERFACE => {
                let method = cursor.read_u16().ok_or_else(truncated)?;
                let expected = match op {
                    opcode::INVOKE_STATIC => InvokeKind::Static,
                    opcode::INVOKE_SPECIAL => InvokeKind::Special,
                    opcode::INVOKE_VIRTUAL => InvokeKind::Virtual,
                    _ => InvokeKind::Interface,
                };
                self.expect_constant(pc, method, |c| {
                    matches!(c, Constant::Method { kind, .. } if *kind == expected)
                })
            }
            opcode::GET_STATIC | opcode::PUT_STATIC | opcode::GET_FIELD | opcode::PUT_FIELD => {
                let field = cursor.read_u16().ok_or_else(truncated)?;
                let want_static = matches!(op, opcode::GET_STATIC | opcode::PUT_STATIC);
                self.expect_constant(pc, field, |c| {
                    matches!(c, Constant::Field { is_static, .. } if *is_static == want_static)
                })
            }
            _ => Ok(()),
        }
    }

    fn expect_constant(
        &self,
        pc: usize,
        index: u16,
        is_expected: impl Fn(&Constant) -> bool,
    ) -> Result<(), String> {
        match self.constant(index) {
            Some(c) if is_expected(c) => Ok(()),
            Some(c) => Err(format!("constant #{} used at {} has the wrong kind: {:?}", index, pc, c)),
            None => Err(format!("constant #{} used at {} is out of range", index, pc)),
        }
    }
}

/// Little-endian reader over an instruction stream
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    code: &'a [u8],
    pc: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(code: &'a [u8], pc: usize) -> Self {
        Self { code, pc }
    }

    pub(crate) fn pc(&self) -> usize {
        self.pc
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pc >= self.code.len()
    }

    pub(crate) fn jump(&mut self, target: usize) {
        self.pc = target;
    }

    pub(crate) fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.code.get(self.pc)?;
        self.pc += 1;
        Some(byte)
    }

    pub(crate) fn read_u16(&mut self) -> Option<u16> {
        let bytes = self.code.get(self.pc..self.pc + 2)?;
        self.pc += 2;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.code.get(self.pc..self.pc + 4)?;
        self.pc += 4;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
