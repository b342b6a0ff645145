//! Dispatcher instruction set
//!
//! Operands are little-endian. `msg`, `table`, `class`, `ctor`, `method` and
//! `field` operands are `u16` constant-pool indices; jump targets are
//! absolute `u32` code offsets.

// Shape checks
/// `msg`: throw if the argument sequence is absent
pub const CHECK_ARGS: u8 = 0x01;
/// `count: u32, msg`: throw unless `0 <= selector < count`
pub const CHECK_BOUNDS: u8 = 0x02;
/// `table, msg`: throw unless `args.len() == table[selector]`
pub const CHECK_ARITY: u8 = 0x03;
/// `count: u32, default: u32, targets: [u32; count]`: jump on selector
pub const TABLE_SWITCH: u8 = 0x04;
/// `msg`: throw an illegal-argument error
pub const THROW_ILLEGAL: u8 = 0x06;
/// Throw the missing zero-argument constructor error
pub const THROW_NO_DEFAULT: u8 = 0x07;

// Frame loads
/// Push the receiver
pub const LOAD_RECEIVER: u8 = 0x10;
/// `index: u16`: push an argument
pub const LOAD_ARG: u8 = 0x11;
/// Push the value passed to a field store
pub const LOAD_VALUE: u8 = 0x12;
/// Push null
pub const CONST_NULL: u8 = 0x13;
/// Discard the top of stack
pub const POP: u8 = 0x14;

// Conversions
/// `kind: u8`: convert the top of stack to the canonical primitive variant
pub const UNBOX: u8 = 0x20;
/// `kind: u8`: box a primitive result to its canonical wrapper
pub const BOX: u8 = 0x21;
/// `class`: fail unless the top of stack is null or assignable to the class
pub const CHECK_CAST: u8 = 0x22;

// Member access
/// `ctor`: pop arguments, push the new instance
pub const NEW: u8 = 0x30;
/// `method`: pop arguments, push the result
pub const INVOKE_STATIC: u8 = 0x31;
/// `method`: pop receiver and arguments, call the declared body directly
pub const INVOKE_SPECIAL: u8 = 0x32;
/// `method`: pop receiver and arguments, resolve through the runtime class
pub const INVOKE_VIRTUAL: u8 = 0x33;
/// `method`: pop receiver and arguments, resolve through interface implementors
pub const INVOKE_INTERFACE: u8 = 0x34;
/// `field`: push a static field
pub const GET_STATIC: u8 = 0x35;
/// `field`: pop receiver, push an instance field
pub const GET_FIELD: u8 = 0x36;
/// `field`: pop value, store into a static field
pub const PUT_STATIC: u8 = 0x37;
/// `field`: pop value and receiver, store into an instance field
pub const PUT_FIELD: u8 = 0x38;

// Returns
/// Return the top of stack
pub const RETURN: u8 = 0x40;
/// Return null
pub const RETURN_VOID: u8 = 0x41;

/// Mnemonic for an opcode, `None` if the byte is not an opcode
pub fn mnemonic(op: u8) -> Option<&'static str> {
    let name = match op {
        CHECK_ARGS => "check_args",
        CHECK_BOUNDS => "check_bounds",
        CHECK_ARITY => "check_arity",
        TABLE_SWITCH => "table_switch",
        THROW_ILLEGAL => "throw_illegal",
        THROW_NO_DEFAULT => "throw_no_default",
        LOAD_RECEIVER => "load_receiver",
        LOAD_ARG => "load_arg",
        LOAD_VALUE => "load_value",
        CONST_NULL => "const_null",
        POP => "pop",
        UNBOX => "unbox",
        BOX => "box",
        CHECK_CAST => "check_cast",
        NEW => "new",
        INVOKE_STATIC => "invoke_static",
        INVOKE_SPECIAL => "invoke_special",
        INVOKE_VIRTUAL => "invoke_virtual",
        INVOKE_INTERFACE => "invoke_interface",
        GET_STATIC => "get_static",
        GET_FIELD => "get_field",
        PUT_STATIC => "put_static",
        PUT_FIELD => "put_field",
        RETURN => "return",
        RETURN_VOID => "return_void",
        _ => return None,
    };
    Some(name)
}

/// Byte length of an instruction's operands.
///
/// `TABLE_SWITCH` is variable-length and needs the code to read its count;
/// returns `None` for unknown opcodes or truncated code.
pub fn operand_len(code: &[u8], pc: usize) -> Option<usize> {
    let len = match *code.get(pc)? {
        THROW_NO_DEFAULT | LOAD_RECEIVER | LOAD_VALUE | CONST_NULL | POP | RETURN
        | RETURN_VOID => 0,
        UNBOX | BOX => 1,
        CHECK_ARGS | THROW_ILLEGAL | LOAD_ARG | CHECK_CAST | NEW | INVOKE_STATIC
        | INVOKE_SPECIAL | INVOKE_VIRTUAL | INVOKE_INTERFACE | GET_STATIC | GET_FIELD
        | PUT_STATIC | PUT_FIELD => 2,
        CHECK_ARITY => 4,
        CHECK_BOUNDS => 6,
        TABLE_SWITCH => {
            let bytes = code.get(pc + 1..pc + 5)?;
            let count = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
            8 + count * 4
        }
        _ => return None,
    };
    Some(len)
}
