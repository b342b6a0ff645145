//! Text rendering of dispatcher images

use std::fmt::Write;

use crate::model::ValueType;

use super::image::{Constant, Cursor, DispatcherImage, EntryPoint};
use super::opcode;

/// Render an image as annotated assembly
pub fn disassemble(image: &DispatcherImage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "; {} ({})", image.type_name, image.target);
    let _ = writeln!(out, "; {} bytes, {} constants, max_stack {}", image.code.len(), image.constants.len(), image.max_stack);

    let mut cursor = Cursor::new(&image.code, 0);
    while !cursor.at_end() {
        let pc = cursor.pc();
        for entry in EntryPoint::ALL {
            if image.entry(entry) == pc {
                let _ = writeln!(out, "\n{}:", entry.name());
            }
        }
        match render_instruction(image, &mut cursor) {
            Some(text) => {
                let _ = writeln!(out, "  {:04x}  {}", pc, text);
            }
            None => {
                let _ = writeln!(out, "  {:04x}  <undecodable>", pc);
                break;
            }
        }
    }

    let _ = writeln!(out, "\nconstants:");
    for (index, constant) in image.constants.iter().enumerate() {
        let _ = writeln!(out, "  #{:<3} {}", index, render_constant(constant));
    }
    out
}

fn render_instruction(image: &DispatcherImage, cursor: &mut Cursor<'_>) -> Option<String> {
    let op = cursor.read_u8()?;
    let name = opcode::mnemonic(op)?;
    let constant = |index: u16| {
        image
            .constant(index)
            .map(render_constant)
            .unwrap_or_else(|| "<missing>".to_string())
    };

    let text = match op {
        opcode::CHECK_ARGS | opcode::THROW_ILLEGAL | opcode::CHECK_CAST | opcode::NEW
        | opcode::INVOKE_STATIC | opcode::INVOKE_SPECIAL | opcode::INVOKE_VIRTUAL
        | opcode::INVOKE_INTERFACE | opcode::GET_STATIC | opcode::GET_FIELD
        | opcode::PUT_STATIC | opcode::PUT_FIELD => {
            let index = cursor.read_u16()?;
            format!("{:<16} #{} {}", name, index, constant(index))
        }
        opcode::CHECK_BOUNDS => {
            let count = cursor.read_u32()?;
            let msg = cursor.read_u16()?;
            format!("{:<16} {} #{}", name, count, msg)
        }
        opcode::CHECK_ARITY => {
            let table = cursor.read_u16()?;
            let msg = cursor.read_u16()?;
            format!("{:<16} #{} #{}", name, table, msg)
        }
        opcode::TABLE_SWITCH => {
            let count = cursor.read_u32()?;
            let default = cursor.read_u32()?;
            let mut targets = Vec::with_capacity(count as usize);
            for _ in 0..count {
                targets.push(format!("{:04x}", cursor.read_u32()?));
            }
            format!("{:<16} {} default={:04x} [{}]", name, count, default, targets.join(", "))
        }
        opcode::LOAD_ARG => format!("{:<16} {}", name, cursor.read_u16()?),
        opcode::UNBOX | opcode::BOX => {
            let kind = ValueType::from_primitive_code(cursor.read_u8()?)?;
            format!("{:<16} {}", name, kind)
        }
        _ => name.to_string(),
    };
    Some(text)
}

fn render_types(types: &[ValueType]) -> String {
    types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}

fn render_constant(constant: &Constant) -> String {
    match constant {
        Constant::Message(text) => format!("{:?}", text),
        Constant::ArityTable(table) => format!("arity {:?}", table),
        Constant::Class(class) => format!("class {}", class),
        Constant::Constructor { ordinal, parameters } => {
            format!("ctor[{}]({})", ordinal, render_types(parameters))
        }
        Constant::Method {
            ordinal,
            name,
            parameters,
            return_type,
            kind,
        } => format!(
            "method[{}] {}({}) -> {} [{}]",
            ordinal,
            name,
            render_types(parameters),
            return_type,
            kind.mnemonic()
        ),
        Constant::Field {
            ordinal,
            name,
            value_type,
            is_static,
        } => format!(
            "field[{}] {}{}: {}",
            ordinal,
            if *is_static { "static " } else { "" },
            name,
            value_type
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::build_dispatcher;
    use crate::model::{ClassId, ConstructorDescriptor, FieldDescriptor, MethodDescriptor, TypeDescription};

    #[test]
    fn test_disassembly_lists_entries_and_constants() {
        let class = ClassId(30);
        let mut desc = TypeDescription::new(class, "demo.Box");
        desc.constructors = vec![ConstructorDescriptor::new(vec![])];
        desc.methods = vec![MethodDescriptor::new("get", vec![], ValueType::OBJECT, class)];
        desc.fields = vec![FieldDescriptor::new("value", ValueType::Int, class)];

        let text = disassemble(&build_dispatcher(&desc).unwrap());
        for entry in EntryPoint::ALL {
            assert!(text.contains(&format!("\n{}:", entry.name())), "missing {}", entry.name());
        }
        assert!(text.contains("invoke_virtual"));
        assert!(text.contains("\"wrong offset of field\""));
        assert!(text.contains("method[0] get() -> object [invoke_virtual]"));
        assert!(text.contains("field[0] value: int"));
        assert!(!text.contains("<undecodable>"));
    }
}
