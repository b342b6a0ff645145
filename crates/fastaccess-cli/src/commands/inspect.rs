//! `fastaccess inspect` - member tables and threshold check for a type.

use std::path::Path;

use anyhow::Context;
use fastaccess_engine::{CompilerConfig, TypeDescription};

pub fn execute(file: &str, threshold: Option<usize>, config: Option<&str>) -> anyhow::Result<()> {
    let desc = super::load_description(Path::new(file))?;

    let mut settings = match config {
        Some(path) => {
            let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
            CompilerConfig::from_toml_str(&source).with_context(|| format!("invalid settings in {}", path))?
        }
        None => CompilerConfig::from_env()?,
    };
    if let Some(threshold) = threshold {
        settings.generation_threshold = threshold;
    }

    print!("{}", render(&desc, &settings));
    Ok(())
}

fn render(desc: &TypeDescription, settings: &CompilerConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("Type:         {} ({})\n", desc.name, desc.class));

    out.push_str(&format!("Constructors: {}\n", desc.constructors.len()));
    for (ordinal, ctor) in desc.constructors.iter().enumerate() {
        out.push_str(&format!("  [{}] ({})\n", ordinal, join(&ctor.parameters)));
    }

    out.push_str(&format!("Methods:      {}\n", desc.methods.len()));
    for (ordinal, method) in desc.methods.iter().enumerate() {
        out.push_str(&format!(
            "  [{}] {}({}) -> {}  {}\n",
            ordinal,
            method.name,
            join(&method.parameters),
            method.return_type,
            method.invoke_kind().mnemonic()
        ));
    }

    out.push_str(&format!("Fields:       {}\n", desc.fields.len()));
    for (ordinal, field) in desc.fields.iter().enumerate() {
        let kind = if field.is_static() { "static" } else { "instance" };
        out.push_str(&format!("  [{}] {}: {}  {}\n", ordinal, field.name, field.value_type, kind));
    }

    let verdict = if settings.should_generate(desc.member_count()) {
        "generate"
    } else {
        "below threshold"
    };
    out.push_str(&format!(
        "Members:      {} (threshold {}: {})\n",
        desc.member_count(),
        settings.generation_threshold,
        verdict
    ));
    out
}

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastaccess_engine::{ClassId, FieldDescriptor, MethodDescriptor, Modifiers, ValueType};

    #[test]
    fn test_render_lists_ordinals_and_verdict() {
        let mut desc = TypeDescription::new(ClassId(7), "demo.Point");
        desc.methods.push(MethodDescriptor::new("norm", vec![], ValueType::Double, ClassId(7)));
        desc.fields.push(
            FieldDescriptor::new("origin", ValueType::Reference(ClassId(7)), ClassId(7))
                .with_modifiers(Modifiers::public().with_static()),
        );

        let text = render(&desc, &CompilerConfig::default());
        assert!(text.contains("[0] norm() -> double  invoke_virtual"));
        assert!(text.contains("[0] origin: class#7  static"));
        assert!(text.contains("Members:      2 (threshold 3: below threshold)"));

        let eager = CompilerConfig {
            generation_threshold: 1,
            ..CompilerConfig::default()
        };
        assert!(render(&desc, &eager).contains("(threshold 1: generate)"));
    }
}
