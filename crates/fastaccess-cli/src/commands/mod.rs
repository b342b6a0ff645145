//! Subcommand implementations

pub mod disasm;
pub mod inspect;

use std::path::Path;

use anyhow::Context;
use fastaccess_engine::TypeDescription;

/// Read a JSON type description
pub(crate) fn load_description(path: &Path) -> anyhow::Result<TypeDescription> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let desc = serde_json::from_str(&source)
        .with_context(|| format!("invalid type description in {}", path.display()))?;
    Ok(desc)
}
