//! `fastaccess disasm` - build a dispatcher and print its listing.

use std::path::Path;

use anyhow::Context;
use fastaccess_engine::{build_dispatcher, disassemble};

pub fn execute(file: &str, output: Option<&str>) -> anyhow::Result<()> {
    let desc = super::load_description(Path::new(file))?;
    let image = build_dispatcher(&desc).with_context(|| format!("failed to build dispatcher for {}", desc.name))?;
    tracing::debug!(type_name = %desc.name, bytes = image.code.len(), "built dispatcher");

    let listing = disassemble(&image);
    match output {
        Some(path) => {
            std::fs::write(path, &listing).with_context(|| format!("failed to write {}", path))?;
            println!("Wrote {} ({} bytes of code)", path, image.code.len());
        }
        None => print!("{}", listing),
    }
    Ok(())
}
