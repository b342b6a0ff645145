//! Debug sinks for generated code

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::codegen::{disassemble, DispatcherImage};

/// Destination for snapshots of generated images.
///
/// Failures are reported by the caller as warnings and never affect
/// generation.
pub trait DebugSink: Send + Sync {
    /// Persist `image`, installed under `unit_name`
    fn persist(&self, unit_name: &str, image: &DispatcherImage) -> io::Result<()>;
}

/// Writes the disassembly of each image to `<dir>/<unit>.fxasm`
#[derive(Debug, Clone)]
pub struct FileDebugSink {
    dir: PathBuf,
}

impl FileDebugSink {
    /// Sink writing into `dir`, created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a unit is written to
    pub fn path_for(&self, unit_name: &str) -> PathBuf {
        self.dir.join(format!("{}.fxasm", sanitize(unit_name)))
    }
}

impl DebugSink for FileDebugSink {
    fn persist(&self, unit_name: &str, image: &DispatcherImage) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(unit_name), disassemble(image))
    }
}

/// Keep names portable as file names
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '$' | '#') { c } else { '_' })
        .collect()
}
