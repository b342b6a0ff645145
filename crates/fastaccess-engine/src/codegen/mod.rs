//! Dispatcher code generation
//!
//! Turns a type snapshot into a byte-encoded [`DispatcherImage`]: shape
//! checks, a table switch per selector-taking operation, and one branch per
//! member ordinal with the boxing, casts and call strategy baked in.
//! Nothing here touches shared state; building is safe from any thread.

mod builder;
mod disasm;
mod emitter;
mod image;
pub mod opcode;

pub use builder::build_dispatcher;
pub use disasm::disassemble;
pub use emitter::{CodeEmitter, EmittedCode, Label};
pub use image::{Constant, DispatcherImage, EntryPoint};

pub(crate) use image::Cursor;
