//! Linking and executing installed dispatcher code
//!
//! - **Linker**: binds each member reference in the constant pool to a
//!   handle from the type model, once per installed unit
//! - **Interpreter**: runs one entry point over an operand stack
//! - **GeneratedDispatcher**: the [`Accessor`](crate::Accessor) built on both

mod dispatcher;
mod interpreter;
mod linker;

pub use dispatcher::GeneratedDispatcher;
pub use linker::Linkage;
