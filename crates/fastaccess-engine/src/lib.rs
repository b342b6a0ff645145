//! fastaccess Engine
//!
//! Runtime accessor compiler. Given a type's structural description, the
//! engine synthesizes a dispatcher whose operations reach a constructor,
//! method or field selected by a dense ordinal, without going through
//! generic reflective invocation on every call.
//!
//! - **Codegen**: builds a byte-encoded dispatcher image per type (`codegen` module)
//! - **Loader**: loading contexts keyed by isolation scope (`loader` module)
//! - **Runtime**: links images against the type model and executes them (`runtime` module)
//! - **Compiler**: the facade tying it together (`compiler` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use fastaccess_engine::{AccessorCompiler, Value};
//!
//! let compiler = AccessorCompiler::new(model, scopes);
//! let accessor = compiler.generate_accessor(list_class)?;
//!
//! let list = accessor.new_instance_with(1, Some(&[Value::Int(5)]))?;
//! let size = accessor.invoke(&Value::Object(list), 0, Some(&[]))?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![allow(clippy::new_without_default)]

pub mod accessor;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod runtime;
pub mod trace;
pub mod value;

pub use accessor::Accessor;
pub use codegen::{build_dispatcher, disassemble, DispatcherImage, EntryPoint};
pub use compiler::{unit_name, AccessorCompiler};
pub use config::{CompilerConfig, ConfigError};
pub use error::{AccessError, AccessResult, GenerationError, MemberError};
pub use loader::{LoadedUnit, LoadingContext, ScopeRegistry};
pub use model::{
    downcast_object, ClassId, ConstructorDescriptor, ConstructorFn, FieldDescriptor, FieldHandle, InvokeKind,
    MethodDescriptor, MethodFn, Modifiers, Object, ObjectRef, ScopeId, ScopeResolver,
    TypeDescription, TypeModel, ValueType, Visibility,
};
pub use runtime::{GeneratedDispatcher, Linkage};
pub use trace::{DebugSink, FileDebugSink};
pub use value::Value;
