//! Loading contexts and the scope registry
//!
//! A generated unit becomes usable only once installed into the loading
//! context that mirrors the target type's isolation scope.

mod context;
mod registry;
mod unit;

pub use context::LoadingContext;
pub use registry::ScopeRegistry;
pub use unit::LoadedUnit;
