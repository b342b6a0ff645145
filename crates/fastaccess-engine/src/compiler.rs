//! Accessor compiler facade
//!
//! Ties the pieces together for one request:
//!
//! 1. name the unit for the target class
//! 2. resolve the loading context of the class's scope
//! 3. under that context's definition lock, reuse the installed unit or
//!    build, trace and install a new one
//! 4. link and wrap the unit as an [`Accessor`]
//!
//! Generation happens at most once per (type, loading context). Every later
//! request for the same type returns a dispatcher over the same unit, linked
//! against the requesting compiler's own type model.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::accessor::Accessor;
use crate::codegen::{build_dispatcher, DispatcherImage};
use crate::config::CompilerConfig;
use crate::error::GenerationError;
use crate::loader::ScopeRegistry;
use crate::model::{ClassId, ScopeResolver, TypeModel};
use crate::runtime::GeneratedDispatcher;
use crate::trace::{DebugSink, FileDebugSink};

/// Suffix joining a type name and class id in unit names
const UNIT_SUFFIX: &str = "$FastAccessor#";

/// Canonical unit name for a type: `"{type name}$FastAccessor#{class id}"`
pub fn unit_name(type_name: &str, class: ClassId) -> String {
    format!("{}{}{}", type_name, UNIT_SUFFIX, class.as_u32())
}

/// Generates, installs and hands out accessors
pub struct AccessorCompiler {
    model: Arc<dyn TypeModel>,
    scopes: Arc<dyn ScopeResolver>,
    registry: Arc<ScopeRegistry>,
    config: CompilerConfig,
    sink: Option<Arc<dyn DebugSink>>,
    generated: AtomicUsize,
}

impl AccessorCompiler {
    /// Compiler over the process-wide scope registry with default settings
    pub fn new(model: Arc<dyn TypeModel>, scopes: Arc<dyn ScopeResolver>) -> Self {
        Self {
            model,
            scopes,
            registry: ScopeRegistry::global(),
            config: CompilerConfig::default(),
            sink: None,
            generated: AtomicUsize::new(0),
        }
    }

    /// Replace the settings
    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Persist generated images through `sink` while tracing is enabled.
    /// Without one, tracing writes to `trace_dir` if set.
    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Use a private registry instead of the process-wide one
    pub fn with_registry(mut self, registry: Arc<ScopeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Current settings
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Registry hosting installed units
    pub fn registry(&self) -> &Arc<ScopeRegistry> {
        &self.registry
    }

    /// Number of images this compiler has built and installed
    pub fn generated_count(&self) -> usize {
        self.generated.load(Ordering::Relaxed)
    }

    /// Accessor for `class`, generating it on first request in its scope
    pub fn generate_accessor(&self, class: ClassId) -> Result<Arc<dyn Accessor>, GenerationError> {
        let dispatcher: Arc<dyn Accessor> = self.generate_dispatcher(class)?;
        Ok(dispatcher)
    }

    /// Same as [`generate_accessor`](Self::generate_accessor), keeping the
    /// concrete dispatcher type
    pub fn generate_dispatcher(&self, class: ClassId) -> Result<Arc<GeneratedDispatcher>, GenerationError> {
        let type_name = self
            .model
            .type_name(class)
            .ok_or(GenerationError::UnknownType(class))?;
        let name = unit_name(&type_name, class);
        let context = self.registry.resolve_class(self.scopes.as_ref(), class);

        let unit = {
            let _definitions = context.lock_definitions();
            match context.find_unit(&name) {
                Some(unit) => {
                    tracing::trace!(unit = %name, context = context.id(), "accessor cache hit");
                    unit
                }
                None => {
                    let desc = self
                        .model
                        .describe(class)
                        .ok_or(GenerationError::UnknownType(class))?;
                    let image = build_dispatcher(&desc)?;
                    if self.config.trace_enabled {
                        self.persist(&name, &image);
                    }
                    let unit = context.define_unit(&name, image)?;
                    self.generated.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        unit = %name,
                        context = context.id(),
                        members = desc.member_count(),
                        "generated accessor"
                    );
                    unit
                }
            }
        };

        let dispatcher = GeneratedDispatcher::instantiate(unit, Arc::clone(&self.model))?;
        Ok(Arc::new(dispatcher))
    }

    fn persist(&self, name: &str, image: &DispatcherImage) {
        let result = match (&self.sink, &self.config.trace_dir) {
            (Some(sink), _) => sink.persist(name, image),
            (None, Some(dir)) => FileDebugSink::new(dir).persist(name, image),
            (None, None) => {
                tracing::warn!(unit = name, "tracing enabled without a debug sink or trace_dir");
                return;
            }
        };
        if let Err(err) = result {
            tracing::warn!(unit = name, error = %err, "failed to persist generated accessor");
        }
    }
}

impl fmt::Debug for AccessorCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorCompiler")
            .field("config", &self.config)
            .field("generated", &self.generated_count())
            .finish()
    }
}
