//! Loading contexts

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use rustc_hash::FxHashMap;

use crate::codegen::DispatcherImage;
use crate::error::GenerationError;
use crate::model::ScopeId;

use super::unit::LoadedUnit;

/// Global counter for context IDs
static NEXT_CONTEXT_ID: AtomicU32 = AtomicU32::new(0);

/// Generate a unique context ID
fn generate_context_id() -> u32 {
    NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Isolated installation space for generated units, parented to one scope.
///
/// Units are only ever added; a context lives as long as its registry.
#[derive(Debug)]
pub struct LoadingContext {
    id: u32,
    parent: ScopeId,
    units: RwLock<FxHashMap<String, Arc<LoadedUnit>>>,
    /// Serializes generation for types hosted in this context
    definitions: Mutex<()>,
}

impl LoadingContext {
    /// Create an empty context parented to `parent`
    pub fn new(parent: ScopeId) -> Self {
        Self {
            id: generate_context_id(),
            parent,
            units: RwLock::new(FxHashMap::default()),
            definitions: Mutex::new(()),
        }
    }

    /// Unique context id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Scope this context is parented to
    pub fn parent(&self) -> ScopeId {
        self.parent
    }

    /// Look up an installed unit by canonical name
    pub fn find_unit(&self, name: &str) -> Option<Arc<LoadedUnit>> {
        self.units.read().get(name).cloned()
    }

    /// Verify and install an image under `name`.
    ///
    /// First writer wins: installing a name twice fails with
    /// [`GenerationError::DuplicateDefinition`] and leaves the existing unit
    /// untouched.
    pub fn define_unit(
        &self,
        name: &str,
        image: DispatcherImage,
    ) -> Result<Arc<LoadedUnit>, GenerationError> {
        image.verify().map_err(|reason| GenerationError::MalformedImage {
            unit: name.to_string(),
            reason,
        })?;

        let mut units = self.units.write();
        if units.contains_key(name) {
            return Err(GenerationError::DuplicateDefinition {
                unit: name.to_string(),
                context: self.id,
            });
        }

        let unit = Arc::new(LoadedUnit::new(name.to_string(), self.id, image));
        units.insert(name.to_string(), Arc::clone(&unit));
        tracing::debug!(unit = name, context = self.id, "installed accessor unit");
        Ok(unit)
    }

    /// Hold the generation lock of this context
    pub fn lock_definitions(&self) -> MutexGuard<'_, ()> {
        self.definitions.lock()
    }

    /// Number of installed units
    pub fn unit_count(&self) -> usize {
        self.units.read().len()
    }
}
