//! Installed dispatcher units

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::codegen::DispatcherImage;
use crate::error::GenerationError;
use crate::model::TypeModel;
use crate::runtime::Linkage;

/// Linkage of a unit against one type model
#[derive(Debug)]
struct ModelLinkage {
    model: Weak<dyn TypeModel>,
    linkage: Arc<Linkage>,
}

impl ModelLinkage {
    fn is_for(&self, model: &Arc<dyn TypeModel>) -> bool {
        // Data pointers only
        self.model.as_ptr() as *const () == Arc::as_ptr(model) as *const ()
    }
}

/// A verified image installed in a loading context under its canonical name.
///
/// The image is shared by every compiler that resolves the context, but
/// member handles belong to a type model. Linkage happens on first
/// instantiation per model and is shared by every later dispatcher created
/// from the unit with that model.
#[derive(Debug)]
pub struct LoadedUnit {
    name: String,
    context: u32,
    image: DispatcherImage,
    linkages: Mutex<Vec<ModelLinkage>>,
}

impl LoadedUnit {
    pub(crate) fn new(name: String, context: u32, image: DispatcherImage) -> Self {
        Self {
            name,
            context,
            image,
            linkages: Mutex::new(Vec::new()),
        }
    }

    /// Canonical unit name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the hosting loading context
    pub fn context_id(&self) -> u32 {
        self.context
    }

    /// Installed code
    pub fn image(&self) -> &DispatcherImage {
        &self.image
    }

    /// Whether the unit has been linked against any live model
    pub fn is_linked(&self) -> bool {
        self.linked_models() > 0
    }

    /// Number of live type models the unit is linked against
    pub fn linked_models(&self) -> usize {
        self.linkages
            .lock()
            .iter()
            .filter(|entry| entry.model.strong_count() > 0)
            .count()
    }

    /// Existing linkage for `model`, or the result of `link` stored for
    /// later calls with the same model. A failed link is not stored.
    pub(crate) fn linkage_for(
        &self,
        model: &Arc<dyn TypeModel>,
        link: impl FnOnce() -> Result<Linkage, GenerationError>,
    ) -> Result<Arc<Linkage>, GenerationError> {
        let mut linkages = self.linkages.lock();
        if let Some(entry) = linkages.iter().find(|entry| entry.is_for(model)) {
            return Ok(Arc::clone(&entry.linkage));
        }

        let linkage = Arc::new(link()?);
        linkages.retain(|entry| entry.model.strong_count() > 0);
        linkages.push(ModelLinkage {
            model: Arc::downgrade(model),
            linkage: Arc::clone(&linkage),
        });
        Ok(linkage)
    }
}
