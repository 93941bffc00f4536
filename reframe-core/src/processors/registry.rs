// ============================================================================
// reframe-core/src/processors/registry.rs
// ============================================================================
//
// PROCESSOR REGISTRY: Name -> Constructor Table and the Active Set
//
// Processors are registered under a name at startup. `load` resolves a name
// to a fully constructed processor or fails with UnknownProcessor, which the
// caller must treat as fatal: a misconfigured processor set never degrades
// into a partial one. The five-capability contract is the FrameProcessor
// trait, so a registered constructor cannot produce a processor that lacks
// one of them.
//
// The active set is seeded from the requested names the first time it is
// asked for and then reconciled against the toggle store on every call.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::color_invert::{self, ColorInvert};
use super::face_enhancer::{self, BackendLoader, FaceEnhancer};
use super::{FrameProcessor, ProcessorContext, ToggleStore};
use crate::error::{CoreError, CoreResult};

/// Constructor stored in the registry.
pub type ProcessorFactory =
    Box<dyn Fn(&ProcessorContext) -> CoreResult<Arc<dyn FrameProcessor>> + Send + Sync>;

/// Name-keyed processor table plus the currently active processors.
pub struct ProcessorRegistry {
    context: ProcessorContext,
    factories: BTreeMap<String, ProcessorFactory>,
    active: Mutex<Vec<Arc<dyn FrameProcessor>>>,
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("registered", &self.registered_names())
            .field("active", &self.active_names())
            .finish()
    }
}

impl ProcessorRegistry {
    /// Empty registry.
    pub fn new(context: ProcessorContext) -> Self {
        Self {
            context,
            factories: BTreeMap::new(),
            active: Mutex::new(Vec::new()),
        }
    }

    /// Registry with the processors that need no external backend.
    pub fn builtin(context: ProcessorContext) -> Self {
        let mut registry = Self::new(context);
        registry.register(color_invert::NAME, |ctx| {
            Ok(Arc::new(ColorInvert::new(ctx.status.clone())) as Arc<dyn FrameProcessor>)
        });
        registry
    }

    /// Registers (or replaces) the constructor for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProcessorContext) -> CoreResult<Arc<dyn FrameProcessor>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Registers `face_enhancer`, backed by whatever `loader` produces.
    pub fn register_face_enhancer(&mut self, loader: BackendLoader) {
        self.register(face_enhancer::NAME, move |ctx| {
            let model_path = ctx.config.models_dir.join(face_enhancer::MODEL_FILE);
            Ok(Arc::new(FaceEnhancer::new(model_path, Arc::clone(&loader), ctx.status.clone()))
                as Arc<dyn FrameProcessor>)
        });
    }

    pub fn context(&self) -> &ProcessorContext {
        &self.context
    }

    pub fn registered_names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Resolves `name` to a new processor instance.
    pub fn load(&self, name: &str) -> CoreResult<Arc<dyn FrameProcessor>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            log::error!("Error loading frame processor {name}: not registered");
            CoreError::UnknownProcessor(name.to_string())
        })?;
        let processor = factory(&self.context)?;
        log::debug!("Loaded frame processor {name}");
        Ok(processor)
    }

    /// Returns the active processors after reconciling with `toggles`.
    ///
    /// The first call (or any call after the set became empty) loads
    /// `requested` in order. Then every toggle that is on and not yet
    /// active is loaded and appended, and every toggle that is off is
    /// removed if present.
    ///
    /// The new set is built aside and only stored once every load has
    /// succeeded; on error the previous set is left untouched.
    pub fn active_set(
        &self,
        requested: &[String],
        toggles: &ToggleStore,
    ) -> CoreResult<Vec<Arc<dyn FrameProcessor>>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = active.clone();

        if next.is_empty() {
            for name in requested {
                if !next.iter().any(|p| p.name() == name) {
                    next.push(self.load(name)?);
                }
            }
        }

        for (name, enabled) in toggles.snapshot() {
            let position = next.iter().position(|p| p.name() == name);
            match (enabled, position) {
                (true, None) => next.push(self.load(&name)?),
                (false, Some(index)) => {
                    next.remove(index);
                }
                _ => {}
            }
        }

        *active = next.clone();
        Ok(next)
    }

    /// Names of the currently active processors, in order.
    pub fn active_names(&self) -> Vec<String> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }
}
