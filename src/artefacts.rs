//! Controller artefact generations.
//!
//! A generation is one registry plus the resolver (and cache) built over it.
//! Reinitializing swaps in a whole new generation; lookups already running
//! keep the resolver they started with, and no cache is ever consulted
//! against a registry it was not built for.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::ResolverConfig;
use crate::controller::{ControllerDescriptor, ControllerRegistry};
use crate::plugin::PluginManager;
use crate::resolver::{ControllerResolver, FeatureId};

/// Current controller generation, shared by request handlers.
pub struct ControllerArtefacts {
    current: RwLock<Arc<ControllerResolver>>,
    generation: AtomicU64,
    config: ResolverConfig,
}

impl ControllerArtefacts {
    /// Start at generation 1 over `registry`.
    pub fn new(
        registry: ControllerRegistry,
        plugins: Option<Arc<dyn PluginManager>>,
        config: ResolverConfig,
    ) -> Self {
        let resolver = ControllerResolver::new(Arc::new(registry), plugins, config.clone());
        Self {
            current: RwLock::new(Arc::new(resolver)),
            generation: AtomicU64::new(1),
            config,
        }
    }

    /// The resolver of the current generation. Resolve through the returned
    /// handle; the lock is released before any lookup happens.
    pub fn current(&self) -> Arc<ControllerResolver> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve(&self, feature: &FeatureId) -> Option<Arc<ControllerDescriptor>> {
        self.current().resolve(feature)
    }

    pub fn resolve_uri(&self, uri: &str) -> Option<Arc<ControllerDescriptor>> {
        self.current().resolve_uri(uri)
    }

    /// Replace the registry. The new generation starts with an empty cache
    /// and keeps the resolver configuration. Returns the new generation number.
    pub fn reinitialize(
        &self,
        registry: ControllerRegistry,
        plugins: Option<Arc<dyn PluginManager>>,
    ) -> u64 {
        let controllers = registry.len();
        let resolver = Arc::new(ControllerResolver::new(
            Arc::new(registry),
            plugins,
            self.config.clone(),
        ));

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = resolver;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        drop(current);

        tracing::info!(generation, controllers, "controller artefacts reinitialized");
        generation
    }
}

impl std::fmt::Debug for ControllerArtefacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerArtefacts")
            .field("generation", &self.generation())
            .field("config", &self.config)
            .finish()
    }
}
