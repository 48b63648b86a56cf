//! Controller resolution: request URI (plus optional plugin and namespace) to
//! the controller that serves it.
//!
//! Lookups scan the registry from the most recently registered controller
//! backwards, so application controllers shadow plugin and framework ones
//! mapping the same URI. Results, including misses, are cached per
//! `namespace:plugin:uri` key in a bounded LRU cache, except in the
//! development environment where every lookup rescans so reloaded
//! controllers are seen immediately.
//!
//! A resolver is bound to one registry generation. Reloading controllers
//! means building a new resolver (see [`crate::artefacts`]).

pub mod cache;
pub mod feature;
pub mod key;
pub mod matching;

use std::sync::Arc;

use serde::Serialize;

use crate::config::{Environment, FlatConfig, ResolverConfig};
use crate::controller::{ControllerDescriptor, ControllerSource};
use crate::error::{ConfigError, DispatchError};
use crate::plugin::PluginManager;

pub use cache::{Resolution, ResolutionCache};
pub use feature::FeatureId;
pub use key::LookupKey;
pub use matching::controller_matches;

/// Snapshot of the resolution cache for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
    pub capacity: usize,
}

/// Resolves lookup requests against one registry generation.
pub struct ControllerResolver {
    source: Arc<dyn ControllerSource>,
    plugins: Option<Arc<dyn PluginManager>>,
    cache: Option<ResolutionCache>,
    config: ResolverConfig,
}

/// Builder wiring a resolver to its collaborators.
pub struct ResolverBuilder {
    source: Arc<dyn ControllerSource>,
    plugins: Option<Arc<dyn PluginManager>>,
    config: ResolverConfig,
}

impl ResolverBuilder {
    pub fn new(source: Arc<dyn ControllerSource>) -> Self {
        Self {
            source,
            plugins: None,
            config: ResolverConfig::default(),
        }
    }

    pub fn plugin_manager(mut self, plugins: Arc<dyn PluginManager>) -> Self {
        self.plugins = Some(plugins);
        self
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Read resolver settings from a flat config. Fails on a bad cache size.
    pub fn flat_config(
        mut self,
        config: &FlatConfig,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        self.config = ResolverConfig::from_flat(config, environment)?;
        Ok(self)
    }

    pub fn build(self) -> ControllerResolver {
        ControllerResolver::new(self.source, self.plugins, self.config)
    }
}

impl ControllerResolver {
    pub fn new(
        source: Arc<dyn ControllerSource>,
        plugins: Option<Arc<dyn PluginManager>>,
        config: ResolverConfig,
    ) -> Self {
        // Development never caches; there is no cache to consult at all.
        let cache = config
            .caching_enabled()
            .then(|| ResolutionCache::new(config.cache_max_size));

        tracing::info!(
            environment = %config.environment,
            caching = cache.is_some(),
            cache_max_size = config.cache_max_size.get(),
            "controller resolver initialized"
        );

        Self {
            source,
            plugins,
            cache,
            config,
        }
    }

    pub fn builder(source: Arc<dyn ControllerSource>) -> ResolverBuilder {
        ResolverBuilder::new(source)
    }

    /// Resolve a bare URI.
    pub fn resolve_uri(&self, uri: &str) -> Option<Arc<ControllerDescriptor>> {
        self.resolve_qualified(uri, None, None)
    }

    /// Resolve a feature id.
    pub fn resolve(&self, feature: &FeatureId) -> Option<Arc<ControllerDescriptor>> {
        self.resolve_qualified(
            feature.uri(),
            feature.plugin_name(),
            feature.controller_namespace(),
        )
    }

    /// Resolve a raw feature value: a URI string or a `{"uri", "pluginName",
    /// "controllerNamespace"}` object. Malformed values are an error, not a miss.
    pub fn try_resolve_json(
        &self,
        feature: &serde_json::Value,
    ) -> Result<Option<Arc<ControllerDescriptor>>, DispatchError> {
        let feature = FeatureId::from_json(feature)?;
        Ok(self.resolve(&feature))
    }

    /// Resolve a URI under optional plugin and namespace qualifiers.
    pub fn resolve_qualified(
        &self,
        uri: &str,
        plugin_name: Option<&str>,
        controller_namespace: Option<&str>,
    ) -> Option<Arc<ControllerDescriptor>> {
        // Nothing registered yet: a miss that must not be remembered
        if !self.source.is_initialized() {
            return None;
        }

        let key = LookupKey::new(uri, plugin_name, controller_namespace);
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            return cached.into_option();
        }

        tracing::debug!(key = %key, "controller cache miss, scanning registry");
        let found = self
            .source
            .controllers()
            .iter()
            .rev()
            .find(|controller| {
                controller_matches(
                    controller,
                    uri,
                    plugin_name,
                    controller_namespace,
                    self.plugins.as_deref(),
                )
            })
            .cloned();

        if let Some(cache) = &self.cache {
            cache.put(key, Resolution::from_option(found.clone()));
        }
        found
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn ControllerSource> {
        &self.source
    }

    pub fn plugin_manager(&self) -> Option<&Arc<dyn PluginManager>> {
        self.plugins.as_ref()
    }

    pub fn cache_stats(&self) -> CacheStats {
        match &self.cache {
            Some(cache) => CacheStats {
                enabled: true,
                entries: cache.len(),
                capacity: cache.capacity(),
            },
            None => CacheStats {
                enabled: false,
                entries: 0,
                capacity: 0,
            },
        }
    }
}

impl std::fmt::Debug for ControllerResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerResolver")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("has_plugin_manager", &self.plugins.is_some())
            .finish()
    }
}
