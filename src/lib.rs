//! soli-dispatch: controller resolution and validation for Soli MVC applications.
//!
//! This is the library root that exports all modules.
//!
//! # Request dispatch
//!
//! Incoming URIs, optionally qualified by plugin and controller namespace, are
//! resolved to the registered controller that serves them. Application
//! controllers shadow plugin controllers for the same URI. Lookups are cached
//! (misses included) except in development, where controllers hot reload.
//!
//! # Validation
//!
//! Domain types opt into constraints, `validate()` and error tracking through
//! the [`validation::Validateable`] trait.

// Allow some clippy lints that are stylistic and not critical
#![allow(clippy::module_inception)]
#![allow(clippy::type_complexity)]
#![allow(clippy::new_without_default)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::unnecessary_lazy_evaluations)]
#![allow(clippy::unwrap_or_default)]

pub mod artefacts;
pub mod config;
pub mod controller;
pub mod error;
pub mod plugin;
pub mod reload;
pub mod resolver;
pub mod validation;

use std::path::Path;
use std::sync::Arc;

use artefacts::ControllerArtefacts;
use config::{Environment, FlatConfig, ResolverConfig};
use error::DispatchResult;
use plugin::PluginManager;
use reload::ControllerWatcher;

/// Load an application folder: configuration, plugins and controllers.
///
/// Returns the first artefact generation and a watcher already tracking every
/// controller source. Configuration errors fail here, never at lookup time.
pub fn load_artefacts(
    folder: &Path,
    environment: Environment,
) -> DispatchResult<(ControllerArtefacts, ControllerWatcher)> {
    let flat = FlatConfig::load(folder, &environment);
    let config = ResolverConfig::from_flat(&flat, environment)?;

    let app = controller::load_application(folder)?;
    let mut watcher = ControllerWatcher::new(folder);
    watcher.track_application(&app);

    let plugins: Arc<dyn PluginManager> = Arc::new(app.plugins);
    let artefacts = ControllerArtefacts::new(app.registry, Some(plugins), config);
    Ok((artefacts, watcher))
}
