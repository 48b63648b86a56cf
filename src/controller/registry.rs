//! Controller registry.
//!
//! Descriptors are kept in registration order. Registration order is priority
//! order: framework controllers first, then plugins, then the application, so
//! the last registered controller for a URI is the one that wins.

use std::borrow::Cow;
use std::sync::Arc;

use super::descriptor::ControllerDescriptor;

/// Read access to registered controllers, as consumed by the resolver.
pub trait ControllerSource: Send + Sync {
    /// False until artefacts have been registered.
    fn is_initialized(&self) -> bool;

    /// All descriptors in registration order (lowest priority first).
    fn controllers(&self) -> Cow<'_, [Arc<ControllerDescriptor>]>;
}

/// Ordered store of controller descriptors for one artefact generation.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: Vec<Arc<ControllerDescriptor>>,
    initialized: bool,
}

impl ControllerRegistry {
    /// Create a new, uninitialized registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller. Later registrations take priority.
    pub fn register(&mut self, descriptor: ControllerDescriptor) -> Arc<ControllerDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.controllers.push(Arc::clone(&descriptor));
        self.initialized = true;
        descriptor
    }

    /// Mark the registry as initialized even when no controller was found.
    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// Get the highest-priority controller with the given class name.
    pub fn get_by_class(&self, class_name: &str) -> Option<&Arc<ControllerDescriptor>> {
        self.controllers
            .iter()
            .rev()
            .find(|c| c.class_name() == class_name)
    }

    /// Get all controllers in registration order.
    pub fn all(&self) -> &[Arc<ControllerDescriptor>] {
        &self.controllers
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl ControllerSource for ControllerRegistry {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn controllers(&self) -> Cow<'_, [Arc<ControllerDescriptor>]> {
        Cow::Borrowed(&self.controllers)
    }
}
