//! Plugin ownership of controller classes.
//!
//! The resolver only needs one question answered: which plugin, if any, provides
//! a given controller class. Everything else about plugins lives elsewhere.

use std::collections::HashMap;

use indexmap::IndexMap;

/// A loaded plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    name: String,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Lookup of the plugin providing a controller class.
pub trait PluginManager: Send + Sync {
    /// The plugin owning `class_ref`, or `None` for application/framework classes.
    fn plugin_for_class(&self, class_ref: &str) -> Option<&PluginDescriptor>;
}

/// In-memory plugin manager filled while loading plugin directories.
#[derive(Debug, Clone, Default)]
pub struct DefaultPluginManager {
    plugins: IndexMap<String, PluginDescriptor>,
    owners: HashMap<String, String>, // class_ref -> plugin name
}

impl DefaultPluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin by name. Registering twice is a no-op.
    pub fn register_plugin(&mut self, name: &str) -> &PluginDescriptor {
        self.plugins
            .entry(name.to_string())
            .or_insert_with(|| PluginDescriptor::new(name))
    }

    /// Record that `plugin` provides `class_ref`, registering the plugin if needed.
    pub fn assign_class(&mut self, plugin: &str, class_ref: &str) {
        self.register_plugin(plugin);
        self.owners.insert(class_ref.to_string(), plugin.to_string());
    }

    /// Plugins in registration order.
    pub fn plugins(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.values()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl PluginManager for DefaultPluginManager {
    fn plugin_for_class(&self, class_ref: &str) -> Option<&PluginDescriptor> {
        self.owners
            .get(class_ref)
            .and_then(|name| self.plugins.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_for_class() {
        let mut manager = DefaultPluginManager::new();
        manager.assign_class("blog", "plugins.blog.PostsController");
        manager.register_plugin("blog");
        manager.register_plugin("auth");

        assert_eq!(manager.len(), 2);
        assert_eq!(
            manager
                .plugin_for_class("plugins.blog.PostsController")
                .map(|p| p.name()),
            Some("blog")
        );
        assert!(manager.plugin_for_class("app.PostsController").is_none());

        let names: Vec<_> = manager.plugins().map(|p| p.name()).collect();
        assert_eq!(names, vec!["blog", "auth"]);
    }
}
