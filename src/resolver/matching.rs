//! Deciding whether a controller answers a (uri, plugin, namespace) request.

use crate::controller::{ControllerDescriptor, UriMapping};
use crate::plugin::PluginManager;

/// Whether `controller` serves `uri` under the requested qualifiers.
///
/// Without qualifiers a URI match is enough. Once either qualifier is given,
/// the namespace must match exactly (absent only matches absent) and, when a
/// plugin is named, the controller must be owned by that plugin.
pub fn controller_matches(
    controller: &ControllerDescriptor,
    uri: &str,
    plugin_name: Option<&str>,
    controller_namespace: Option<&str>,
    plugins: Option<&dyn PluginManager>,
) -> bool {
    if !controller.maps_to_uri(uri) {
        return false;
    }
    if plugin_name.is_none() && controller_namespace.is_none() {
        return true;
    }

    namespace_matches(controller, controller_namespace)
        && plugin_matches(controller, plugin_name, plugins)
}

/// `None` matches only controllers without a namespace.
pub fn namespace_matches(controller: &ControllerDescriptor, controller_namespace: Option<&str>) -> bool {
    controller.namespace() == controller_namespace
}

/// True when no plugin is requested, or when the plugin manager reports the
/// requested plugin as the controller's owner. A missing manager or an
/// unowned class is a non-match, not an error.
pub fn plugin_matches(
    controller: &ControllerDescriptor,
    plugin_name: Option<&str>,
    plugins: Option<&dyn PluginManager>,
) -> bool {
    let Some(plugin_name) = plugin_name else {
        return true;
    };

    plugins
        .and_then(|manager| manager.plugin_for_class(controller.class_ref()))
        .map_or(false, |plugin| plugin.name() == plugin_name)
}
