//! Controller scanner.
//!
//! This module handles:
//! - Finding `*_controller.soli` files in a controllers directory
//! - Parsing controller files to extract class name, namespace and actions
//! - Loading a whole application: plugin controllers first, then the app's own

use std::path::{Path, PathBuf};

use super::descriptor::ControllerDescriptor;
use super::registry::ControllerRegistry;
use crate::error::LoadError;
use crate::plugin::DefaultPluginManager;

/// Extension of controller source files.
pub const CONTROLLER_EXTENSION: &str = "soli";

/// File stem suffix of controller source files.
const CONTROLLER_SUFFIX: &str = "_controller";

/// Controllers of the application itself, relative to the app folder.
pub const APP_CONTROLLERS_DIR: &str = "app/controllers";

/// Package of application controllers.
pub const APP_PACKAGE: &str = "app";

/// Installed plugins, one directory per plugin, relative to the app folder.
pub const PLUGINS_DIR: &str = "plugins";

/// Everything loaded from an application folder.
#[derive(Debug, Default)]
pub struct LoadedApplication {
    pub registry: ControllerRegistry,
    pub plugins: DefaultPluginManager,
    /// Every controller file that was read, for hot reload tracking.
    pub sources: Vec<PathBuf>,
}

/// Load plugin controllers, then application controllers, from `folder`.
///
/// Plugin controllers are registered before the application's so that an
/// application controller mapping the same URI takes priority.
pub fn load_application(folder: &Path) -> Result<LoadedApplication, LoadError> {
    load_application_into(folder, ControllerRegistry::new())
}

/// Like [`load_application`], on top of already registered (framework) controllers.
pub fn load_application_into(
    folder: &Path,
    registry: ControllerRegistry,
) -> Result<LoadedApplication, LoadError> {
    let mut app = LoadedApplication {
        registry,
        ..Default::default()
    };

    let plugins_dir = folder.join(PLUGINS_DIR);
    if plugins_dir.is_dir() {
        for plugin_dir in sorted_entries(&plugins_dir)? {
            if !plugin_dir.is_dir() {
                continue;
            }
            let Some(plugin_name) = plugin_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let plugin_name = plugin_name.to_string();
            app.plugins.register_plugin(&plugin_name);

            let package = format!("{}.{}", PLUGINS_DIR, plugin_name);
            let (descriptors, sources) = scan_controllers(&plugin_dir.join("controllers"))?;
            for descriptor in descriptors {
                let descriptor = descriptor.with_package(&package);
                app.plugins.assign_class(&plugin_name, descriptor.class_ref());
                app.registry.register(descriptor);
            }
            app.sources.extend(sources);
        }
    }

    let (descriptors, sources) = scan_controllers(&folder.join(APP_CONTROLLERS_DIR))?;
    for descriptor in descriptors {
        app.registry.register(descriptor.with_package(APP_PACKAGE));
    }
    app.sources.extend(sources);

    app.registry.mark_initialized();
    tracing::info!(
        folder = %folder.display(),
        controllers = app.registry.len(),
        plugins = app.plugins.len(),
        "controller artefacts loaded"
    );
    Ok(app)
}

/// Scan a controllers directory. Files that fail to parse are logged and skipped.
///
/// Returns the parsed descriptors and the paths of every controller file seen,
/// both in file-name order.
pub fn scan_controllers(
    controllers_dir: &Path,
) -> Result<(Vec<ControllerDescriptor>, Vec<PathBuf>), LoadError> {
    let mut descriptors = Vec::new();
    let files = controller_files(controllers_dir)?;

    for path in &files {
        let source = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        let file_stem = path.file_stem().and_then(|n| n.to_str()).unwrap_or_default();

        match parse_controller_source(&source, file_stem) {
            Ok(descriptor) => {
                tracing::debug!(
                    controller = descriptor.class_name(),
                    actions = ?descriptor.actions(),
                    "registered controller"
                );
                descriptors.push(descriptor);
            }
            Err(message) => {
                let err = LoadError::controller_parse(path, message);
                tracing::warn!("{}", err);
            }
        }
    }

    Ok((descriptors, files))
}

/// Every controller file an application folder would load, plugins first.
pub fn controller_sources(folder: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();

    let plugins_dir = folder.join(PLUGINS_DIR);
    if plugins_dir.is_dir() {
        for plugin_dir in sorted_entries(&plugins_dir)? {
            if plugin_dir.is_dir() {
                files.extend(controller_files(&plugin_dir.join("controllers"))?);
            }
        }
    }
    files.extend(controller_files(&folder.join(APP_CONTROLLERS_DIR))?);
    Ok(files)
}

/// List `*_controller.soli` files in a directory, sorted by name.
/// A missing directory has no controllers.
pub fn controller_files(controllers_dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !controllers_dir.is_dir() {
        return Ok(Vec::new());
    }

    Ok(sorted_entries(controllers_dir)?
        .into_iter()
        .filter(|path| is_controller_file(path))
        .collect())
}

/// Whether a path looks like a controller source file.
pub fn is_controller_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().map_or(false, |ext| ext == CONTROLLER_EXTENSION)
        && path
            .file_stem()
            .and_then(|n| n.to_str())
            .map_or(false, |stem| stem.ends_with(CONTROLLER_SUFFIX))
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))? {
        let entry = entry.map_err(|e| LoadError::io(dir, e))?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// Parse controller source and extract its metadata.
pub fn parse_controller_source(
    source: &str,
    file_stem: &str,
) -> Result<ControllerDescriptor, String> {
    // Fall back to the file name when the class declaration is missing
    let class_name = extract_class_name(source).unwrap_or_else(|| to_class_name(file_stem));
    if class_name.is_empty() {
        return Err("empty controller class name".to_string());
    }

    let mut descriptor = ControllerDescriptor::new(&class_name);

    if let Some(static_block) = extract_static_block(source)? {
        if let Some(namespace) = extract_quoted_value(static_block, "this.namespace") {
            descriptor = descriptor.with_namespace(namespace);
        }
    }

    Ok(descriptor.with_actions(extract_actions(source)))
}

/// Convert "blog_posts_controller" to "BlogPostsController"
fn to_class_name(file_stem: &str) -> String {
    let without_suffix = file_stem.strip_suffix(CONTROLLER_SUFFIX).unwrap_or(file_stem);

    let mut result = String::new();
    let mut capitalize = true;
    for c in without_suffix.chars() {
        if c == '_' {
            capitalize = true;
        } else if capitalize {
            result.push(c.to_ascii_uppercase());
            capitalize = false;
        } else {
            result.push(c);
        }
    }
    if !result.is_empty() {
        result.push_str("Controller");
    }
    result
}

/// Extract the class name from "class X extends Controller"
fn extract_class_name(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let after_class = line.trim().strip_prefix("class ")?;
        let end = after_class
            .find(|c: char| c.is_whitespace() || c == '{')
            .unwrap_or(after_class.len());
        let name = after_class[..end].trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Extract the body of the first `static { ... }` block.
fn extract_static_block(source: &str) -> Result<Option<&str>, String> {
    let mut search_from = 0;
    while let Some(offset) = source[search_from..].find("static") {
        let start = search_from + offset + "static".len();
        let rest = source[start..].trim_start();
        if rest.starts_with('{') {
            let open = source.len() - rest.len();
            let close = find_matching_brace(&source[open..])
                .ok_or_else(|| "unterminated static block".to_string())?;
            return Ok(Some(&source[open + 1..open + close]));
        }
        search_from = start;
    }
    Ok(None)
}

/// Extract a quoted string value like this.namespace = "value"
fn extract_quoted_value(source: &str, key: &str) -> Option<String> {
    let key_pattern = format!("{} = ", key);
    let pos = source.find(&key_pattern)?;
    let after = &source[pos + key_pattern.len()..];
    let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let end = after[1..].find(quote)?;
    Some(after[1..=end].to_string())
}

/// Find matching brace position (assumes starting at opening brace)
fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract public methods (actions): `fn name(...)` not starting with `_`.
fn extract_actions(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| extract_fn_name(line.trim()))
        .filter(|name| !name.starts_with('_'))
        .collect()
}

/// Extract function name from "fn name(req: Any) -> Any {"
fn extract_fn_name(line: &str) -> Option<String> {
    let after_fn = line.strip_prefix("fn ")?.trim_start();
    let name_end = after_fn.find('(')?;
    let name = after_fn[..name_end].trim();
    (!name.is_empty()).then(|| name.to_string())
}
