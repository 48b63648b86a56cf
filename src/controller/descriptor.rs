//! Controller metadata and URI mapping.
//!
//! Routes follow the framework's conventions, derived from the controller's
//! class name and its public actions:
//! - `PostsController` maps to `/posts` and anything below it (`/posts/**`)
//! - each action maps to `/posts/<action>` and `/posts/<action>/**`
//! - `HomeController` additionally maps the root `/`

/// Suffix marking a pattern that also accepts deeper paths.
const WILDCARD_SUFFIX: &str = "/**";

/// URI-mapping capability of a registered controller.
pub trait UriMapping {
    /// Whether a request path belongs to this controller.
    fn maps_to_uri(&self, uri: &str) -> bool;
}

/// Metadata for one registered controller type. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerDescriptor {
    class_name: String,   // "BlogPostsController"
    class_ref: String,    // "plugins.blog.BlogPostsController"
    logical_name: String, // "blog_posts"
    namespace: Option<String>,
    actions: Vec<String>,
    uri_patterns: Vec<String>,
}

impl ControllerDescriptor {
    /// Create a descriptor with the conventional URI patterns and no actions.
    pub fn new(class_name: &str) -> Self {
        let logical_name = to_logical_name(class_name);
        let base = controller_base_path(&logical_name);
        let mut uri_patterns = vec![base.clone(), format!("{}{}", base, WILDCARD_SUFFIX)];
        if logical_name == "home" {
            uri_patterns.push("/".to_string());
        }

        Self {
            class_name: class_name.to_string(),
            class_ref: class_name.to_string(),
            logical_name,
            namespace: None,
            actions: Vec::new(),
            uri_patterns,
        }
    }

    /// Qualify the class reference with the package it was loaded from, so that
    /// same-named classes from different origins stay distinct.
    pub fn with_package(mut self, package: &str) -> Self {
        self.class_ref = if package.is_empty() {
            self.class_name.clone()
        } else {
            format!("{}.{}", package, self.class_name)
        };
        self
    }

    /// Set the controller namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Register a public action and its URI patterns.
    pub fn with_action(mut self, action: &str) -> Self {
        if self.actions.iter().any(|a| a == action) {
            return self;
        }
        let base = controller_base_path(&self.logical_name);
        let action_path = format!("{}/{}", base.trim_end_matches('/'), action);
        self.uri_patterns
            .push(format!("{}{}", action_path, WILDCARD_SUFFIX));
        self.uri_patterns.push(action_path);
        self.actions.push(action.to_string());
        self
    }

    pub fn with_actions<I, S>(self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        actions
            .into_iter()
            .fold(self, |descriptor, action| descriptor.with_action(action.as_ref()))
    }

    /// Add an explicit URI pattern beyond the conventional ones.
    pub fn with_uri(mut self, pattern: impl Into<String>) -> Self {
        self.uri_patterns.push(pattern.into());
        self
    }

    /// The class reference, e.g. `PostsController`.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The package-qualified class reference used for plugin ownership lookups.
    pub fn class_ref(&self) -> &str {
        &self.class_ref
    }

    /// The logical name used in URIs, e.g. `posts`.
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn uri_patterns(&self) -> &[String] {
        &self.uri_patterns
    }
}

impl UriMapping for ControllerDescriptor {
    fn maps_to_uri(&self, uri: &str) -> bool {
        self.uri_patterns
            .iter()
            .any(|pattern| pattern_matches(pattern, uri))
    }
}

/// Match a single pattern. `/a/**` accepts `/a/x` and `/a/x/y`, but not `/a` or `/a/`.
fn pattern_matches(pattern: &str, uri: &str) -> bool {
    match pattern.strip_suffix(WILDCARD_SUFFIX) {
        Some(prefix) => uri
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .map_or(false, |rest| !rest.is_empty()),
        None => pattern == uri,
    }
}

/// Get the base path for a controller's logical name (`posts` → `/posts`).
pub fn controller_base_path(logical_name: &str) -> String {
    format!("/{}", logical_name)
}

/// Convert "BlogPostsController" to "blog_posts"
pub fn to_logical_name(class_name: &str) -> String {
    let stem = class_name.strip_suffix("Controller").unwrap_or(class_name);

    let mut result = String::new();
    for (i, c) in stem.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            result.push('_');
        }
        result.push(c.to_ascii_lowercase());
    }
    result
}
