//! Cache keys for controller lookups.

use std::fmt;

/// Separator between the parts of a [`LookupKey`].
pub const KEY_SEPARATOR: char = ':';

/// `namespace:plugin:uri`, with absent qualifiers as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    pub fn new(uri: &str, plugin_name: Option<&str>, controller_namespace: Option<&str>) -> Self {
        let namespace = controller_namespace.unwrap_or_default();
        let plugin = plugin_name.unwrap_or_default();

        let mut key = String::with_capacity(namespace.len() + plugin.len() + uri.len() + 2);
        key.push_str(namespace);
        key.push(KEY_SEPARATOR);
        key.push_str(plugin);
        key.push(KEY_SEPARATOR);
        key.push_str(uri);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(LookupKey::new("/a", None, None).as_str(), "::/a");
        assert_eq!(LookupKey::new("/a", Some("blog"), None).as_str(), ":blog:/a");
        assert_eq!(
            LookupKey::new("/a", Some("blog"), Some("admin")).to_string(),
            "admin:blog:/a"
        );
    }

    #[test]
    fn test_keys_compare_by_value() {
        assert_eq!(
            LookupKey::new("/a", None, Some("admin")),
            LookupKey::new("/a", None, Some("admin"))
        );
        assert_ne!(
            LookupKey::new("/a", None, Some("admin")),
            LookupKey::new("/a", Some("admin"), None)
        );
    }
}
