//! The "feature" a controller is looked up by: a bare URI, or a URI qualified by
//! plugin and controller namespace.

use serde::Deserialize;

use crate::error::DispatchError;

/// Lookup request accepted by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureId {
    Uri(String),
    Qualified {
        uri: String,
        plugin_name: Option<String>,
        controller_namespace: Option<String>,
    },
}

/// Wire shape of a qualified feature: `{"uri": .., "pluginName": .., "controllerNamespace": ..}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QualifiedFeature {
    uri: String,
    #[serde(default)]
    plugin_name: Option<String>,
    #[serde(default)]
    controller_namespace: Option<String>,
}

impl FeatureId {
    pub fn qualified(
        uri: impl Into<String>,
        plugin_name: Option<&str>,
        controller_namespace: Option<&str>,
    ) -> Self {
        Self::Qualified {
            uri: uri.into(),
            plugin_name: plugin_name.map(str::to_string),
            controller_namespace: controller_namespace.map(str::to_string),
        }
    }

    /// Accept a JSON string or object. Objects must carry a string `uri`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, DispatchError> {
        match value {
            serde_json::Value::String(uri) => Ok(Self::Uri(uri.clone())),
            serde_json::Value::Object(_) => {
                let feature = QualifiedFeature::deserialize(value)
                    .map_err(|e| DispatchError::malformed_feature(e.to_string()))?;
                Ok(Self::Qualified {
                    uri: feature.uri,
                    plugin_name: feature.plugin_name,
                    controller_namespace: feature.controller_namespace,
                })
            }
            other => Err(DispatchError::malformed_feature(format!(
                "expected a URI string or an object with a 'uri' field, got {}",
                other
            ))),
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            Self::Uri(uri) => uri,
            Self::Qualified { uri, .. } => uri,
        }
    }

    pub fn plugin_name(&self) -> Option<&str> {
        match self {
            Self::Uri(_) => None,
            Self::Qualified { plugin_name, .. } => plugin_name.as_deref(),
        }
    }

    pub fn controller_namespace(&self) -> Option<&str> {
        match self {
            Self::Uri(_) => None,
            Self::Qualified {
                controller_namespace,
                ..
            } => controller_namespace.as_deref(),
        }
    }
}

impl From<&str> for FeatureId {
    fn from(uri: &str) -> Self {
        Self::Uri(uri.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(uri: String) -> Self {
        Self::Uri(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_plain_uri() {
        let feature = FeatureId::from_json(&json!("/posts")).unwrap();
        assert_eq!(feature, FeatureId::from("/posts"));
        assert_eq!(feature.plugin_name(), None);
        assert_eq!(feature.controller_namespace(), None);
    }

    #[test]
    fn test_qualified_record() {
        let feature = FeatureId::from_json(&json!({
            "uri": "/posts",
            "pluginName": "blog",
            "controllerNamespace": null
        }))
        .unwrap();
        assert_eq!(feature, FeatureId::qualified("/posts", Some("blog"), None));
        assert_eq!(feature.uri(), "/posts");
    }

    #[test]
    fn test_missing_uri_fails_fast() {
        let err = FeatureId::from_json(&json!({ "pluginName": "blog" })).unwrap_err();
        assert!(matches!(err, DispatchError::MalformedFeature(_)));
        assert!(err.to_string().contains("uri"));

        assert!(FeatureId::from_json(&json!({ "uri": 7 })).is_err());
        assert!(FeatureId::from_json(&json!(42)).is_err());
    }
}
