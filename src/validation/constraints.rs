//! Constraint definitions and the evaluator that produces them per type.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property name to its constraints, in declaration order.
pub type ConstraintMap = IndexMap<String, ConstrainedProperty>;

/// The constraints declared for a single property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConstrainedProperty {
    pub property: String,
    pub nullable: bool,
    pub blank: bool,
    pub min_size: Option<usize>,
    pub max_size: Option<usize>,
    pub matches: Option<String>, // regex pattern
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub in_list: Option<Vec<Value>>,
}

impl Default for ConstrainedProperty {
    fn default() -> Self {
        Self {
            property: String::new(),
            nullable: false,
            blank: true,
            min_size: None,
            max_size: None,
            matches: None,
            min: None,
            max: None,
            in_list: None,
        }
    }
}

impl ConstrainedProperty {
    /// An explicitly constrained property: required, blank strings allowed.
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            ..Default::default()
        }
    }

    /// What a property without any declared constraint gets.
    pub fn defaulted(property: impl Into<String>) -> Self {
        Self {
            nullable: true,
            ..Self::new(property)
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn blank(mut self, blank: bool) -> Self {
        self.blank = blank;
        self
    }

    pub fn size(mut self, min: usize, max: usize) -> Self {
        self.min_size = Some(min);
        self.max_size = Some(max);
        self
    }

    pub fn min_size(mut self, min: usize) -> Self {
        self.min_size = Some(min);
        self
    }

    pub fn max_size(mut self, max: usize) -> Self {
        self.max_size = Some(max);
        self
    }

    pub fn matches(mut self, pattern: impl Into<String>) -> Self {
        self.matches = Some(pattern.into());
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn in_list<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_list = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Derives the declared constraints of a type.
///
/// Only explicit declarations are returned; defaulting of undeclared
/// properties happens in [`super::ValidationContext`].
pub trait ConstraintsEvaluator: Send + Sync {
    fn evaluate(&self, class_name: &str) -> ConstraintMap;
}

/// Evaluator over constraints registered up front, keyed by class name.
#[derive(Debug, Clone, Default)]
pub struct StaticConstraintsEvaluator {
    classes: IndexMap<String, ConstraintMap>,
}

impl StaticConstraintsEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the constraints of one class, replacing earlier ones.
    pub fn with_class<I>(mut self, class_name: &str, constraints: I) -> Self
    where
        I: IntoIterator<Item = ConstrainedProperty>,
    {
        let map = constraints
            .into_iter()
            .map(|c| (c.property.clone(), c))
            .collect();
        self.classes.insert(class_name.to_string(), map);
        self
    }

    /// Load class constraints from JSON: `{"Class": [{"property": .., ..}, ..]}`.
    pub fn from_json(value: &Value) -> Result<Self, serde_json::Error> {
        let classes: IndexMap<String, Vec<ConstrainedProperty>> =
            serde_json::from_value(value.clone())?;
        Ok(classes
            .into_iter()
            .fold(Self::new(), |evaluator, (class_name, constraints)| {
                evaluator.with_class(&class_name, constraints)
            }))
    }
}

impl ConstraintsEvaluator for StaticConstraintsEvaluator {
    fn evaluate(&self, class_name: &str) -> ConstraintMap {
        self.classes.get(class_name).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_defaulted_is_nullable() {
        assert!(ConstrainedProperty::defaulted("bio").nullable);
        assert!(!ConstrainedProperty::new("name").nullable);
        assert!(ConstrainedProperty::new("name").blank);
    }

    #[test]
    fn test_static_evaluator() {
        let evaluator = StaticConstraintsEvaluator::new().with_class(
            "Signup",
            [
                ConstrainedProperty::new("email").matches("^[^@]+@[^@]+$"),
                ConstrainedProperty::new("age").min(18.0),
            ],
        );

        let constraints = evaluator.evaluate("Signup");
        let names: Vec<_> = constraints.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["email", "age"]);
        assert!(evaluator.evaluate("Unknown").is_empty());
    }

    #[test]
    fn test_from_json() {
        let evaluator = StaticConstraintsEvaluator::from_json(&json!({
            "Signup": [
                { "property": "plan", "inList": ["free", "pro"] },
                { "property": "nickname", "nullable": true, "maxSize": 12 }
            ]
        }))
        .unwrap();

        let constraints = evaluator.evaluate("Signup");
        assert_eq!(
            constraints["plan"].in_list,
            Some(vec![json!("free"), json!("pro")])
        );
        assert!(constraints["nickname"].nullable);
        assert_eq!(constraints["nickname"].max_size, Some(12));
        // Omitted fields take the explicit-constraint defaults
        assert!(!constraints["plan"].nullable);
        assert!(constraints["plan"].blank);
    }
}
