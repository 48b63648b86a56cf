//! Validation execution: checking property values against their constraints.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::constraints::{ConstrainedProperty, ConstraintMap};
use super::errors::ValidationErrors;
use super::PropertyAccess;

lazy_static! {
    /// Compiled `matches` patterns, shared by every validation.
    static ref PATTERN_CACHE: RwLock<HashMap<String, Regex>> = RwLock::new(HashMap::new());
}

/// Runs constraints against an instance and records what fails.
pub trait ValidationSupport: Send + Sync {
    /// Validate `fields` (all constrained properties when `None`), replacing
    /// the previous errors of exactly those fields. Returns whether `errors`
    /// is empty afterwards.
    fn validate_instance(
        &self,
        instance: &dyn PropertyAccess,
        constraints: &ConstraintMap,
        fields: Option<&[&str]>,
        errors: &mut ValidationErrors,
    ) -> bool;
}

/// Built-in rules: nullable, blank, size, matches, range and inList.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidationSupport;

impl ValidationSupport for RuleValidationSupport {
    fn validate_instance(
        &self,
        instance: &dyn PropertyAccess,
        constraints: &ConstraintMap,
        fields: Option<&[&str]>,
        errors: &mut ValidationErrors,
    ) -> bool {
        let selected = constraints
            .values()
            .filter(|c| fields.map_or(true, |fields| fields.contains(&c.property.as_str())));

        for constraint in selected {
            errors.clear_field(&constraint.property);
            let value = instance.property(&constraint.property);
            check_property(constraint, value.as_ref(), errors);
        }

        !errors.has_errors()
    }
}

/// Apply one property's constraints. A missing value only answers to `nullable`.
pub fn check_property(
    constraint: &ConstrainedProperty,
    value: Option<&Value>,
    errors: &mut ValidationErrors,
) {
    let field = constraint.property.as_str();

    let value = match value {
        None | Some(Value::Null) => {
            if !constraint.nullable {
                errors.reject_value(field, "nullable", format!("{} cannot be null", field));
            }
            return;
        }
        Some(value) => value,
    };

    // Blank validation
    if let Value::String(s) = value {
        if !constraint.blank && s.trim().is_empty() {
            errors.reject_value(field, "blank", format!("{} cannot be blank", field));
            return;
        }
    }

    // Size validation (characters for strings, elements for lists)
    let size = match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    };
    if let Some(size) = size {
        if let Some(min_size) = constraint.min_size {
            if size < min_size {
                errors.reject_value(
                    field,
                    "minSize.notmet",
                    format!("{} is too short (minimum is {})", field, min_size),
                );
            }
        }
        if let Some(max_size) = constraint.max_size {
            if size > max_size {
                errors.reject_value(
                    field,
                    "maxSize.exceeded",
                    format!("{} is too long (maximum is {})", field, max_size),
                );
            }
        }
    }

    // Format validation (regex)
    if let (Some(pattern), Value::String(s)) = (&constraint.matches, value) {
        match pattern_matches(pattern, s) {
            Some(true) => {}
            Some(false) => {
                errors.reject_value(field, "matches.invalid", format!("{} is invalid", field))
            }
            None => tracing::warn!(field, pattern = %pattern, "skipping invalid matches pattern"),
        }
    }

    // Range validation
    if let Some(n) = value.as_f64() {
        if let Some(min) = constraint.min {
            if n < min {
                errors.reject_value(
                    field,
                    "min.notmet",
                    format!("{} must be greater than or equal to {}", field, min),
                );
            }
        }
        if let Some(max) = constraint.max {
            if n > max {
                errors.reject_value(
                    field,
                    "max.exceeded",
                    format!("{} must be less than or equal to {}", field, max),
                );
            }
        }
    }

    if let Some(allowed) = &constraint.in_list {
        if !allowed.contains(value) {
            errors.reject_value(
                field,
                "not.inList",
                format!("{} is not one of the allowed values", field),
            );
        }
    }
}

/// `None` when the pattern does not compile.
fn pattern_matches(pattern: &str, value: &str) -> Option<bool> {
    {
        let cache = PATTERN_CACHE.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(re) = cache.get(pattern) {
            return Some(re.is_match(value));
        }
    }

    let re = Regex::new(pattern).ok()?;
    let matched = re.is_match(value);
    PATTERN_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(pattern.to_string(), re);
    Some(matched)
}
