//! Validation capability for domain types.
//!
//! A type becomes validateable by implementing [`PropertyAccess`] and
//! [`Validateable`], holding a [`ValidationApi`] that every method delegates to:
//!
//! ```ignore
//! struct Signup { email: Option<String>, api: ValidationApi }
//!
//! impl PropertyAccess for Signup {
//!     fn property_names(&self) -> Vec<String> { vec!["email".into()] }
//!     fn property(&self, name: &str) -> Option<Value> {
//!         (name == "email").then(|| json!(self.email))
//!     }
//! }
//!
//! impl Validateable for Signup {
//!     fn validation_api(&self) -> &ValidationApi { &self.api }
//! }
//!
//! if !signup.validate() {
//!     for error in signup.errors().all() { /* ... */ }
//! }
//! ```
//!
//! Constraints come from an injected [`ConstraintsEvaluator`] and are computed
//! once per class; checking them is up to an injected [`ValidationSupport`].

pub mod api;
pub mod constraints;
pub mod errors;
pub mod rules;

use std::sync::Arc;

use serde_json::Value;

pub use api::{ValidationApi, ValidationContext};
pub use constraints::{
    ConstrainedProperty, ConstraintMap, ConstraintsEvaluator, StaticConstraintsEvaluator,
};
pub use errors::{FieldError, ValidationErrors};
pub use rules::{RuleValidationSupport, ValidationSupport};

/// Read access to an object's properties by name.
pub trait PropertyAccess {
    /// Every property that takes part in validation.
    fn property_names(&self) -> Vec<String>;

    /// Current value of a property. `None` for an unknown or unset property.
    fn property(&self, name: &str) -> Option<Value>;
}

/// An object with constraints, `validate()` and per-instance errors.
pub trait Validateable: PropertyAccess + Sized {
    fn validation_api(&self) -> &ValidationApi;

    /// Key under which constraints are cached. Defaults to the type's name.
    fn class_name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn constraints(&self) -> Arc<ConstraintMap> {
        self.validation_api().constraints(self.class_name(), self)
    }

    /// Validate every constrained property.
    fn validate(&self) -> bool {
        self.validation_api().validate(self.class_name(), self, None)
    }

    /// Validate only `fields`; errors of other fields are kept.
    fn validate_fields(&self, fields: &[&str]) -> bool {
        self.validation_api()
            .validate(self.class_name(), self, Some(fields))
    }

    fn errors(&self) -> ValidationErrors {
        self.validation_api().errors(self.class_name())
    }

    fn set_errors(&self, errors: ValidationErrors) {
        self.validation_api().set_errors(errors);
    }

    fn has_errors(&self) -> bool {
        self.validation_api().has_errors()
    }

    fn clear_errors(&self) {
        self.validation_api().clear_errors();
    }
}

impl PropertyAccess for serde_json::Map<String, Value> {
    fn property_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}
