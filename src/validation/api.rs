//! The shared validation implementation a `Validateable` type delegates to.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use super::constraints::{ConstrainedProperty, ConstraintMap, ConstraintsEvaluator};
use super::errors::ValidationErrors;
use super::rules::{RuleValidationSupport, ValidationSupport};
use super::PropertyAccess;

/// Collaborators shared by every validateable instance, plus the per-class
/// constraint cache.
pub struct ValidationContext {
    evaluator: Arc<dyn ConstraintsEvaluator>,
    support: Arc<dyn ValidationSupport>,
    constraints: RwLock<HashMap<String, Arc<ConstraintMap>>>,
}

impl ValidationContext {
    pub fn new(
        evaluator: Arc<dyn ConstraintsEvaluator>,
        support: Arc<dyn ValidationSupport>,
    ) -> Self {
        Self {
            evaluator,
            support,
            constraints: RwLock::new(HashMap::new()),
        }
    }

    /// Context running the built-in rules.
    pub fn with_rules(evaluator: Arc<dyn ConstraintsEvaluator>) -> Self {
        Self::new(evaluator, Arc::new(RuleValidationSupport))
    }

    /// Constraints of `class_name`, evaluated on first use and shared after.
    /// Properties of `instance` without a declared constraint become nullable.
    pub fn constraints_for(
        &self,
        class_name: &str,
        instance: &dyn PropertyAccess,
    ) -> Arc<ConstraintMap> {
        {
            let cache = self.constraints.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(constraints) = cache.get(class_name) {
                return Arc::clone(constraints);
            }
        }

        let mut constraints = self.evaluator.evaluate(class_name);
        for property in instance.property_names() {
            if !constraints.contains_key(&property) {
                let defaulted = ConstrainedProperty::defaulted(property.as_str());
                constraints.insert(property, defaulted);
            }
        }
        tracing::debug!(
            class = class_name,
            properties = constraints.len(),
            "evaluated constraints"
        );

        // Racing first uses evaluate the same map; keep whichever landed first
        let mut cache = self.constraints.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            cache
                .entry(class_name.to_string())
                .or_insert_with(|| Arc::new(constraints)),
        )
    }

    pub fn support(&self) -> &dyn ValidationSupport {
        self.support.as_ref()
    }
}

impl std::fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.constraints.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ValidationContext")
            .field("classes", &cache.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Per-instance validation state: the shared context and this instance's errors.
///
/// Errors are created on first access and dropped again by
/// [`clear_errors`](Self::clear_errors).
pub struct ValidationApi {
    context: Arc<ValidationContext>,
    errors: Mutex<Option<ValidationErrors>>,
}

impl ValidationApi {
    pub fn new(context: Arc<ValidationContext>) -> Self {
        Self {
            context,
            errors: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &Arc<ValidationContext> {
        &self.context
    }

    fn lock(&self) -> MutexGuard<'_, Option<ValidationErrors>> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn constraints(&self, class_name: &str, instance: &dyn PropertyAccess) -> Arc<ConstraintMap> {
        self.context.constraints_for(class_name, instance)
    }

    /// Validate `fields`, or every constrained property when `None`.
    pub fn validate(
        &self,
        class_name: &str,
        instance: &dyn PropertyAccess,
        fields: Option<&[&str]>,
    ) -> bool {
        let constraints = self.constraints(class_name, instance);

        // Validate outside the lock; the instance may read its own errors
        let mut errors = self
            .lock()
            .take()
            .unwrap_or_else(|| ValidationErrors::new(class_name));
        let valid = self
            .context
            .support()
            .validate_instance(instance, &constraints, fields, &mut errors);
        *self.lock() = Some(errors);

        if !valid {
            tracing::debug!(class = class_name, "validation failed");
        }
        valid
    }

    /// This instance's errors, created empty on first access.
    pub fn errors(&self, class_name: &str) -> ValidationErrors {
        self.lock()
            .get_or_insert_with(|| ValidationErrors::new(class_name))
            .clone()
    }

    pub fn set_errors(&self, errors: ValidationErrors) {
        *self.lock() = Some(errors);
    }

    pub fn has_errors(&self) -> bool {
        self.lock().as_ref().map_or(false, ValidationErrors::has_errors)
    }

    pub fn clear_errors(&self) {
        *self.lock() = None;
    }
}

impl Clone for ValidationApi {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            errors: Mutex::new(self.lock().clone()),
        }
    }
}

impl std::fmt::Debug for ValidationApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationApi")
            .field("errors", &*self.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::constraints::StaticConstraintsEvaluator;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Profile {
        name: Option<String>,
        bio: Option<String>,
    }

    impl PropertyAccess for Profile {
        fn property_names(&self) -> Vec<String> {
            vec!["name".to_string(), "bio".to_string()]
        }

        fn property(&self, name: &str) -> Option<Value> {
            match name {
                "name" => self.name.as_ref().map(|v| json!(v)),
                "bio" => self.bio.as_ref().map(|v| json!(v)),
                _ => None,
            }
        }
    }

    struct CountingEvaluator {
        inner: StaticConstraintsEvaluator,
        calls: AtomicUsize,
    }

    impl ConstraintsEvaluator for CountingEvaluator {
        fn evaluate(&self, class_name: &str) -> ConstraintMap {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.evaluate(class_name)
        }
    }

    fn context() -> (Arc<CountingEvaluator>, Arc<ValidationContext>) {
        let evaluator = Arc::new(CountingEvaluator {
            inner: StaticConstraintsEvaluator::new()
                .with_class("Profile", [ConstrainedProperty::new("name").blank(false)]),
            calls: AtomicUsize::new(0),
        });
        let context = Arc::new(ValidationContext::with_rules(evaluator.clone()));
        (evaluator, context)
    }

    #[test]
    fn test_constraints_evaluated_once_per_class() {
        let (evaluator, context) = context();
        let a = ValidationApi::new(context.clone());
        let b = ValidationApi::new(context);
        let profile = Profile { name: None, bio: None };

        let first = a.constraints("Profile", &profile);
        let second = b.constraints("Profile", &profile);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);

        // Undeclared properties default to nullable
        assert!(first["bio"].nullable);
        assert!(!first["name"].nullable);
    }

    #[test]
    fn test_errors_lifecycle() {
        let (_, context) = context();
        let api = ValidationApi::new(context);
        assert!(!api.has_errors());
        assert!(!api.errors("Profile").has_errors());

        let profile = Profile { name: None, bio: None };
        assert!(!api.validate("Profile", &profile, None));
        assert!(api.has_errors());
        assert_eq!(api.errors("Profile").all()[0].code, "nullable");

        api.clear_errors();
        assert!(!api.has_errors());

        let mut manual = ValidationErrors::new("Profile");
        manual.reject_value("bio", "custom", "bio is off");
        api.set_errors(manual.clone());
        assert_eq!(api.errors("Profile"), manual);
    }
}
