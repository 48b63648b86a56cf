//! Per-instance validation errors.

use serde::Serialize;

/// A rejected property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    /// Machine-readable code, e.g. `nullable` or `maxSize.exceeded`.
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors recorded against one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors {
    object_name: String,
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            errors: Vec::new(),
        }
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn reject(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn reject_value(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.reject(FieldError::new(field, code, message));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_field_errors(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn all(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn field_errors<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// Drop the errors of one field, keeping the others.
    pub fn clear_field(&mut self, field: &str) {
        self.errors.retain(|e| e.field != field);
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }
}
