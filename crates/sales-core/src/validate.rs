//! Payload validation backed by the `validator` derive.

use validator::{Validate, ValidationErrors};

use crate::errors::{AppError, FieldError, FieldErrors};

/// Validates `value`, turning any failures into [`AppError::Fields`].
pub fn check<T: Validate>(value: &T) -> Result<(), AppError> {
    value
        .validate()
        .map_err(|errs| AppError::Fields(FieldErrors::from(errs)))
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errs: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errs
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();
                errors.iter().map(move |e| FieldError {
                    field: field.clone(),
                    error: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();

        // field_errors() is backed by a HashMap
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        fields.into_iter().collect()
    }
}
