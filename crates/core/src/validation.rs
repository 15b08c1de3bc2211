//! Field validation helpers shared by entity crates.
//!
//! Entities derive `validator::Validate`; this module supplies the checks the
//! derive does not cover and maps its report into [`DomainError`].

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors};

use crate::error::DomainError;

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some(Cow::Borrowed("must not be blank"));
        return Err(err);
    }
    Ok(())
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter()
                    .map(|e| match &e.message {
                        Some(msg) => format!("{field}: {msg}"),
                        None => format!("{field}: {}", e.code),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        // HashMap iteration order is unspecified.
        messages.sort();
        DomainError::Validation(messages.join("; "))
    }
}
