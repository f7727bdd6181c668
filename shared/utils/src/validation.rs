use crate::error::{BatterwayError, BatterwayResult};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

pub fn validate_model<T: Validate>(model: &T) -> BatterwayResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(BatterwayError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match (&error.message, &error.code) {
                (Some(message), _) => format!("{}: {}", field, message),
                (None, std::borrow::Cow::Borrowed("length")) => {
                    format!("Length validation failed for field '{}'", field)
                }
                (None, std::borrow::Cow::Borrowed("range")) => {
                    format!("Value out of range for field '{}'", field)
                }
                (None, code) => format!("Validation failed for field '{}': {}", field, code),
            };
            messages.push(message);
        }
    }

    messages.sort();
    messages.join(", ")
}

/// A fixed input quantity must be a finite, non-negative number.
pub fn validate_fixed_quantity(product: &str, value: f64) -> BatterwayResult<()> {
    if !value.is_finite() {
        return Err(BatterwayError::validation(
            "fixed_inputs",
            format!("Quantity of '{}' is not a finite number", product),
        ));
    }
    if value < 0.0 {
        return Err(BatterwayError::validation(
            "fixed_inputs",
            format!("Quantity of '{}' must not be negative, got {}", product, value),
        ));
    }
    Ok(())
}

pub fn validate_fixed_quantities(fixed: &BTreeMap<String, f64>) -> BatterwayResult<()> {
    for (product, value) in fixed {
        validate_fixed_quantity(product, *value)?;
    }
    Ok(())
}
