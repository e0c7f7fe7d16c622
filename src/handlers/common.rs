use validator::ValidationErrors;

/// Flattens validator output into "field: message" strings for the
/// standard validation error envelope.
pub fn validation_messages(validation_errors: &ValidationErrors) -> Vec<String> {
    validation_errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            let field = field.to_string();
            errors.iter().map(move |error| {
                format!(
                    "{}: {}",
                    field,
                    error.message.as_ref().unwrap_or(&"Invalid value".into())
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
        name: String,
        #[validate(range(min = 1, message = "Quantity must be at least 1"))]
        quantity: i32,
    }

    #[test]
    fn messages_include_field_names() {
        let sample = Sample {
            name: "ab".into(),
            quantity: 0,
        };
        let errors = sample.validate().unwrap_err();
        let mut messages = validation_messages(&errors);
        messages.sort();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("name: ") || messages[1].starts_with("name: "));
        assert!(messages.iter().any(|m| m.contains("Quantity must be at least 1")));
    }
}
