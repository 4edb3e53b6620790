use async_trait::async_trait;
use http::request::Parts;
use serde_json::Value;

use crate::auth::errors::{BoxError, MisuseError, UnauthorizedError};

/// Verdict of a validation hook on a loaded session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// Rejected; `None` falls back to "Invalid session state"
    Invalid(Option<UnauthorizedError>),
}

impl ValidationResult {
    /// Adapt a loosely typed `{ "valid": bool, "error"?: ... }` result.
    ///
    /// `error` may be null, a message string, or an object with a `message` field.
    pub fn from_value(value: &Value) -> Result<Self, MisuseError> {
        let Some(object) = value.as_object() else {
            return Err(MisuseError("result must be an object".to_string()));
        };

        let valid = match object.get("valid") {
            Some(Value::Bool(valid)) => *valid,
            Some(_) => return Err(MisuseError("'valid' must be a boolean".to_string())),
            None => {
                return Err(MisuseError(
                    "result must have a 'valid' property".to_string(),
                ));
            }
        };

        if valid {
            return Ok(ValidationResult::Valid);
        }

        let error = match object.get("error") {
            Some(Value::String(message)) => Some(UnauthorizedError::new(message.as_str())),
            Some(Value::Object(error)) => error
                .get("message")
                .and_then(Value::as_str)
                .map(UnauthorizedError::new),
            _ => None,
        };
        Ok(ValidationResult::Invalid(error))
    }
}

/// Extra check run on every successfully loaded session.
///
/// Returning `Err` is a system fault and fails the request, except when the
/// error is an [`UnauthorizedError`], which rejects the session with that error.
#[async_trait]
pub trait ValidateSession: Send + Sync + 'static {
    async fn validate(&self, parts: &Parts, session: &Value) -> Result<ValidationResult, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_valid() {
        let result = ValidationResult::from_value(&json!({"valid": true, "error": null}));
        assert_eq!(result.unwrap(), ValidationResult::Valid);
    }

    #[test]
    fn test_from_value_invalid_with_message() {
        let result =
            ValidationResult::from_value(&json!({"valid": false, "error": "Session token expired"}))
                .unwrap();
        let ValidationResult::Invalid(Some(error)) = result else {
            panic!("expected an invalid result with an error");
        };
        assert_eq!(error.message(), Some("Session token expired"));

        let result = ValidationResult::from_value(
            &json!({"valid": false, "error": {"message": "MFA validation required."}}),
        )
        .unwrap();
        assert!(matches!(
            result,
            ValidationResult::Invalid(Some(e)) if e.message() == Some("MFA validation required.")
        ));
    }

    #[test]
    fn test_from_value_invalid_without_error() {
        let result = ValidationResult::from_value(&json!({"valid": false})).unwrap();
        assert_eq!(result, ValidationResult::Invalid(None));
    }

    #[test]
    fn test_from_value_misuse() {
        // A result without a boolean 'valid' is a contract violation
        assert!(ValidationResult::from_value(&json!({})).is_err());
        assert!(ValidationResult::from_value(&json!({"valid": "yes"})).is_err());
        assert!(ValidationResult::from_value(&json!(true)).is_err());
        assert!(ValidationResult::from_value(&Value::Null).is_err());
    }
}
