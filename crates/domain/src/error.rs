//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`WebThingError`] via `#[from]`.

/// Top-level error for operations on a thing.
#[derive(Debug, thiserror::Error)]
pub enum WebThingError {
    /// The request was understood but its content was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The addressed property, action, event or thing does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A value forwarder rejected a commanded value.
    #[error(transparent)]
    Forwarding(#[from] ForwardError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A thing must have a non-empty title.
    #[error("thing title must not be empty")]
    EmptyTitle,

    /// Action input failed its declared schema.
    #[error("invalid input for action `{action}`: {}", .violations.join("; "))]
    InvalidInput {
        action: String,
        violations: Vec<String>,
    },

    /// Attempt to write a read-only property.
    #[error("property `{property}` is read-only")]
    ReadOnly { property: String },

    /// The JSON type of a value does not match the declared primitive type.
    #[error("property `{property}` expects {expected}, got {found}")]
    TypeMismatch {
        property: String,
        expected: String,
        found: &'static str,
    },

    /// The value has the right type but breaks a declared constraint.
    #[error("invalid value for property `{property}`: {}", .violations.join("; "))]
    ConstraintViolation {
        property: String,
        violations: Vec<String>,
    },
}

/// A named resource could not be found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{resource} `{name}` not found")]
pub struct NotFoundError {
    /// Kind of resource (`"property"`, `"action"`, `"event"`, `"thing"`, …).
    pub resource: &'static str,
    /// Name or identifier that was looked up.
    pub name: String,
}

impl NotFoundError {
    #[must_use]
    pub fn new(resource: &'static str, name: impl Into<String>) -> Self {
        Self {
            resource,
            name: name.into(),
        }
    }
}

/// Error raised by a device-specific value forwarder.
#[derive(Debug, thiserror::Error)]
#[error("value forwarder failed")]
pub struct ForwardError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl ForwardError {
    /// Wrap any device error (or plain message) into a [`ForwardError`].
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn should_join_violations_in_invalid_input_message() {
        let err = ValidationError::InvalidInput {
            action: "fade".to_string(),
            violations: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "invalid input for action `fade`: a; b");
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError::new("property", "on");
        assert_eq!(err.to_string(), "property `on` not found");
    }

    #[test]
    fn should_keep_inner_message_when_wrapped() {
        let err: WebThingError = ValidationError::ReadOnly {
            property: "level".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "property `level` is read-only");
    }

    #[test]
    fn should_expose_forwarder_source() {
        let err = ForwardError::new("bus offline");
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("bus offline"));
    }
}
