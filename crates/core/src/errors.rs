use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Product,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => f.write_str("product"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed for `{field}`: {message}")]
    Validation { field: String, message: String },
    #[error("{entity} `{id}` was not found in the supplied snapshot")]
    NotFound { entity: EntityKind, id: String },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    pub fn product_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { entity: EntityKind::Product, id: id.into() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("snapshot failure: {0}")]
    Snapshot(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable machine-readable class used by the CLI output envelope.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::Validation { .. }) => "validation",
            Self::Domain(DomainError::NotFound { .. }) => "not_found",
            Self::Snapshot(_) => "snapshot",
            Self::Configuration(_) => "config_validation",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Snapshot(_) => 3,
            Self::Domain(DomainError::Validation { .. }) => 4,
            Self::Domain(DomainError::NotFound { .. }) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError};

    #[test]
    fn not_found_message_names_entity_and_id() {
        let error = DomainError::product_not_found("42");
        assert_eq!(error.to_string(), "product `42` was not found in the supplied snapshot");
    }

    #[test]
    fn validation_message_names_the_field() {
        let error = ApplicationError::from(DomainError::validation("price", "must not be negative"));
        assert!(error.to_string().contains("`price`"));
        assert_eq!(error.error_class(), "validation");
    }

    #[test]
    fn error_classes_and_exit_codes_are_distinct() {
        let errors = [
            ApplicationError::Configuration("bad weights".to_owned()),
            ApplicationError::Snapshot("missing file".to_owned()),
            ApplicationError::from(DomainError::validation("id", "empty")),
            ApplicationError::from(DomainError::product_not_found("1")),
        ];

        let classes: Vec<_> = errors.iter().map(ApplicationError::error_class).collect();
        let codes: Vec<_> = errors.iter().map(ApplicationError::exit_code).collect();
        assert_eq!(classes, vec!["config_validation", "snapshot", "validation", "not_found"]);
        assert_eq!(codes, vec![2, 3, 4, 5]);
    }
}
