//! Reads catalog and behavior-log snapshots from JSON files.

use std::fs;
use std::path::Path;

use freshcart_core::domain::behavior::BehaviorEvent;
use freshcart_core::domain::product::Product;
use freshcart_core::errors::{ApplicationError, DomainError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Reads a catalog from either a bare array or `{"products": [...]}`.
pub fn load_catalog(path: &Path) -> Result<Vec<Product>, ApplicationError> {
    let products: Vec<Product> = read_records(path, "products", "product")?;
    debug!(
        event_name = "cli.snapshot.catalog_loaded",
        path = %path.display(),
        products = products.len(),
        "catalog snapshot loaded"
    );
    Ok(products)
}

/// No path means an empty behavior log.
pub fn load_behaviors(path: Option<&Path>) -> Result<Vec<BehaviorEvent>, ApplicationError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let events: Vec<BehaviorEvent> = read_records(path, "behaviors", "behavior")?;
    debug!(
        event_name = "cli.snapshot.behaviors_loaded",
        path = %path.display(),
        events = events.len(),
        "behavior snapshot loaded"
    );
    Ok(events)
}

/// Unreadable files, invalid JSON and unexpected document shapes are snapshot
/// failures. A record that does not fit the domain model is a validation
/// failure carrying serde's field-level message.
fn read_records<T: DeserializeOwned>(
    path: &Path,
    wrapper_key: &str,
    record: &str,
) -> Result<Vec<T>, ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ApplicationError::Snapshot(format!("could not read `{}`: {error}", path.display()))
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|error| {
        ApplicationError::Snapshot(format!("could not parse `{}`: {error}", path.display()))
    })?;

    let records = match document {
        Value::Array(records) => records,
        Value::Object(mut fields) => match fields.remove(wrapper_key) {
            Some(Value::Array(records)) => records,
            _ => {
                return Err(ApplicationError::Snapshot(format!(
                    "`{}` must be a JSON array or an object with a `{wrapper_key}` array",
                    path.display()
                )))
            }
        },
        _ => {
            return Err(ApplicationError::Snapshot(format!(
                "`{}` must be a JSON array or an object with a `{wrapper_key}` array",
                path.display()
            )))
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(position, value)| {
            serde_json::from_value(value).map_err(|error| {
                ApplicationError::from(DomainError::validation(
                    record,
                    format!("{} record #{position} in `{}`: {error}", record, path.display()),
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn catalog_accepts_bare_and_wrapped_arrays() {
        let dir = TempDir::new().expect("temp dir");
        let bare = dir.path().join("bare.json");
        let wrapped = dir.path().join("wrapped.json");
        fs::write(&bare, r#"[{"id": 1, "category": "fruit", "price": 2.5}]"#).expect("write");
        fs::write(&wrapped, r#"{"products": [{"id": "1", "categoryId": "fruit", "price": 2.5}]}"#)
            .expect("write");

        let from_bare = load_catalog(&bare).expect("bare catalog");
        let from_wrapped = load_catalog(&wrapped).expect("wrapped catalog");
        assert_eq!(from_bare, from_wrapped);
    }

    #[test]
    fn unknown_behavior_kind_is_a_validation_error_naming_the_record() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("behaviors.json");
        fs::write(
            &path,
            r#"{"behaviors": [
                {"userId": "u1", "productId": 1, "behaviorType": "view"},
                {"userId": "u1", "productId": 2, "behaviorType": "wishlist"}
            ]}"#,
        )
        .expect("write");

        let error = load_behaviors(Some(&path)).expect_err("unknown behavior");
        assert_eq!(error.error_class(), "validation");
        assert_eq!(error.exit_code(), 4);
        let message = error.to_string();
        assert!(message.contains("#1"), "unexpected message: {message}");
        assert!(message.contains("wishlist"), "unexpected message: {message}");
    }

    #[test]
    fn record_missing_a_required_field_is_a_validation_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"[{"id": 1, "price": 2.5}]"#).expect("write");

        let error = load_catalog(&path).expect_err("missing category");
        assert_eq!(error.error_class(), "validation");
        assert!(error.to_string().contains("category"));
    }

    #[test]
    fn unexpected_document_shape_is_a_snapshot_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"{"items": []}"#).expect("write");

        let error = load_catalog(&path).expect_err("wrong wrapper");
        assert_eq!(error.error_class(), "snapshot");
    }

    #[test]
    fn missing_behavior_path_is_an_empty_log() {
        assert!(load_behaviors(None).expect("no file").is_empty());
    }

    #[test]
    fn unreadable_and_malformed_files_are_snapshot_errors() {
        let dir = TempDir::new().expect("temp dir");
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{not json").expect("write");

        let missing = load_catalog(&dir.path().join("absent.json")).expect_err("missing file");
        assert_eq!(missing.error_class(), "snapshot");
        let malformed = load_behaviors(Some(&broken)).expect_err("malformed file");
        assert_eq!(malformed.exit_code(), 3);
    }
}
