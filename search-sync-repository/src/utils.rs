//! Validation helpers shared by the service and provider implementations.

use crate::errors::SearchIndexError;

/// Characters OpenSearch rejects in index names.
const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#'];

/// Validate an index name against the backend's naming rules.
///
/// Index names must be non-empty, lowercase, must not contain any of
/// `\ / * ? " < > | , #` or spaces, and must not start with `-`, `_` or `+`.
///
/// # Example
///
/// ```
/// use search_sync_repository::validate_index_name;
///
/// assert!(validate_index_name("django").is_ok());
/// assert!(validate_index_name("Django").is_err());
/// ```
pub fn validate_index_name(index: &str) -> Result<(), SearchIndexError> {
    if index.is_empty() {
        return Err(SearchIndexError::validation("Index name is required"));
    }

    if index.starts_with(['-', '_', '+']) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' must not start with '-', '_' or '+'",
            index
        )));
    }

    if index.chars().any(|c| c.is_uppercase()) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' must be lowercase",
            index
        )));
    }

    if let Some(c) = index.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' contains invalid character '{}'",
            index, c
        )));
    }

    Ok(())
}

/// Validate that a record identifier is usable as part of a document ID.
pub fn validate_record_id(record_id: &str) -> Result<(), SearchIndexError> {
    if record_id.trim().is_empty() {
        return Err(SearchIndexError::validation("record_id is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_index_names() {
        for name in ["django", "articles_v2", "catalog-2024", "a.b"] {
            assert!(validate_index_name(name).is_ok(), "expected '{}' to be valid", name);
        }
    }

    #[test]
    fn test_invalid_index_names() {
        let test_cases = vec![
            ("", "empty"),
            ("Django", "uppercase"),
            ("-logs", "leading dash"),
            ("_logs", "leading underscore"),
            ("+logs", "leading plus"),
            ("my index", "contains space"),
            ("a/b", "contains slash"),
            ("a*b", "contains star"),
            ("a,b", "contains comma"),
            ("a#b", "contains hash"),
            ("a|b", "contains pipe"),
        ];

        for (name, description) in test_cases {
            let result = validate_index_name(name);
            assert!(
                matches!(result, Err(SearchIndexError::ValidationError(_))),
                "Expected ValidationError for '{}' ({})",
                name,
                description
            );
        }
    }

    #[test]
    fn test_validate_record_id() {
        assert!(validate_record_id("42").is_ok());
        assert!(validate_record_id("").is_err());
        assert!(validate_record_id("   ").is_err());
    }
}
