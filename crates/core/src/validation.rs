//! Request validation for generation parameters.

use std::path::{Component, Path};

use crate::error::CoreError;

/// Validate a caller-supplied output folder or base filename.
///
/// Names end up joined under the server's output directory, so they must
/// be non-empty, relative, and free of `..` components. Nested folders
/// such as `campaign/spring` are allowed.
pub fn validate_output_name(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }

    let path = Path::new(value);
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || value.starts_with('/') || value.starts_with('\\') {
        return Err(CoreError::Validation(format!(
            "{field} must be a relative path without '..' (got '{value}')"
        )));
    }

    Ok(())
}

/// Validate that a count-like parameter (batch size, frame count) is positive.
pub fn validate_positive(field: &str, value: u32) -> Result<(), CoreError> {
    if value == 0 {
        return Err(CoreError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_nested_names_accepted() {
        assert!(validate_output_name("folder", "flux_examples").is_ok());
        assert!(validate_output_name("folder", "KTaivle").is_ok());
        assert!(validate_output_name("folder", "campaign/spring").is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        assert!(validate_output_name("folder", "").is_err());
        assert!(validate_output_name("folder", "   ").is_err());
    }

    #[test]
    fn traversal_rejected() {
        assert!(validate_output_name("folder", "../etc").is_err());
        assert!(validate_output_name("folder", "a/../../b").is_err());
    }

    #[test]
    fn absolute_path_rejected() {
        assert!(validate_output_name("folder", "/tmp/out").is_err());
        assert!(validate_output_name("base_filename", "\\share\\out").is_err());
    }

    #[test]
    fn zero_count_rejected() {
        assert!(validate_positive("batch_size", 0).is_err());
        assert!(validate_positive("batch_size", 4).is_ok());
    }
}
