//! Input validation for API requests.
//!
//! For collecting multiple validation errors and returning them as an ApiError,
//! use the `ValidationErrorBuilder` from the `error` module.

use super::error::ApiError;

/// Longest accepted image URL
const MAX_IMAGE_URL_LEN: usize = 2048;

/// Parse a numeric project id from a path segment
pub fn parse_project_id(raw: &str) -> Result<u64, ApiError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ApiError::bad_request("Invalid project ID"))
}

/// Validate a required free-text field
pub fn validate_required_text(value: Option<&str>, label: &str) -> Result<(), String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(format!("{} is required", label)),
    }
}

/// Validate the image URL list of a project
pub fn validate_image_urls(images: &[String]) -> Result<(), String> {
    for url in images {
        if url.trim().is_empty() {
            return Err("Image URLs cannot be empty".to_string());
        }
        if url.len() > MAX_IMAGE_URL_LEN {
            return Err(format!(
                "Image URL is too long (max {} characters)",
                MAX_IMAGE_URL_LEN
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_id() {
        assert_eq!(parse_project_id("12").unwrap(), 12);
        assert!(parse_project_id("abc").is_err());
        assert!(parse_project_id("-1").is_err());
        assert!(parse_project_id("").is_err());
    }

    #[test]
    fn test_validate_required_text() {
        assert!(validate_required_text(Some("Villa A"), "Title").is_ok());
        assert_eq!(
            validate_required_text(Some("   "), "Title"),
            Err("Title is required".to_string())
        );
        assert!(validate_required_text(None, "Description").is_err());
    }

    #[test]
    fn test_validate_image_urls() {
        assert!(validate_image_urls(&[]).is_ok());
        assert!(validate_image_urls(&["/portfolio/a.jpg".to_string()]).is_ok());
        assert!(validate_image_urls(&["".to_string()]).is_err());
        assert!(validate_image_urls(&["x".repeat(3000)]).is_err());
    }
}
