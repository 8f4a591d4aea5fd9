//! Validation helpers for DTOs.

use validator::ValidationError;

use super::parse_timestamp;

const MAX_TITLE_LEN: usize = 120;
const MAX_DESCRIPTION_LEN: usize = 2_000;
const MAX_IDENTITY_LEN: usize = 254;
const MAX_PHOTO_REF_LEN: usize = 2_048;

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates a contest title: non-blank, bounded, usable as a single path segment.
///
/// # Examples
///
/// ```ignore
/// validate_title("Halloween") // Ok
/// validate_title("   ")       // Err - blank
/// validate_title("a/b")       // Err - slash
/// ```
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(error("title_blank", "Title must not be blank".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(error(
            "title_length",
            format!("Title must be at most {MAX_TITLE_LEN} characters"),
        ));
    }
    if trimmed.contains('/') {
        return Err(error("title_format", "Title must not contain '/'".into()));
    }
    Ok(())
}

/// Validates a contest description length.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(error(
            "description_length",
            format!("Description must be at most {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(())
}

/// Validates that a timestamp is RFC 3339.
pub fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    parse_timestamp(value)
        .map(|_| ())
        .map_err(|err| error("timestamp_format", format!("Expected an RFC 3339 timestamp: {err}")))
}

/// Shape check only; the mode-dependent rules live in the participation service.
pub fn validate_identity(identity: &str) -> Result<(), ValidationError> {
    let trimmed = identity.trim();
    if trimmed.is_empty() {
        return Err(error("identity_blank", "Identity must not be blank".into()));
    }
    if trimmed.len() > MAX_IDENTITY_LEN {
        return Err(error(
            "identity_length",
            format!("Identity must be at most {MAX_IDENTITY_LEN} bytes"),
        ));
    }
    Ok(())
}

/// Validates a photo handle: non-blank and bounded.
pub fn validate_photo_ref(photo_ref: &str) -> Result<(), ValidationError> {
    let trimmed = photo_ref.trim();
    if trimmed.is_empty() {
        return Err(error("photo_ref_blank", "Photo reference must not be blank".into()));
    }
    if trimmed.len() > MAX_PHOTO_REF_LEN {
        return Err(error(
            "photo_ref_length",
            format!("Photo reference must be at most {MAX_PHOTO_REF_LEN} bytes"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Halloween").is_ok());
        assert!(validate_title("  Fall 2024  ").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title("a/b").is_err());
        assert!(validate_title(&"x".repeat(121)).is_err());
    }

    #[test]
    fn test_validate_timestamp() {
        assert!(validate_timestamp("2024-10-01T00:00:00Z").is_ok());
        assert!(validate_timestamp("2024-10-01").is_err());
    }

    #[test]
    fn test_validate_identity_and_photo() {
        assert!(validate_identity("a@x.com").is_ok());
        assert!(validate_identity(" ").is_err());
        assert!(validate_photo_ref("https://img.example/1.jpg").is_ok());
        assert!(validate_photo_ref("").is_err());
    }
}
