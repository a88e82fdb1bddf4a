//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_DEVICE_ID_LENGTH: usize = 64;

/// Validates that a device ID is a non-empty token of ASCII letters, digits, `-` or `_`.
///
/// Device IDs end up in webhook URLs and route paths, so anything else is refused.
pub fn validate_device_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_DEVICE_ID_LENGTH {
        let mut err = ValidationError::new("device_id_length");
        err.message = Some(
            format!(
                "Device ID must be 1 to {MAX_DEVICE_ID_LENGTH} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("device_id_format");
        err.message =
            Some("Device ID must contain only ASCII letters, digits, '-' or '_'".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particle_style_ids_are_accepted() {
        assert!(validate_device_id("e00fce68a1b2c3d4e5f6a7b8").is_ok());
        assert!(validate_device_id("button-1").is_ok());
        assert!(validate_device_id("b_2").is_ok());
    }

    #[test]
    fn empty_or_oversized_ids_are_rejected() {
        assert!(validate_device_id("").is_err());
        assert!(validate_device_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn ids_with_url_significant_characters_are_rejected() {
        assert!(validate_device_id("a/b").is_err());
        assert!(validate_device_id("a?b").is_err());
        assert!(validate_device_id("a b").is_err());
    }
}
