//! Additional validation utilities.

use crate::error::{McpError, Result};

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(McpError::invalid_params(format!(
            "{} cannot be empty",
            field_name
        )));
    }
    Ok(())
}

/// Validate that a number is within a range
pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    value: T,
    min: T,
    max: T,
    field_name: &str,
) -> Result<()> {
    if value < min || value > max {
        return Err(McpError::invalid_params(format!(
            "{} must be between {} and {}, got {}",
            field_name, min, max, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("mcp", "name").is_ok());
        let err = validate_non_empty(" ", "name").unwrap_err();
        assert_eq!(err.to_string(), "Invalid params: name cannot be empty");
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(5, 1, 7, "day").is_ok());
        assert!(validate_range(8, 1, 7, "day").is_err());
        assert!(validate_range(0.5, 0.0, 1.0, "ratio").is_ok());
    }
}
