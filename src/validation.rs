//! Validation module for common validation patterns
//!
//! This module consolidates the input checks used around the resolution engine:
//!
//! - Catalog entry names
//! - OCR text batches
//! - Cart quantities

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref QUANTITY_PATTERN: Regex =
        Regex::new(r"^[0-9]+$").expect("Invalid quantity regex pattern");
}

/// Maximum length of a catalog name, in characters
pub const MAX_CATALOG_NAME_LENGTH: usize = 255;

/// Maximum number of lines accepted in one OCR batch
pub const MAX_BATCH_LINES: usize = 500;

/// Validates a catalog entry name
///
/// # Arguments
/// * `name` - The catalog name to validate
///
/// # Returns
/// * `Ok(&str)` - The trimmed name if valid
/// * `Err(&str)` - Error type: "empty", "too_long" or "control_characters"
///
/// # Examples
/// ```
/// use slip_resolver::validation::validate_catalog_name;
///
/// assert_eq!(validate_catalog_name("  Crocin "), Ok("Crocin"));
/// assert_eq!(validate_catalog_name(""), Err("empty"));
/// assert_eq!(validate_catalog_name(&"a".repeat(256)), Err("too_long"));
/// ```
pub fn validate_catalog_name(name: &str) -> Result<&str, &'static str> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > MAX_CATALOG_NAME_LENGTH {
        return Err("too_long");
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err("control_characters");
    }

    Ok(trimmed)
}

/// Validate the size of an OCR batch
///
/// # Returns
/// * `Ok(())` - Batch can be resolved
/// * `Err(&str)` - Error type: "too_many_lines"
pub fn validate_batch_size(line_count: usize) -> Result<(), &'static str> {
    if line_count > MAX_BATCH_LINES {
        return Err("too_many_lines");
    }

    Ok(())
}

/// Validate a cart quantity: a non-empty string of ASCII digits
///
/// # Examples
/// ```
/// use slip_resolver::validation::is_valid_quantity;
///
/// assert!(is_valid_quantity("10"));
/// assert!(!is_valid_quantity(""));
/// assert!(!is_valid_quantity("1.5"));
/// ```
pub fn is_valid_quantity(quantity: &str) -> bool {
    QUANTITY_PATTERN.is_match(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_catalog_name() {
        assert_eq!(validate_catalog_name("Dolo 650"), Ok("Dolo 650"));
        assert_eq!(validate_catalog_name("   "), Err("empty"));
        assert_eq!(validate_catalog_name("Bad\u{0007}Name"), Err("control_characters"));
        assert!(validate_catalog_name(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_validate_batch_size() {
        assert!(validate_batch_size(0).is_ok());
        assert!(validate_batch_size(MAX_BATCH_LINES).is_ok());
        assert_eq!(validate_batch_size(MAX_BATCH_LINES + 1), Err("too_many_lines"));
    }

    #[test]
    fn test_is_valid_quantity() {
        assert!(is_valid_quantity("1"));
        assert!(is_valid_quantity("007"));
        assert!(!is_valid_quantity("-1"));
        assert!(!is_valid_quantity("two"));
        assert!(!is_valid_quantity("\u{0663}"));
    }
}
