//! # Text Processing Module
//!
//! This module turns one raw OCR line into a structured order line:
//!
//! - Noise stripping and case folding (`clean`, `normalize`)
//! - Potency detection (e.g. "500mg", "5 ml", "10%") with a configurable unit list
//! - Trailing quantity extraction, defaulting to "1"
//! - Splitting an OCR response into candidate lines
//!
//! The OCR service is prompted to answer "in a list format ... like {Name} {Quantity}",
//! so lines typically arrive as `"1. Paracetamol 500mg 10"` or `"- Crocin 2"`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::errors::{AppError, AppResult};
use crate::validation::is_valid_quantity;

/// Unit markers recognised after a number as a potency token
pub const DEFAULT_POTENCY_UNITS: [&str; 9] = ["%", "mg", "ml", "g", "kg", "mcg", "iu", "u", "units"];

lazy_static! {
    static ref LEADING_NOISE: Regex =
        Regex::new(r"^[^\p{L}]+").expect("Leading noise pattern should be valid");
    static ref DISALLOWED_CHARS: Regex =
        Regex::new(r"[^\p{L}\d\s%]").expect("Disallowed character pattern should be valid");
    static ref WHITESPACE_RUN: Regex =
        Regex::new(r"\s+").expect("Whitespace pattern should be valid");
    static ref DEFAULT_PARSER: LineParser = LineParser::with_config(ParserConfig::default())
        .expect("Default parser configuration should be valid");
}

/// Remove OCR noise from a raw line while preserving case.
///
/// Drops the leading run of non-letters (list bullets, numbering), removes every
/// character other than letters, digits, whitespace and `%`, and collapses whitespace.
///
/// # Examples
///
/// ```
/// use slip_resolver::text_processing::clean;
///
/// assert_eq!(clean("1. Paracetamol,  500mg!"), "Paracetamol 500mg");
/// assert_eq!(clean("*** 42 ---"), "");
/// ```
pub fn clean(raw: &str) -> String {
    let without_leading = LEADING_NOISE.replace(raw, "");
    let filtered = DISALLOWED_CHARS.replace_all(&without_leading, "");
    WHITESPACE_RUN.replace_all(&filtered, " ").trim().to_string()
}

/// Clean a raw line and case-fold it for matching.
pub fn normalize(raw: &str) -> String {
    clean(raw).to_lowercase()
}

/// Split an OCR response into non-blank lines, keeping their order
pub fn split_ocr_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// One OCR line broken into item name, potency and quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// The line as it was received
    pub raw: String,
    /// Cleaned, case-preserving form of the line
    pub normalized: String,
    /// Residual item name used for catalog matching
    pub name: String,
    /// Strength token such as "500mg", removed from `name`
    pub potency: Option<String>,
    /// Always a non-empty ASCII digit string
    pub quantity: String,
}

/// Configuration for potency and quantity extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Unit markers accepted after a number to form a potency token
    pub potency_units: Vec<String>,
    /// Whether a quantity may be glued to the preceding word ("Crocin10")
    pub allow_attached_quantity: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            potency_units: DEFAULT_POTENCY_UNITS.iter().map(|u| u.to_string()).collect(),
            allow_attached_quantity: true,
        }
    }
}

impl ParserConfig {
    /// Validate parser configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.potency_units.is_empty() {
            return Err(AppError::Config("potency_units cannot be empty".to_string()));
        }

        for (i, unit) in self.potency_units.iter().enumerate() {
            if unit.trim().is_empty() {
                return Err(AppError::Config(format!("potency_units[{}] cannot be empty", i)));
            }
            if unit.chars().any(|c| c.is_control() || c.is_whitespace() || c.is_ascii_digit()) {
                return Err(AppError::Config(format!(
                    "potency_units[{}] '{}' must not contain digits, whitespace or control characters",
                    i, unit
                )));
            }
        }

        Ok(())
    }
}

/// Build the potency regex from the configured unit list.
///
/// Units are sorted longest first so that "units" wins over "u" and "mcg" over "g".
/// Alphabetic units must end on a word boundary, otherwise "2 ginger" would yield "2 g".
fn build_potency_pattern(units: &[String]) -> String {
    let mut sorted: Vec<String> = units.iter().map(|u| u.trim().to_lowercase()).collect();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    sorted.dedup();

    let alternatives: Vec<String> = sorted
        .iter()
        .map(|unit| {
            let escaped = regex::escape(unit);
            if unit.chars().last().is_some_and(|c| c.is_alphanumeric()) {
                format!(r"{}\b", escaped)
            } else {
                escaped
            }
        })
        .collect();

    format!(r"(?i)\d+\s?(?:{})", alternatives.join("|"))
}

/// Extracts potency and quantity from cleaned OCR lines
#[derive(Debug, Clone)]
pub struct LineParser {
    potency: Regex,
    quantity: Regex,
    config: ParserConfig,
}

impl LineParser {
    /// Create a parser with the default unit list
    pub fn new() -> Self {
        DEFAULT_PARSER.clone()
    }

    /// Create a parser with a custom configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use slip_resolver::text_processing::{LineParser, ParserConfig};
    ///
    /// let config = ParserConfig {
    ///     potency_units: vec!["mg".to_string(), "tab".to_string()],
    ///     ..Default::default()
    /// };
    /// let parser = LineParser::with_config(config)?;
    /// assert_eq!(parser.parse("Dolo 2tab 3").potency.as_deref(), Some("2tab"));
    /// # Ok::<(), slip_resolver::errors::AppError>(())
    /// ```
    pub fn with_config(config: ParserConfig) -> AppResult<Self> {
        config.validate()?;

        let potency = Regex::new(&build_potency_pattern(&config.potency_units))
            .map_err(|e| AppError::Config(format!("invalid potency pattern: {}", e)))?;
        let quantity_pattern = if config.allow_attached_quantity {
            r"\s*(\d+)$"
        } else {
            r"(?:^|\s)(\d+)$"
        };
        let quantity = Regex::new(quantity_pattern)
            .map_err(|e| AppError::Config(format!("invalid quantity pattern: {}", e)))?;

        Ok(Self {
            potency,
            quantity,
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Clean a raw OCR line and parse it, keeping the raw text on the result
    pub fn parse_line(&self, raw: &str) -> ParsedLine {
        let mut parsed = self.parse(&clean(raw));
        parsed.raw = raw.to_string();
        parsed
    }

    /// Parse an already cleaned line into name, potency and quantity.
    ///
    /// Never fails: when nothing but digits and units remain, the whole
    /// normalized text becomes the name and the quantity defaults to "1".
    pub fn parse(&self, normalized: &str) -> ParsedLine {
        let mut working = normalized.trim().to_string();

        let potency_match = self
            .potency
            .find(&working)
            .map(|m| (m.range(), m.as_str().to_string()));
        let potency = potency_match.map(|(range, token)| {
            working.replace_range(range, " ");
            token
        });

        let trimmed = working.trim_end().to_string();
        // Non-ASCII digits stay in the text and the quantity defaults
        let quantity = match self
            .quantity
            .captures(&trimmed)
            .filter(|caps| caps.get(1).is_some_and(|m| is_valid_quantity(m.as_str())))
        {
            Some(caps) => {
                let whole = caps.get(0).map(|m| m.start()).unwrap_or(trimmed.len());
                let digits = caps.get(1).map(|m| m.as_str()).unwrap_or("1").to_string();
                working = trimmed[..whole].to_string();
                digits
            }
            None => "1".to_string(),
        };

        let mut name = working
            .split_whitespace()
            .filter(|token| token.chars().any(char::is_alphabetic))
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            trace!("No residual name in '{}', falling back to full text", normalized);
            name = normalized.trim().to_string();
        }

        debug!(
            name = %name,
            potency = ?potency,
            quantity = %quantity,
            "Parsed order line"
        );

        ParsedLine {
            raw: normalized.to_string(),
            normalized: normalized.to_string(),
            name,
            potency,
            quantity,
        }
    }

    /// Regex pattern used for potency detection (for diagnostics and tests)
    pub fn potency_pattern(&self) -> &str {
        self.potency.as_str()
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a cleaned line with the default parser
///
/// # Examples
///
/// ```
/// use slip_resolver::text_processing::parse;
///
/// let line = parse("Paracetamol 500mg 10");
/// assert_eq!(line.name, "Paracetamol");
/// assert_eq!(line.potency.as_deref(), Some("500mg"));
/// assert_eq!(line.quantity, "10");
/// ```
pub fn parse(normalized: &str) -> ParsedLine {
    DEFAULT_PARSER.parse(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_list_markers() {
        assert_eq!(clean("1. Crocin 2"), "Crocin 2");
        assert_eq!(clean("- Dolo 650"), "Dolo 650");
        assert_eq!(clean("  •  Azithral   500mg  "), "Azithral 500mg");
    }

    #[test]
    fn test_clean_keeps_percent_and_digits() {
        assert_eq!(clean("Betadine 5% 1"), "Betadine 5% 1");
        assert_eq!(clean("Co-Amoxiclav (625)"), "CoAmoxiclav 625");
    }

    #[test]
    fn test_normalize_case_folds() {
        assert_eq!(normalize("PARACETAMOL"), "paracetamol");
        assert_eq!(normalize("12345"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_potency_pattern_prefers_longest_unit() {
        let parser = LineParser::new();
        assert_eq!(parser.parse("Insulin 40 units 2").potency.as_deref(), Some("40 units"));
        assert_eq!(parser.parse("Folic 500mcg").potency.as_deref(), Some("500mcg"));
    }

    #[test]
    fn test_unit_requires_word_boundary() {
        let parsed = parse("Tea 2 ginger");
        assert_eq!(parsed.potency, None);
        assert_eq!(parsed.name, "Tea ginger");
    }

    #[test]
    fn test_percent_potency() {
        let parsed = parse("Betadine 5% 1");
        assert_eq!(parsed.potency.as_deref(), Some("5%"));
        assert_eq!(parsed.name, "Betadine");
        assert_eq!(parsed.quantity, "1");
    }

    #[test]
    fn test_only_first_potency_taken() {
        let parsed = parse("Combo 500mg 200mg 3");
        assert_eq!(parsed.potency.as_deref(), Some("500mg"));
        assert_eq!(parsed.quantity, "3");
        assert_eq!(parsed.name, "Combo 200mg");
    }

    #[test]
    fn test_non_ascii_digits_are_not_a_quantity() {
        let parsed = parse("Crocin \u{0663}");
        assert_eq!(parsed.quantity, "1");
        assert_eq!(parsed.name, "Crocin");
        assert!(is_valid_quantity(&parse("Crocin 3").quantity));
    }

    #[test]
    fn test_detached_quantity_mode() {
        let parser = LineParser::with_config(ParserConfig {
            allow_attached_quantity: false,
            ..Default::default()
        })
        .unwrap();
        let parsed = parser.parse("Vitamin B12");
        assert_eq!(parsed.quantity, "1");
        assert_eq!(parsed.name, "Vitamin B12");

        let parsed = parse("Vitamin B12");
        assert_eq!(parsed.quantity, "12");
    }

    #[test]
    fn test_parser_config_validation() {
        let mut config = ParserConfig::default();
        assert!(config.validate().is_ok());

        config.potency_units = vec![];
        assert!(config.validate().is_err());

        config.potency_units = vec!["".to_string()];
        assert!(config.validate().is_err());

        config.potency_units = vec!["m g".to_string()];
        assert!(config.validate().is_err());

        config.potency_units = vec!["mg".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_ocr_lines_skips_blank() {
        let lines = split_ocr_lines("Crocin 2\n\n   \nDolo 650 10\n");
        assert_eq!(lines, vec!["Crocin 2".to_string(), "Dolo 650 10".to_string()]);
    }
}
