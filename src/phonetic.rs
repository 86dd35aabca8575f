//! Phonetic encoding for the last-resort matching tier.
//!
//! Uses the Double Metaphone primary code, so "kwik" and "quick" both encode to `KK`.

use rphonetic::{DoubleMetaphone, Encoder};

/// Double Metaphone encoder shared by every line of a batch
#[derive(Default)]
pub struct PhoneticMatcher {
    encoder: DoubleMetaphone,
}

impl PhoneticMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary Double Metaphone code, empty when the text has nothing encodable
    pub fn encode(&self, text: &str) -> String {
        let letters: String = text
            .chars()
            .filter(|c| c.is_alphabetic() || c.is_whitespace())
            .collect();
        if letters.trim().is_empty() {
            return String::new();
        }
        self.encoder.encode(&letters.trim().to_uppercase())
    }

    /// Whether two texts share a non-empty primary code
    pub fn sounds_alike(&self, a: &str, b: &str) -> bool {
        let code_a = self.encode(a);
        !code_a.is_empty() && code_a == self.encode(b)
    }
}
