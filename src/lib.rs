//! # Slip Resolver
//!
//! Resolves noisy OCR'd order-slip lines to canonical catalog names. Each line
//! is cleaned, split into item name, potency and quantity, and run through a
//! cascade of matching tiers (exact, prefix, similarity, pattern, phonetic).
//! Confident matches are appended to a cart.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod matching;
pub mod observability;
pub mod observability_config;
pub mod phonetic;
pub mod ranking;
pub mod resolver;
pub mod text_processing;
pub mod validation;

// Re-export types for easier access
pub use cart::{CartItem, CartRegistry, CartStore, SharedCart};
pub use catalog::{Catalog, CatalogEntry, CatalogSource, JsonFileCatalogSource, StaticCatalogSource};
pub use errors::{AppError, AppResult};
pub use matching::{MatchCandidate, MatchingConfig, TierKind, TierResults};
pub use ranking::ResolutionResult;
pub use resolver::{BatchResponse, NameResolver};
pub use text_processing::{LineParser, ParsedLine, ParserConfig};
