//! # Resolver
//!
//! Batch orchestration: an OCR response is split into lines, the catalog is
//! fetched once, every line goes through parse → match → merge, and accepted
//! matches are appended to the cart in line order.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, Instrument};

use crate::cart::{CartItem, CartStore};
use crate::catalog::{Catalog, CatalogSource};
use crate::errors::{error_logging, AppError, AppResult};
use crate::matching::{self, MatchingConfig};
use crate::observability;
use crate::ranking::{merge, ResolutionResult};
use crate::text_processing::{split_ocr_lines, LineParser};
use crate::validation::validate_batch_size;

/// Everything handed back for one OCR response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    /// One result per non-blank line, in input order
    pub extracted_text: Vec<ResolutionResult>,
    /// Cart contents after this batch
    pub cart: Vec<CartItem>,
    /// When the batch finished
    pub resolved_at: DateTime<Utc>,
}

impl BatchResponse {
    /// Number of lines whose match went into the cart
    pub fn accepted_count(&self) -> usize {
        self.extracted_text.iter().filter(|r| r.is_accepted()).count()
    }
}

/// Resolves OCR lines against a catalog snapshot
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    config: MatchingConfig,
    parser: LineParser,
}

impl NameResolver {
    pub fn new(config: MatchingConfig, parser: LineParser) -> Self {
        Self { config, parser }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Resolve one raw line; `None` only for blank or whitespace-only lines.
    ///
    /// A line that cleans down to nothing ("12", "***") still yields a result,
    /// with no match and no suggestions.
    pub fn resolve_line(&self, raw: &str, catalog: &Catalog) -> Option<ResolutionResult> {
        if raw.trim().is_empty() {
            return None;
        }

        let parsed = self.parser.parse_line(raw);
        if parsed.normalized.is_empty() {
            debug!(raw = %raw, "Line has no usable text");
        }

        let tiers = matching::resolve(&parsed.name, catalog, &self.config);
        Some(merge(parsed, &tiers, &self.config))
    }

    /// Resolve lines in parallel, keeping input order
    pub fn resolve_lines<S>(&self, lines: &[S], catalog: &Catalog) -> Vec<ResolutionResult>
    where
        S: AsRef<str> + Sync,
    {
        lines
            .par_iter()
            .filter_map(|line| self.resolve_line(line.as_ref(), catalog))
            .collect()
    }

    /// Resolve a batch and append accepted matches to the cart in line order
    pub fn resolve_batch<S>(&self, lines: &[S], catalog: &Catalog, cart: &CartStore) -> BatchResponse
    where
        S: AsRef<str> + Sync,
    {
        let start = Instant::now();
        let results = self.resolve_lines(lines, catalog);

        let accepted: Vec<CartItem> = results
            .iter()
            .filter_map(|result| {
                result.accepted_match.as_ref().map(|name| {
                    CartItem::new(
                        name.clone(),
                        result.parsed.quantity.clone(),
                        result.parsed.potency.clone(),
                    )
                })
            })
            .collect();
        let accepted_count = accepted.len();
        cart.extend(accepted);

        observability::record_resolution_metrics(results.len(), accepted_count, start.elapsed());
        info!(
            lines = results.len(),
            accepted = accepted_count,
            catalog_entries = catalog.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Resolved OCR batch"
        );

        BatchResponse {
            extracted_text: results,
            cart: cart.list(),
            resolved_at: Utc::now(),
        }
    }

    /// Resolve a full OCR response against a freshly fetched catalog.
    ///
    /// A catalog fetch failure aborts the batch before any line is resolved,
    /// so the cart is left untouched.
    pub async fn resolve_text(
        &self,
        text: &str,
        source: &dyn CatalogSource,
        cart: &CartStore,
    ) -> AppResult<BatchResponse> {
        let lines = split_ocr_lines(text);
        if let Err(reason) = validate_batch_size(lines.len()) {
            let error = AppError::Validation(format!(
                "OCR text has {} lines: {}",
                lines.len(),
                reason
            ));
            error_logging::log_validation_error(&error, "resolve_text", "ocr_text", None);
            return Err(error);
        }

        let description = source.describe();
        let span = observability::batch_span(lines.len(), &description);

        let fetch_start = Instant::now();
        let catalog = match source.fetch_catalog().instrument(span.clone()).await {
            Ok(catalog) => {
                observability::record_catalog_fetch_metrics(true, fetch_start.elapsed(), catalog.len());
                catalog
            }
            Err(error) => {
                observability::record_catalog_fetch_metrics(false, fetch_start.elapsed(), 0);
                error_logging::log_catalog_error(&error, &description, Some(lines.len()));
                return Err(error);
            }
        };

        Ok(span.in_scope(|| self.resolve_batch(&lines, &catalog, cart)))
    }
}
