//! # Unified Application Configuration
//!
//! This module consolidates all resolver settings into a single configuration
//! object. Values are loaded from environment variables (a `.env` file is
//! honored by the binary), validated, and handed to the components that need them.

use crate::errors::{AppError, AppResult};
use crate::matching::MatchingConfig;
use crate::observability_config::ObservabilityConfig;
use crate::text_processing::ParserConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Where the catalog is fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSourceKind {
    /// JSON file at `CATALOG_PATH`
    Json,
    /// `catalog_items` table behind `DATABASE_URL`
    Postgres,
}

impl FromStr for CatalogSourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(CatalogSourceKind::Json),
            "postgres" | "postgresql" => Ok(CatalogSourceKind::Postgres),
            other => Err(AppError::Config(format!(
                "CATALOG_SOURCE must be 'json' or 'postgres', got '{}'",
                other
            ))),
        }
    }
}

/// Catalog source configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Which source implementation to use
    pub source: CatalogSourceKind,
    /// Path of the JSON catalog document
    pub path: String,
    /// PostgreSQL connection URL
    pub database_url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: CatalogSourceKind::Json,
            path: "catalog.json".to_string(),
            database_url: None,
            max_connections: 5,
        }
    }
}

impl CatalogConfig {
    /// Validate catalog configuration
    pub fn validate(&self) -> AppResult<()> {
        match self.source {
            CatalogSourceKind::Json => {
                if self.path.trim().is_empty() {
                    return Err(AppError::Config(
                        "CATALOG_PATH cannot be empty for the json catalog source".to_string(),
                    ));
                }
            }
            CatalogSourceKind::Postgres => {
                let url = self.database_url.as_deref().unwrap_or("").trim();
                if url.is_empty() {
                    return Err(AppError::Config(
                        "DATABASE_URL is required for the postgres catalog source".to_string(),
                    ));
                }

                if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                    return Err(AppError::Config(
                        "Database URL must start with 'postgresql://' or 'postgres://'".to_string(),
                    ));
                }
            }
        }

        if self.max_connections == 0 {
            return Err(AppError::Config("Max connections cannot be 0".to_string()));
        }

        if self.max_connections > 100 {
            return Err(AppError::Config(
                "Max connections cannot be greater than 100".to_string(),
            ));
        }

        Ok(())
    }
}

/// Cart registry configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartConfig {
    /// Idle time after which a session cart is dropped
    pub session_ttl_secs: u64,
    /// Maximum number of live session carts
    pub max_sessions: usize,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 1800, // 30 minutes
            max_sessions: 1000,
        }
    }
}

impl CartConfig {
    /// Validate cart configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.session_ttl_secs == 0 {
            return Err(AppError::Config("Cart session TTL cannot be 0".to_string()));
        }

        if self.max_sessions == 0 {
            return Err(AppError::Config("Cart max sessions cannot be 0".to_string()));
        }

        Ok(())
    }
}

/// Read and parse an optional environment variable, keeping `default` when unset
fn env_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a valid value, got '{}'", key, value))),
        Err(_) => Ok(default),
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Matching tier thresholds
    pub matching: MatchingConfig,
    /// Line parser configuration
    pub parser: ParserConfig,
    /// Catalog source configuration
    pub catalog: CatalogConfig,
    /// Cart registry configuration
    pub cart: CartConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        // Matching configuration
        config.matching.similarity_threshold =
            env_or("SIMILARITY_THRESHOLD", config.matching.similarity_threshold)?;
        config.matching.pattern_refinement_threshold = env_or(
            "PATTERN_REFINEMENT_THRESHOLD",
            config.matching.pattern_refinement_threshold,
        )?;
        config.matching.enable_pattern_refinement = env_or(
            "ENABLE_PATTERN_REFINEMENT",
            config.matching.enable_pattern_refinement,
        )?;
        config.matching.pattern_top_n = env_or("PATTERN_TOP_N", config.matching.pattern_top_n)?;
        config.matching.prefix_acceptance_min_len = env_or(
            "PREFIX_ACCEPTANCE_MIN_LEN",
            config.matching.prefix_acceptance_min_len,
        )?;

        // Parser configuration: comma-separated unit list
        if let Ok(units) = env::var("POTENCY_UNITS") {
            config.parser.potency_units = units
                .split(',')
                .map(|u| u.trim().to_lowercase())
                .filter(|u| !u.is_empty())
                .collect();
        }

        // Catalog configuration
        if let Ok(source) = env::var("CATALOG_SOURCE") {
            config.catalog.source = source.parse()?;
        }
        if let Ok(path) = env::var("CATALOG_PATH") {
            config.catalog.path = path;
        }
        config.catalog.database_url = env::var("DATABASE_URL").ok();
        config.catalog.max_connections =
            env_or("DATABASE_MAX_CONNECTIONS", config.catalog.max_connections)?;

        // Cart configuration
        config.cart.session_ttl_secs = env_or("CART_SESSION_TTL_SECS", config.cart.session_ttl_secs)?;
        config.cart.max_sessions = env_or("CART_MAX_SESSIONS", config.cart.max_sessions)?;

        config.observability = ObservabilityConfig::from_env();

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.matching.validate()?;
        self.parser.validate()?;
        self.catalog.validate()?;
        self.cart.validate()?;
        self.observability
            .validate()
            .map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: catalog_source={:?}, catalog_path={}, db_url={}, similarity_threshold={}, pattern_top_n={}, potency_units={}, metrics_enabled={}",
            self.catalog.source,
            self.catalog.path,
            if self.catalog.database_url.is_some() { "[REDACTED]" } else { "[UNSET]" },
            self.matching.similarity_threshold,
            self.matching.pattern_top_n,
            self.parser.potency_units.len(),
            self.observability.enable_metrics_export
        )
    }
}
