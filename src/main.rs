use anyhow::Result;
use slip_resolver::catalog::{CatalogSource, JsonFileCatalogSource};
use slip_resolver::config::{AppConfig, CatalogSourceKind};
use slip_resolver::db::PgCatalogSource;
use slip_resolver::errors::error_logging;
use slip_resolver::observability;
use slip_resolver::resolver::NameResolver;
use slip_resolver::text_processing::LineParser;
use slip_resolver::CartRegistry;
use std::env;
use tokio::io::AsyncReadExt;
use tracing::info;

/// Session used when `--session` is not given
const DEFAULT_SESSION: &str = "default";

/// Command line arguments: `[--session <id>] [--remove <index>]... [ocr-text-file]`
#[derive(Debug)]
struct CliArgs {
    /// Text file with the OCR response; stdin when absent
    input: Option<String>,
    /// Session whose cart receives the accepted matches
    session: String,
    /// Cart indices to remove after the batch, applied in order
    removals: Vec<i64>,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            input: None,
            session: DEFAULT_SESSION.to_string(),
            removals: Vec::new(),
        }
    }
}

fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--remove" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--remove requires an index"))?;
                let index = value
                    .parse::<i64>()
                    .map_err(|_| anyhow::anyhow!("--remove index must be an integer, got '{}'", value))?;
                parsed.removals.push(index);
            }
            "--session" => {
                let value = args
                    .next()
                    .filter(|id| !id.trim().is_empty())
                    .ok_or_else(|| anyhow::anyhow!("--session requires a non-empty id"))?;
                parsed.session = value;
            }
            _ if parsed.input.is_none() => parsed.input = Some(arg),
            _ => return Err(anyhow::anyhow!("Unexpected argument: {}", arg)),
        }
    }

    Ok(parsed)
}

/// Read the OCR response from the given file, or from stdin
async fn read_ocr_text(input: Option<&str>) -> Result<String> {
    match input {
        Some(path) => Ok(tokio::fs::read_to_string(path).await?),
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            Ok(text)
        }
    }
}

/// Build the catalog source selected by configuration
async fn build_catalog_source(config: &AppConfig) -> Result<Box<dyn CatalogSource>> {
    let source: Box<dyn CatalogSource> = match config.catalog.source {
        CatalogSourceKind::Json => Box::new(JsonFileCatalogSource::new(&config.catalog.path)),
        CatalogSourceKind::Postgres => {
            let url = config
                .catalog
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set for the postgres catalog source"))?;
            Box::new(PgCatalogSource::connect(url, config.catalog.max_connections).await?)
        }
    };

    info!(catalog_source = %source.describe(), "Catalog source ready");
    Ok(source)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    if let Err(e) = config.validate() {
        error_logging::log_config_error(&e, "app_config", "startup_validation");
        return Err(e.into());
    }

    observability::init_observability_with_config(&config.observability)?;
    info!("{}", config.summary());

    let args = parse_args(env::args().skip(1))?;
    let text = read_ocr_text(args.input.as_deref()).await?;

    let source = build_catalog_source(&config).await?;
    let resolver = NameResolver::new(
        config.matching.clone(),
        LineParser::with_config(config.parser.clone())?,
    );
    let registry = CartRegistry::from_config(&config.cart);
    let cart = registry.cart_for(&args.session);

    let mut response = resolver.resolve_text(&text, source.as_ref(), &cart).await?;

    for index in &args.removals {
        response.cart = cart.remove_at(*index);
    }

    let stats = registry.stats();
    info!(
        session = %args.session,
        cart_items = cart.len(),
        sessions = stats.total_sessions,
        "Cart updated"
    );

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
