mod app;
mod options;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kat_core::{
    load_config, render_metrics, validate_config, Config, ConfigError, HttpPageFetcher,
    SearchEngine, SelectListClient, SelectListSource,
};

use app::{format_select_lists, App};
use options::Cli;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("kat: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_args();
    let config = configure(&cli)?;

    println!("kat {VERSION}");

    let lists = cli.requested_lists();
    if lists.is_empty() {
        search(&cli, &config).await?;
    } else {
        let client = SelectListClient::new(&config.site).context("Failed to create client")?;
        let mut fetched = Vec::with_capacity(lists.len());
        for &list_id in lists {
            let list = client
                .list(list_id)
                .await
                .with_context(|| format!("Failed to fetch {list_id}"))?;
            fetched.push((list_id, list));
        }
        println!("{}", format_select_lists(&fetched));
    }

    if cli.metrics {
        eprintln!("{}", render_metrics().context("Failed to render metrics")?);
    }
    Ok(())
}

/// Load `KAT_CONFIG` (default `kat.toml`), falling back to defaults when the
/// file does not exist, then apply command-line overrides.
fn configure(cli: &Cli) -> Result<Config> {
    let config_path = std::env::var("KAT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("kat.toml"));

    let mut config = match load_config(&config_path) {
        Ok(config) => {
            info!("Loaded configuration from {:?}", config_path);
            config
        }
        Err(ConfigError::FileNotFound(_)) => {
            debug!("No configuration at {:?}, using defaults", config_path);
            Config::default()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load config from {:?}", config_path))
        }
    };

    if let Some(dir) = &cli.output {
        config.output.directory = dir.clone();
    }
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn search(cli: &Cli, config: &Config) -> Result<()> {
    let fetcher = HttpPageFetcher::new(&config.site).context("Failed to create page fetcher")?;

    let mut engine = SearchEngine::new(fetcher);
    engine.set_terms(cli.terms()).context("Invalid search terms")?;
    engine
        .set_options(cli.options())
        .context("Invalid search options")?;
    info!(query = %engine.query_text(), "Searching");

    let mut app = App::new(engine, config)?;
    let mut input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    app.run(&mut input, &mut out).await
}
