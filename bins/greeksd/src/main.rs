//! greeksd
//!
//! Polls underlying prices and implied volatilities for a fixed list of
//! option contracts, caches their Black-Scholes Greeks and streams the cache
//! to WebSocket subscribers.

use anyhow::{Context, Result};
use cli::{Cli, Commands};
use config::{
    load_config, load_from_env, save_config, validate_config, GreeksConfig, ValidationReport,
};
use market_data::{ContractId, GreeksPoller, MarketDataClient};
use observability::{init_logging, init_metrics, LogFormat};
use server::{
    GreeksServer, RedisChannelSink, Server, ServerConfig, ShutdownController, SnapshotPublisher,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::create_store;
use tracing::{debug, error, info, warn};

const SERVICE_NAME: &str = "greeksd";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start { config, http, ws } => start(config, http, ws).await,
        Commands::Validate { config } => validate_command(config),
        Commands::Init { output } => init_command(&output),
        Commands::Decode { symbols } => decode_command(&symbols),
    }
}

fn load(path: Option<&Path>) -> Result<GreeksConfig> {
    match path {
        Some(path) => load_config(path),
        None => load_from_env(),
    }
}

fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    for err in &report.errors {
        error!("{}", err);
    }
}

async fn start(config_path: Option<PathBuf>, http: Option<u16>, ws: Option<u16>) -> Result<()> {
    let mut config = load(config_path.as_deref())?;

    if let Some(port) = http {
        config.server.http_port = port;
    }
    if let Some(port) = ws {
        config.server.ws_port = port;
    }

    let format = LogFormat::parse(&config.logging.format).unwrap_or_default();
    init_logging(SERVICE_NAME, format)?;
    debug!(?config, "Configuration loaded");

    let report = validate_config(&config);
    log_report(&report);
    if !report.is_valid() {
        anyhow::bail!(
            "Cannot start due to {} configuration error(s)",
            report.errors.len()
        );
    }

    if let Some(port) = config.server.metrics_port {
        init_metrics(port)?;
    }

    // Undecodable identifiers stay configured; the poller skips them each cycle.
    for raw in &config.symbols {
        if let Err(e) = ContractId::decode(raw) {
            warn!(symbol = %raw, error = %e, "Symbol will never be priced");
        }
    }

    let store = create_store(&config.store)
        .await
        .context("Failed to open Greeks store")?;

    let client = MarketDataClient::yahoo(&config.provider)
        .context("Failed to build market data client")?;
    let poller = GreeksPoller::new(
        config.symbols.clone(),
        Arc::new(client),
        store.clone(),
        &config.poller,
    );

    let push_interval = config.broadcast.push_interval();
    let mut server = GreeksServer::new(
        SERVICE_NAME,
        ServerConfig::from_settings(&config.server),
        store.clone(),
        push_interval,
    );

    if let Some(channel) = config.broadcast.publish_channel.clone() {
        let sink = RedisChannelSink::connect(&config.store.redis_url, channel)
            .await
            .context("Failed to connect snapshot publisher")?;
        server = server.with_publisher(SnapshotPublisher::new(
            store.clone(),
            Arc::new(sink),
            push_interval,
        ));
    }

    info!(
        symbols = config.symbols.len(),
        store = store.backend(),
        http_port = config.server.http_port,
        ws_port = config.server.ws_port,
        "Starting {}",
        SERVICE_NAME
    );

    let shutdown = ShutdownController::with_ctrl_c();

    let poller_token = shutdown.child_token();
    let poller_handle = tokio::spawn(async move { poller.run(poller_token).await });

    let result = server.run(shutdown.child_token()).await;

    // A poller caught mid-cycle finishes its current request, then stops.
    shutdown.shutdown();
    if let Err(e) = poller_handle.await {
        error!(%e, "Poller task panicked");
    }

    result.context("Server exited with error")?;
    info!("{} stopped", SERVICE_NAME);
    Ok(())
}

fn validate_command(config_path: Option<PathBuf>) -> Result<()> {
    let config = load(config_path.as_deref())?;
    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Store: {} ({})", config.store.store_type, config.store.redis_url);
    println!("Symbols: {}", config.symbols.len());
    println!("Poll interval: {}s", config.poller.interval_seconds);
    println!("Risk-free rate: {}", config.poller.risk_free_rate);
    println!(
        "Listeners: HTTP {}:{}, WebSocket {}:{}",
        config.server.host, config.server.http_port, config.server.host, config.server.ws_port
    );

    Ok(())
}

fn init_command(output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&GreeksConfig::default(), output_path)?;

    println!("[ok] Configuration file created at {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Edit the symbol list and store settings");
    println!("  2. Run 'greeksd validate --config {:?}'", output_path);
    println!("  3. Run 'greeksd start --config {:?}'", output_path);

    Ok(())
}

fn decode_command(symbols: &[String]) -> Result<()> {
    let mut failed = 0usize;

    for raw in symbols {
        match ContractId::decode(raw) {
            Ok(id) => println!(
                "{:<24} root={} expiry={} type={} strike={} canonical={}",
                raw,
                id.root(),
                id.expiry(),
                id.option_type(),
                id.strike(),
                id.canonical()
            ),
            Err(e) => {
                failed += 1;
                println!("{:<24} [error] {}", raw, e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} symbol(s) could not be decoded", failed, symbols.len());
    }
    Ok(())
}
