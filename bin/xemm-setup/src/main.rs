mod input;

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::Settings;
use feed::{BinanceTickerSource, ExchangePriceManager};
use strategy::xemm::{self, XemmDeps, XemmParams};
use strategy::{ConfigSession, RequiredExchanges, ResolveMode};

use crate::input::DialoguerInput;

/// Interactive setup for the cross-exchange market making strategy.
#[derive(Parser)]
#[command(name = "xemm-setup", version)]
struct Cli {
    /// Prompt for every required entry, not only the ones asked on new configs.
    #[arg(long)]
    full: bool,
}

fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // ── Config ────────────────────────────────────────────────────────────────
    let settings = Settings::from_env()?;
    let catalog = Arc::new(settings.market_catalog()?);
    info!(
        exchanges = ?catalog.exchange_names().collect::<Vec<_>>(),
        "xemm-setup starting"
    );

    // ── Price feed ────────────────────────────────────────────────────────────
    // Config hooks start the feed synchronously; its tasks run here.
    let runtime = tokio::runtime::Runtime::new()?;
    let binance_pairs = catalog
        .exchanges
        .get("binance")
        .map(|listing| listing.pairs.clone())
        .unwrap_or_default();
    let feed = Arc::new(
        ExchangePriceManager::new(runtime.handle().clone(), settings.feed_poll_interval)
            .with_source(Arc::new(BinanceTickerSource::new(
                settings.binance_rest_url.as_str(),
                binance_pairs,
            )?)),
    );

    // ── Registry ──────────────────────────────────────────────────────────────
    let required = RequiredExchanges::new();
    let deps = XemmDeps::from_catalog(catalog.clone(), required.clone(), feed.clone());
    let mut registry = xemm::build(&deps)?;

    // ── Session ───────────────────────────────────────────────────────────────
    let mode = if cli.full {
        ResolveMode::Full
    } else {
        ResolveMode::New
    };
    let mut input = DialoguerInput::default();
    let report = ConfigSession::begin(&mut registry, required.clone()).resolve_all(&mut input, mode)?;

    println!();
    println!("Configuration for {}:", registry.name());
    for (key, value) in registry.snapshot() {
        let shown = value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        println!("  {key:<34} {shown}");
    }
    println!("  {:<34} {}", "required exchanges", required.snapshot().join(", "));

    let params = XemmParams::from_registry(&registry)?;
    info!(
        maker = %params.maker_market,
        taker = %params.taker_market,
        prompted = report.prompted.len(),
        rejected = report.rejected,
        "Configuration complete"
    );

    feed.stop();
    Ok(())
}
