//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use datamart_dash::adapters::datamart::{FileDatamartSource, HttpDatamartSource};
use datamart_dash::adapters::export::CsvExporter;
use datamart_dash::adapters::stats::StatsApiClient;
use datamart_dash::adapters::ui::tui::TuiInputPort;
use datamart_dash::ports::{DatamartSource, ExportPort, InputPort, StatisticsPort};
use datamart_dash::shared::config::{AppConfig, REQUEST_TIMEOUT};
use datamart_dash::usecases::{DashboardService, DatasetLoader, LoadOptions};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    datamart_dash::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config could not be read; using defaults");
        AppConfig::default()
    });

    // --- Datamart source: HTTP when configured, local JSON file otherwise ---
    let source: Arc<dyn DatamartSource> = if let Some(url) = cfg.datamart_url() {
        info!(url = %url, "datamart over HTTP");
        Arc::new(HttpDatamartSource::new(url))
    } else if let Some(path) = cfg.datamart_file() {
        warn!(path = %path, "DASH_DATAMART_URL not set, reading datamart from file");
        Arc::new(FileDatamartSource::new(path))
    } else {
        anyhow::bail!("Set DASH_DATAMART_URL (or DASH_DATAMART_FILE for a local JSON file)");
    };

    // --- Loader: single-flight cache with retry/backoff ---
    let options = LoadOptions::new(cfg.retries_or_default(), cfg.base_delay_ms_or_default());
    let loader = Arc::new(
        DatasetLoader::new(source, options).with_recovery_hint(cfg.recovery_hint_or_default()),
    );
    let policy = loader.options();
    info!(
        retries = policy.retries,
        base_delay_ms = policy.base_delay.as_millis() as u64,
        timeout_secs = REQUEST_TIMEOUT.as_secs(),
        "datamart retry policy"
    );

    // --- Services ---
    let dashboard = Arc::new(DashboardService::new(Arc::clone(&loader)));

    let stats: Option<Arc<dyn StatisticsPort>> = cfg.stats_api_url().map(|url| {
        info!(url = %url, "statistics API enabled");
        Arc::new(StatsApiClient::new(url)) as Arc<dyn StatisticsPort>
    });
    let exporter: Arc<dyn ExportPort> = Arc::new(CsvExporter::new());

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        dashboard,
        stats,
        exporter,
        PathBuf::from(cfg.export_dir_or_default()),
    ));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
