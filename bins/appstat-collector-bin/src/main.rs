use appstat_collector::{FileRowFetcher, InfoCollector, PeriodicTask, METRIC_FAMILY};
use appstat_monitor::{LogReporter, MetricsRegistry, Reporter};
use clap::Parser;
use std::sync::Arc;

mod config;

use config::AppConfig;

/// Periodic application statistics collector
#[derive(Parser, Debug)]
#[command(name = "appstat-collector", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "appstat-collector.toml")]
    config: String,

    /// Print the default configuration and exit
    #[arg(long)]
    dump_default_config: bool,
}

/// Wait for CTRL+C or SIGTERM.
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("Received CTRL+C");
        }
        _ = sigterm.recv() => { tracing::info!("Received SIGTERM"); }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.dump_default_config {
        print!("{}", toml::to_string_pretty(&AppConfig::default())?);
        return Ok(());
    }

    let config = AppConfig::load(&args.config)?;
    let _log_guard = appstat_logging::init_logging(&config.log)?;

    tracing::info!(
        config = %args.config,
        cluster = %config.collector.cluster,
        "Starting app stat collector"
    );

    let registry = Arc::new(MetricsRegistry::new());
    let fetcher = Arc::new(FileRowFetcher::new(
        &config.fetch.snapshot_path,
        config.collector.meta_server_addrs()?,
    ));
    let collector = InfoCollector::new(config.collector.clone(), fetcher, registry.clone())?;
    collector.start()?;

    let report_task = config.report.interval().map(|interval| {
        let registry = registry.clone();
        let reporter = LogReporter::only_family(METRIC_FAMILY);
        PeriodicTask::start("metrics-report", interval, move || {
            let registry = registry.clone();
            let reporter = reporter.clone();
            async move {
                reporter.report(&registry.collect());
            }
        })
    });

    wait_for_shutdown_signal().await?;
    tracing::info!("App stat collector shutting down");

    collector.stop().await;
    if let Some(task) = report_task {
        task.stop().await;
    }

    Ok(())
}
