//! Speed trap - roadside speed enforcement daemon
//!
//! Runs sensor readings through the distance-zone pipeline and serves the
//! ingest, debug and metrics endpoints over HTTP.
//!
//! Module structure:
//! - `domain/` - Value types (readings, contexts, violation records)
//! - `io/` - Collaborators (display, camera, ANPR, uplink, HTTP)
//! - `services/` - Enforcement logic (zones, overspeed, capture, pipeline)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use speedtrap::infra::{Config, Metrics};
use speedtrap::services::EnforcementService;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Speed trap - roadside speed enforcement pipeline
#[derive(Parser, Debug)]
#[command(name = "speedtrap", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config/dev.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    // Default: INFO, use RUST_LOG=debug for stage-level decisions
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!(git_hash = env!("GIT_HASH"), "speedtrap starting");

    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        site = %config.site_id(),
        limit_mph = %config.speed_limit_mph(),
        tolerance_ratio = %config.tolerance_ratio(),
        monitor_floor_m = %config.monitor_floor_m(),
        min_valid_m = %config.min_valid_m(),
        leaving_threshold_m = %config.leaving_threshold_m(),
        max_valid_m = %config.max_valid_m(),
        capture_half_width_m = %config.capture_half_width_m(),
        http_port = %config.http_port(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(Metrics::new());
    let service = Arc::new(EnforcementService::from_config(&config, metrics.clone()));
    info!(threshold_mph = %service.threshold_mph(), "pipeline_ready");

    // Start metrics reporter (lock-free reads with full summary)
    let reporter_service = service.clone();
    let metrics_interval = config.metrics_interval_secs();
    let mut reporter_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let buffered = reporter_service.buffered_records().len();
                    reporter_service.metrics().report(buffered).log();
                }
                _ = reporter_shutdown.changed() => break,
            }
        }
    });

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    // Run HTTP server until shutdown
    if let Err(e) = speedtrap::io::start_http_server(
        config.http_bind_address(),
        config.http_port(),
        service,
        shutdown_rx,
    )
    .await
    {
        tracing::error!(error = %e, "http_server_error");
        return Err(e.to_string().into());
    }

    info!(readings_total = %metrics.readings_total(), "speedtrap shutdown complete");
    Ok(())
}
