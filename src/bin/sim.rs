//! Speed trap simulator - drives one vehicle pass through the pipeline
//!
//! Steps a vehicle from `--start-miles` to `--end-miles` at a constant speed and
//! prints one JSON trace per reading, followed by a pass summary.
//!
//! Usage:
//!   cargo run --bin speedtrap-sim                                   # In-process
//!   cargo run --bin speedtrap-sim -- --url http://127.0.0.1:8080    # Against a daemon
//!   cargo run --bin speedtrap-sim -- --speed-mph 30 --step-miles 0.002

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::Value;
use speedtrap::domain::Reading;
use speedtrap::infra::{Config, Metrics};
use speedtrap::services::EnforcementService;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Upper bound on readings in one simulated pass
const MAX_PASS_READINGS: usize = 1_000_000;

#[derive(Parser, Debug)]
#[command(name = "speedtrap-sim")]
#[command(about = "Simulate a vehicle pass through the speed trap")]
struct Args {
    /// Daemon base URL; runs the pipeline in-process when omitted
    #[arg(long)]
    url: Option<String>,

    /// Config file for in-process mode
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config/dev.toml")]
    config: String,

    /// First distance (miles, negative = approaching)
    #[arg(long, default_value_t = -0.12, allow_hyphen_values = true)]
    start_miles: f64,

    /// Last distance (miles)
    #[arg(long, default_value_t = 0.08, allow_hyphen_values = true)]
    end_miles: f64,

    /// Distance between consecutive readings (miles)
    #[arg(long, default_value_t = 0.005)]
    step_miles: f64,

    /// Constant vehicle speed (mph)
    #[arg(long, default_value_t = 50.0)]
    speed_mph: f64,

    /// Delay between readings (ms)
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,

    /// Only print the pass summary
    #[arg(short, long)]
    quiet: bool,
}

/// Where readings are sent
enum Target {
    InProcess(EnforcementService),
    Http { client: reqwest::Client, url: String },
}

impl Target {
    async fn send(&self, reading: Reading) -> anyhow::Result<Value> {
        match self {
            Target::InProcess(service) => {
                let trace = service.ingest(reading).await?;
                Ok(serde_json::to_value(&trace)?)
            }
            Target::Http { client, url } => {
                let resp = client
                    .post(url)
                    .json(&reading)
                    .send()
                    .await
                    .with_context(|| format!("POST {}", url))?;
                let status = resp.status();
                let body: Value = resp.json().await.context("decode trace")?;
                if !status.is_success() {
                    bail!("daemon returned {}: {}", status, body);
                }
                Ok(body)
            }
        }
    }
}

#[derive(Debug, Default)]
struct PassSummary {
    readings: usize,
    accepted: usize,
    starts: usize,
    stops: usize,
    violations: usize,
    uploads_ok: usize,
}

impl PassSummary {
    fn add(&mut self, trace: &Value) {
        self.readings += 1;
        if trace["accepted"].as_bool() == Some(true) {
            self.accepted += 1;
        }
        match trace["capture_command"].as_str() {
            Some("start") => self.starts += 1,
            Some("stop") => self.stops += 1,
            _ => {}
        }
        if trace.get("violation_record").is_some() {
            self.violations += 1;
        }
        if trace["upload_status"]["success"].as_bool() == Some(true) {
            self.uploads_ok += 1;
        }
    }
}

/// Distances from start to end (inclusive) at a fixed step
fn pass_distances(start: f64, end: f64, step: f64) -> anyhow::Result<Vec<f64>> {
    if !(step.is_finite() && step > 0.0) {
        bail!("step must be positive, got {}", step);
    }
    if !(start.is_finite() && end.is_finite()) || end < start {
        bail!("invalid pass {} -> {}", start, end);
    }

    let steps = ((end - start) / step + 1e-9).floor();
    if steps >= MAX_PASS_READINGS as f64 {
        bail!(
            "pass {} -> {} at step {} exceeds {} readings",
            start,
            end,
            step,
            MAX_PASS_READINGS
        );
    }

    let count = steps as usize + 1;
    Ok((0..count).map(|i| start + step * i as f64).collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    let distances = pass_distances(args.start_miles, args.end_miles, args.step_miles)?;

    let target = match &args.url {
        Some(base) => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .http1_only()
                .build()
                .context("build HTTP client")?;
            let url = format!("{}/api/radar/sample", base.trim_end_matches('/'));
            Target::Http { client, url }
        }
        None => {
            let config = Config::load_from_path(&args.config);
            Target::InProcess(EnforcementService::from_config(&config, Arc::new(Metrics::new())))
        }
    };

    let mut summary = PassSummary::default();
    for distance in distances {
        let trace = target.send(Reading::new(distance, args.speed_mph)).await?;
        summary.add(&trace);
        if !args.quiet {
            println!("{}", trace);
        }
        if args.interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
        }
    }

    eprintln!(
        "pass complete: readings={} accepted={} starts={} stops={} violations={} uploads_ok={}",
        summary.readings,
        summary.accepted,
        summary.starts,
        summary.stops,
        summary.violations,
        summary.uploads_ok
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_distances() {
        let d = pass_distances(-0.02, 0.02, 0.01).unwrap();
        assert_eq!(d.len(), 5);
        assert!((d[4] - 0.02).abs() < 1e-12);
        assert!(pass_distances(0.0, 1.0, 0.0).is_err());
        assert!(pass_distances(1.0, 0.0, 0.1).is_err());
    }

    #[test]
    fn test_pass_distances_rejects_oversized_pass() {
        assert!(pass_distances(-1e300, 1e300, 1e-300).is_err());
        assert!(pass_distances(0.0, 1.0, 1e-7).is_err());

        let d = pass_distances(0.0, 1.0, 1e-6 * 1.000_001).unwrap();
        assert_eq!(d.len(), MAX_PASS_READINGS);
    }

    #[test]
    fn test_summary_counts() {
        let mut s = PassSummary::default();
        s.add(&serde_json::json!({ "accepted": true, "capture_command": "start",
            "violation_record": {}, "upload_status": { "success": true } }));
        s.add(&serde_json::json!({ "accepted": true, "capture_command": "stop" }));
        s.add(&serde_json::json!({ "accepted": false }));

        assert_eq!(s.readings, 3);
        assert_eq!(s.accepted, 2);
        assert_eq!((s.starts, s.stops, s.violations, s.uploads_ok), (1, 1, 1, 1));
    }
}
