//! Prometheus text exposition for enforcement metrics
//!
//! Served at `GET /metrics` by the HTTP API. Scrapes read the cumulative
//! snapshot, so histogram series only ever grow.

use crate::infra::metrics::{
    Metrics, MetricsSummary, METRICS_BUCKET_BOUNDS, METRICS_NUM_BUCKETS,
};
use std::fmt::Write;

/// Prometheus metric type
enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

/// Write a simple metric (counter or gauge) with site label
fn write_metric(
    output: &mut String,
    name: &str,
    help: &str,
    typ: MetricType,
    site: &str,
    val: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {}", typ.as_str());
    let _ = writeln!(output, "{name}{{site=\"{site}\"}} {val}");
}

/// Write a histogram metric with buckets, sum, and count
fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    site: &str,
    buckets: &[u64; METRICS_NUM_BUCKETS],
    bounds: &[u64; 10],
    sum: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} histogram");

    let mut cumulative = 0u64;
    for (i, &bound) in bounds.iter().enumerate() {
        cumulative += buckets[i];
        let _ = writeln!(output, "{name}_bucket{{site=\"{site}\",le=\"{bound}\"}} {cumulative}");
    }
    cumulative += buckets[METRICS_NUM_BUCKETS - 1];
    let _ = writeln!(output, "{name}_bucket{{site=\"{site}\",le=\"+Inf\"}} {cumulative}");

    let count: u64 = buckets.iter().sum();
    let _ = writeln!(output, "{name}_sum{{site=\"{site}\"}} {sum}");
    let _ = writeln!(output, "{name}_count{{site=\"{site}\"}} {count}");
}

/// Format metrics in Prometheus text exposition format
pub fn format_prometheus_metrics(metrics: &Metrics, buffered_records: usize, site_id: &str) -> String {
    let summary = metrics.snapshot(buffered_records);
    let mut output = String::with_capacity(4096);

    write_reading_metrics(&mut output, site_id, &summary);
    write_latency_metrics(&mut output, site_id, &summary);
    write_enforcement_metrics(&mut output, site_id, &summary);
    write_uplink_metrics(&mut output, site_id, &summary);

    output
}

fn write_reading_metrics(output: &mut String, site: &str, summary: &MetricsSummary) {
    write_metric(
        output,
        "speedtrap_readings_total",
        "Total sensor readings processed",
        MetricType::Counter,
        site,
        summary.readings_total,
    );
    let _ = writeln!(output, "# HELP speedtrap_readings_per_sec Mean readings per second since startup");
    let _ = writeln!(output, "# TYPE speedtrap_readings_per_sec gauge");
    let _ = writeln!(
        output,
        "speedtrap_readings_per_sec{{site=\"{site}\"}} {:.2}",
        summary.readings_per_sec
    );
    write_metric(
        output,
        "speedtrap_readings_filtered_total",
        "Readings dropped by zone rules",
        MetricType::Counter,
        site,
        summary.readings_filtered,
    );
    write_metric(
        output,
        "speedtrap_readings_rejected_total",
        "Malformed readings rejected",
        MetricType::Counter,
        site,
        summary.readings_rejected,
    );
    write_metric(
        output,
        "speedtrap_samples_forwarded_total",
        "Samples forwarded past the zone classifier",
        MetricType::Counter,
        site,
        summary.samples_forwarded,
    );
}

fn write_latency_metrics(output: &mut String, site: &str, summary: &MetricsSummary) {
    write_histogram(
        output,
        "speedtrap_pipeline_latency_us",
        "Pipeline evaluation latency in microseconds",
        site,
        &summary.lat_buckets,
        &METRICS_BUCKET_BOUNDS,
        summary.latency_sum_us,
    );
    write_metric(
        output,
        "speedtrap_pipeline_latency_p99_us",
        "99th percentile pipeline latency since startup",
        MetricType::Gauge,
        site,
        summary.lat_p99_us,
    );
    write_metric(
        output,
        "speedtrap_pipeline_latency_max_us",
        "Maximum pipeline latency since startup",
        MetricType::Gauge,
        site,
        summary.max_latency_us,
    );
}

fn write_enforcement_metrics(output: &mut String, site: &str, summary: &MetricsSummary) {
    write_metric(
        output,
        "speedtrap_overspeed_total",
        "Samples at or above the overspeed threshold",
        MetricType::Counter,
        site,
        summary.overspeed_total,
    );
    write_metric(
        output,
        "speedtrap_speed_contexts_total",
        "Overspeed samples escalated to capture control",
        MetricType::Counter,
        site,
        summary.contexts_total,
    );
    write_metric(
        output,
        "speedtrap_capture_start_total",
        "Capture start commands issued",
        MetricType::Counter,
        site,
        summary.capture_starts,
    );
    write_metric(
        output,
        "speedtrap_capture_stop_total",
        "Capture stop commands issued",
        MetricType::Counter,
        site,
        summary.capture_stops,
    );
    write_metric(
        output,
        "speedtrap_violations_total",
        "Violation records packaged",
        MetricType::Counter,
        site,
        summary.records_total,
    );
}

fn write_uplink_metrics(output: &mut String, site: &str, summary: &MetricsSummary) {
    write_metric(
        output,
        "speedtrap_uploads_ok_total",
        "Successful uploads",
        MetricType::Counter,
        site,
        summary.uploads_ok,
    );
    write_metric(
        output,
        "speedtrap_uploads_failed_total",
        "Failed uploads",
        MetricType::Counter,
        site,
        summary.uploads_failed,
    );
    write_metric(
        output,
        "speedtrap_uplink_evictions_total",
        "Records evicted from the uplink holding buffer",
        MetricType::Counter,
        site,
        summary.buffer_evictions,
    );
    write_metric(
        output,
        "speedtrap_uplink_buffered",
        "Records currently held by the uplink",
        MetricType::Gauge,
        site,
        summary.buffered_records as u64,
    );
}
