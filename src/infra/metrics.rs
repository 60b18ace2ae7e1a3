//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counter updates are lock-free; reporting is the only operation
//! that needs synchronization (via atomic swap).
//!
//! Latency is kept twice: a periodic window that `report()` swaps out for
//! the log line, and a cumulative histogram that `snapshot()` reads without
//! resetting for Prometheus scrapes.
//!
//! NOTE: All atomics use Relaxed ordering. These are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Prometheus-style exponential bucket boundaries (microseconds)
/// Buckets: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200
const BUCKET_BOUNDS: [u64; 10] = [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Load all buckets without resetting them
#[inline]
fn load_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    std::array::from_fn(|i| buckets[i].load(Ordering::Relaxed))
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    // Upper bounds for each bucket (last bucket uses 2x the previous bound)
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200, 102400];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
///
/// All recording operations are lock-free using atomics.
/// The `report()` method atomically swaps periodic counters to get a consistent snapshot.
pub struct Metrics {
    /// Readings received (monotonic)
    readings_total: AtomicU64,
    /// Readings since last report (reset on report)
    readings_since_report: AtomicU64,
    /// Readings dropped by zone rules (monotonic)
    readings_filtered: AtomicU64,
    /// Malformed readings rejected (monotonic)
    readings_rejected: AtomicU64,
    /// Samples forwarded past the zone classifier (monotonic)
    samples_forwarded: AtomicU64,
    /// Samples whose status was overspeed (monotonic)
    overspeed_total: AtomicU64,
    /// Speed contexts handed to capture control (monotonic)
    contexts_total: AtomicU64,
    /// Start capture commands (monotonic)
    capture_starts: AtomicU64,
    /// Stop capture commands (monotonic)
    capture_stops: AtomicU64,
    /// Violation records packaged (monotonic)
    records_total: AtomicU64,
    /// Successful uploads (monotonic)
    uploads_ok: AtomicU64,
    /// Failed uploads (monotonic)
    uploads_failed: AtomicU64,
    /// Records evicted from the uplink holding buffer (monotonic)
    buffer_evictions: AtomicU64,
    /// Sum of pipeline latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max pipeline latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Pipeline latency histogram buckets (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Sum of all pipeline latencies in microseconds (monotonic)
    latency_total_sum_us: AtomicU64,
    /// Max pipeline latency since startup (monotonic)
    latency_total_max_us: AtomicU64,
    /// Cumulative pipeline latency histogram (monotonic)
    latency_total_buckets: [AtomicU64; NUM_BUCKETS],
    started_at: Instant,
    /// Last report time (only accessed from reporter, not atomic)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            readings_total: AtomicU64::new(0),
            readings_since_report: AtomicU64::new(0),
            readings_filtered: AtomicU64::new(0),
            readings_rejected: AtomicU64::new(0),
            samples_forwarded: AtomicU64::new(0),
            overspeed_total: AtomicU64::new(0),
            contexts_total: AtomicU64::new(0),
            capture_starts: AtomicU64::new(0),
            capture_stops: AtomicU64::new(0),
            records_total: AtomicU64::new(0),
            uploads_ok: AtomicU64::new(0),
            uploads_failed: AtomicU64::new(0),
            buffer_evictions: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_total_sum_us: AtomicU64::new(0),
            latency_total_max_us: AtomicU64::new(0),
            latency_total_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            started_at: Instant::now(),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record a reading was processed with given latency (lock-free)
    #[inline]
    pub fn record_reading(&self, latency_us: u64) {
        self.readings_total.fetch_add(1, Ordering::Relaxed);
        self.readings_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_total_sum_us.fetch_add(latency_us, Ordering::Relaxed);

        let bucket = bucket_index(latency_us);
        self.latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);
        self.latency_total_buckets[bucket].fetch_add(1, Ordering::Relaxed);

        update_atomic_max(&self.latency_max_us, latency_us);
        update_atomic_max(&self.latency_total_max_us, latency_us);
    }

    #[inline]
    pub fn record_filtered(&self) {
        self.readings_filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.readings_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sample(&self, overspeed: bool) {
        self.samples_forwarded.fetch_add(1, Ordering::Relaxed);
        if overspeed {
            self.overspeed_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_context(&self) {
        self.contexts_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_capture_start(&self) {
        self.capture_starts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_capture_stop(&self) {
        self.capture_stops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_violation(&self) {
        self.records_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_upload(&self, success: bool) {
        if success {
            self.uploads_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.uploads_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_buffer_eviction(&self) {
        self.buffer_evictions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn readings_total(&self) -> u64 {
        self.readings_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn capture_stops(&self) -> u64 {
        self.capture_stops.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_total(&self) -> u64 {
        self.records_total.load(Ordering::Relaxed)
    }

    /// Calculate and return metrics summary, then reset periodic counters
    ///
    /// This is the only method that resets counters. It uses atomic swap
    /// to get a consistent snapshot while allowing concurrent updates.
    pub fn report(&self, buffered_records: usize) -> MetricsSummary {
        let readings_count = self.readings_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let readings_per_sec = if elapsed.as_secs_f64() > 0.0 {
            readings_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let avg_latency = if readings_count > 0 { latency_sum / readings_count } else { 0 };

        self.summary(
            readings_per_sec,
            buffered_records,
            latency_sum,
            avg_latency,
            max_latency,
            lat_buckets,
        )
    }

    /// Cumulative view for scrapes; leaves the periodic window untouched
    ///
    /// The histogram, sum and max cover everything since startup, and the
    /// rate is the mean since startup.
    pub fn snapshot(&self, buffered_records: usize) -> MetricsSummary {
        let lat_buckets = load_buckets(&self.latency_total_buckets);
        let count: u64 = lat_buckets.iter().sum();
        let latency_sum = self.latency_total_sum_us.load(Ordering::Relaxed);
        let avg_latency = if count > 0 { latency_sum / count } else { 0 };

        let uptime = self.started_at.elapsed().as_secs_f64();
        let readings_per_sec =
            if uptime > 0.0 { self.readings_total() as f64 / uptime } else { 0.0 };

        self.summary(
            readings_per_sec,
            buffered_records,
            latency_sum,
            avg_latency,
            self.latency_total_max_us.load(Ordering::Relaxed),
            lat_buckets,
        )
    }

    fn summary(
        &self,
        readings_per_sec: f64,
        buffered_records: usize,
        latency_sum_us: u64,
        avg_latency_us: u64,
        max_latency_us: u64,
        lat_buckets: [u64; NUM_BUCKETS],
    ) -> MetricsSummary {
        MetricsSummary {
            readings_total: self.readings_total.load(Ordering::Relaxed),
            readings_per_sec,
            readings_filtered: self.readings_filtered.load(Ordering::Relaxed),
            readings_rejected: self.readings_rejected.load(Ordering::Relaxed),
            samples_forwarded: self.samples_forwarded.load(Ordering::Relaxed),
            overspeed_total: self.overspeed_total.load(Ordering::Relaxed),
            contexts_total: self.contexts_total.load(Ordering::Relaxed),
            capture_starts: self.capture_starts.load(Ordering::Relaxed),
            capture_stops: self.capture_stops.load(Ordering::Relaxed),
            records_total: self.records_total.load(Ordering::Relaxed),
            uploads_ok: self.uploads_ok.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            buffer_evictions: self.buffer_evictions.load(Ordering::Relaxed),
            buffered_records,
            latency_sum_us,
            avg_latency_us,
            max_latency_us,
            lat_buckets,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p95_us: percentile_from_buckets(&lat_buckets, 0.95),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of histogram buckets (exported for formatting)
pub const METRICS_NUM_BUCKETS: usize = NUM_BUCKETS;

/// Exported bucket bounds for Prometheus formatting
pub const METRICS_BUCKET_BOUNDS: [u64; 10] = BUCKET_BOUNDS;

#[derive(Debug)]
pub struct MetricsSummary {
    pub readings_total: u64,
    pub readings_per_sec: f64,
    pub readings_filtered: u64,
    pub readings_rejected: u64,
    pub samples_forwarded: u64,
    pub overspeed_total: u64,
    pub contexts_total: u64,
    pub capture_starts: u64,
    pub capture_stops: u64,
    pub records_total: u64,
    pub uploads_ok: u64,
    pub uploads_failed: u64,
    pub buffer_evictions: u64,
    /// Records currently held by the uplink (snapshot)
    pub buffered_records: usize,
    pub latency_sum_us: u64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
    /// Pipeline latency histogram buckets
    /// Bounds: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200 µs
    pub lat_buckets: [u64; NUM_BUCKETS],
    pub lat_p50_us: u64,
    pub lat_p95_us: u64,
    pub lat_p99_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            readings_total = %self.readings_total,
            readings_per_sec = format!("{:.1}", self.readings_per_sec),
            filtered = %self.readings_filtered,
            rejected = %self.readings_rejected,
            overspeed = %self.overspeed_total,
            capture_starts = %self.capture_starts,
            capture_stops = %self.capture_stops,
            records = %self.records_total,
            uploads_ok = %self.uploads_ok,
            uploads_failed = %self.uploads_failed,
            buffered = %self.buffered_records,
            p99_us = %self.lat_p99_us,
            "metrics"
        );
    }
}
