//! Prometheus metrics for the engine.
//!
//! All metrics follow the naming convention: `gw_<subsystem>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // BLOCK INGESTION METRICS (Subsystem 2)
    // =========================================================================

    /// Block rows inserted by discovery walks
    pub static ref BLOCKS_INSERTED: Counter = Counter::new(
        "gw_ingestion_blocks_inserted_total",
        "Total number of block rows inserted by discovery walks"
    ).expect("metric creation failed");

    /// Blocks inserted per walk
    pub static ref WALK_DEPTH: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "gw_ingestion_walk_depth_blocks",
            "Blocks inserted by a single discovery walk"
        ).buckets(exponential_buckets(1.0, 2.0, 10).expect("bucket layout"))
    ).expect("metric creation failed");

    /// Walks stopped at a branch too deep below the best height
    pub static ref FORK_DEPTH_ABORTS: Counter = Counter::new(
        "gw_ingestion_fork_depth_aborts_total",
        "Discovery walks stopped by the maximum fork depth"
    ).expect("metric creation failed");

    /// Blocks fully parsed
    pub static ref BLOCKS_PARSED: Counter = Counter::new(
        "gw_ingestion_blocks_parsed_total",
        "Total number of blocks parsed"
    ).expect("metric creation failed");

    /// Block parse duration
    pub static ref PARSE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "gw_ingestion_parse_duration_seconds",
            "Time spent parsing one block"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("bucket layout"))
    ).expect("metric creation failed");

    /// Unparsed blocks re-queued by the maintenance sweep
    pub static ref BLOCKS_REQUEUED: Counter = Counter::new(
        "gw_ingestion_blocks_requeued_total",
        "Blocks re-queued by the maintenance sweep"
    ).expect("metric creation failed");

    /// Merkle-proof notifications emitted
    pub static ref MERKLE_NOTIFICATIONS: Counter = Counter::new(
        "gw_ingestion_merkle_notifications_total",
        "Merkle-proof notifications emitted"
    ).expect("metric creation failed");

    // =========================================================================
    // DOUBLE-SPEND METRICS (Subsystem 3)
    // =========================================================================

    /// Double-spend notifications emitted
    pub static ref DOUBLE_SPENDS: CounterVec = CounterVec::new(
        Opts::new("gw_double_spend_notifications_total", "Double-spend notifications emitted"),
        &["kind"]  // kind: block/pool
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Signals whose handling failed
    pub static ref SIGNAL_FAILURES: CounterVec = CounterVec::new(
        Opts::new("gw_signal_failures_total", "Failed signal handlings by signal type"),
        &["signal"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry. Calling it again is a
/// no-op.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Ingestion
        Box::new(BLOCKS_INSERTED.clone()),
        Box::new(WALK_DEPTH.clone()),
        Box::new(FORK_DEPTH_ABORTS.clone()),
        Box::new(BLOCKS_PARSED.clone()),
        Box::new(PARSE_DURATION.clone()),
        Box::new(BLOCKS_REQUEUED.clone()),
        Box::new(MERKLE_NOTIFICATIONS.clone()),
        // Double spends
        Box::new(DOUBLE_SPENDS.clone()),
        // Errors
        Box::new(SIGNAL_FAILURES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
