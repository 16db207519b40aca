//! Prometheus metrics for the template preview service.
//!
//! This module provides metrics for monitoring rendering:
//! - Render counts and latency by channel and renderer
//! - Render failures by reason
//! - Preview data fallbacks to the sample payload
//! - Superseded live-preview renders
//! - Live preview sessions and idle evictions
//! - Stored template count

mod helpers;

pub use helpers::{encode_metrics, PreviewMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "ara_preview";

lazy_static! {
    /// Total renders by channel and renderer kind
    pub static ref RENDERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_renders_total", METRIC_PREFIX),
        "Total template renders",
        &["channel", "renderer"]
    ).unwrap();

    /// Renders that ended in an error block
    pub static ref RENDER_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_render_failures_total", METRIC_PREFIX),
        "Template renders that produced an error block",
        &["reason"]
    ).unwrap();

    /// Render latency by renderer kind
    pub static ref RENDER_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        format!("{}_render_duration_seconds", METRIC_PREFIX),
        "Template render latency in seconds",
        &["renderer"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 3.0]
    ).unwrap();

    /// Preview data replaced by the sample payload
    pub static ref PAYLOAD_FALLBACKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_payload_fallbacks_total", METRIC_PREFIX),
        "Preview data that could not be used and fell back to the sample payload",
        &["reason"]
    ).unwrap();

    /// Live-preview renders dropped because a newer request was issued
    pub static ref SUPERSEDED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_superseded_total", METRIC_PREFIX),
        "Live preview renders dropped as superseded"
    ).unwrap();

    /// Live preview sessions currently held
    pub static ref PREVIEW_SESSIONS: IntGauge = register_int_gauge!(
        format!("{}_sessions", METRIC_PREFIX),
        "Live preview sessions currently held"
    ).unwrap();

    /// Preview sessions evicted after going idle
    pub static ref SESSIONS_EVICTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_sessions_evicted_total", METRIC_PREFIX),
        "Live preview sessions evicted after going idle"
    ).unwrap();

    /// Number of stored templates
    pub static ref TEMPLATES_TOTAL: IntGauge = register_int_gauge!(
        format!("{}_templates_total", METRIC_PREFIX),
        "Number of stored templates"
    ).unwrap();
}
