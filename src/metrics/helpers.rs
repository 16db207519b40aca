//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    PAYLOAD_FALLBACKS_TOTAL, PREVIEW_SESSIONS, RENDERS_TOTAL, RENDER_DURATION_SECONDS,
    RENDER_FAILURES_TOTAL, SESSIONS_EVICTED_TOTAL, SUPERSEDED_TOTAL, TEMPLATES_TOTAL,
};
use crate::template::Channel;

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording preview metrics
pub struct PreviewMetrics;

impl PreviewMetrics {
    /// Record a completed render and its latency
    pub fn record_render(channel: Channel, renderer: &str, elapsed: Duration) {
        RENDERS_TOTAL
            .with_label_values(&[channel.as_str(), renderer])
            .inc();
        RENDER_DURATION_SECONDS
            .with_label_values(&[renderer])
            .observe(elapsed.as_secs_f64());
    }

    /// Record a render that produced an error block
    pub fn record_render_failure(reason: &str) {
        RENDER_FAILURES_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record preview data replaced by the sample payload
    pub fn record_payload_fallback(reason: &str) {
        PAYLOAD_FALLBACKS_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a superseded live-preview render
    pub fn record_superseded() {
        SUPERSEDED_TOTAL.inc();
    }

    /// Record idle preview sessions evicted by a sweep
    pub fn record_sessions_evicted(count: usize) {
        SESSIONS_EVICTED_TOTAL.inc_by(count as u64);
    }

    /// Set the live preview session count
    pub fn set_sessions(count: usize) {
        PREVIEW_SESSIONS.set(count as i64);
    }

    /// Set the stored template count
    pub fn set_templates(count: usize) {
        TEMPLATES_TOTAL.set(count as i64);
    }
}
