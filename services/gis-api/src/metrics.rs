//! Application metrics collection and reporting.

use metrics::{counter, histogram};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;

/// Metrics collector for the gateway.
#[derive(Debug)]
pub struct MetricsCollector {
    /// Request counts
    pub api_requests: AtomicU64,
    pub wms_requests: AtomicU64,
    pub upstream_errors: AtomicU64,

    /// Per-endpoint timing stats (stored as microseconds)
    endpoint_times: RwLock<HashMap<&'static str, TimingStats>>,

    /// Start time for uptime calculation
    start_time: Instant,
}

#[derive(Debug, Default, Clone)]
struct TimingStats {
    count: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
    last_us: u64,
}

impl TimingStats {
    fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        self.last_us = duration_us;
        if self.min_us == 0 || duration_us < self.min_us {
            self.min_us = duration_us;
        }
        if duration_us > self.max_us {
            self.max_us = duration_us;
        }
    }

    fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.total_us as f64 / self.count as f64) / 1000.0
        }
    }
}

/// Timing summary for one endpoint, in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointTimings {
    pub count: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub last_ms: f64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            api_requests: AtomicU64::new(0),
            wms_requests: AtomicU64::new(0),
            upstream_errors: AtomicU64::new(0),
            endpoint_times: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record a JSON API request
    pub fn record_api_request(&self) {
        self.api_requests.fetch_add(1, Ordering::Relaxed);
        counter!("api_requests_total").increment(1);
    }

    /// Record a WMS/WFS passthrough request
    pub fn record_wms_request(&self) {
        self.wms_requests.fetch_add(1, Ordering::Relaxed);
        counter!("wms_requests_total").increment(1);
    }

    /// Record an upstream GeoServer failure
    pub fn record_upstream_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
        counter!("upstream_errors_total").increment(1);
    }

    /// Record how long an endpoint took, including upstream time.
    pub async fn record_timing(&self, endpoint: &'static str, duration_us: u64) {
        histogram!("request_duration_ms", "endpoint" => endpoint)
            .record(duration_us as f64 / 1000.0);

        let mut times = self.endpoint_times.write().await;
        times.entry(endpoint).or_default().record(duration_us);
    }

    /// Seconds since the collector was created.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Per-endpoint timing summaries for the performance endpoint.
    pub async fn endpoint_timings(&self) -> HashMap<String, EndpointTimings> {
        let times = self.endpoint_times.read().await;
        times
            .iter()
            .map(|(endpoint, stats)| {
                (
                    endpoint.to_string(),
                    EndpointTimings {
                        count: stats.count,
                        avg_ms: stats.avg_ms(),
                        min_ms: stats.min_us as f64 / 1000.0,
                        max_ms: stats.max_us as f64 / 1000.0,
                        last_ms: stats.last_us as f64 / 1000.0,
                    },
                )
            })
            .collect()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
