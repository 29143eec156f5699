use dashmap::DashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::version::ApiVersion;

/// Middleware collecting Prometheus-compatible negotiation metrics
///
/// All counters are atomics; per-version counts live in a `DashMap` so concurrent
/// requests never contend on a single lock.
///
/// Metrics collected:
/// - Total request count and average latency
/// - Outcome counts: handled, bad request (400), not found (404), not acceptable (406),
///   handler failure (5xx)
/// - Requests per effective version
#[derive(Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    handled: AtomicUsize,
    bad_request: AtomicUsize,
    not_found: AtomicUsize,
    not_acceptable: AtomicUsize,
    server_errors: AtomicUsize,
    by_version: DashMap<ApiVersion, u64>,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub request_count: usize,
    pub handled: usize,
    pub bad_request: usize,
    pub not_found: usize,
    pub not_acceptable: usize,
    pub server_errors: usize,
    /// Sorted by version
    pub by_version: Vec<(ApiVersion, u64)>,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean processing time across all requests; zero before the first request
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut by_version: Vec<(ApiVersion, u64)> = self
            .by_version
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        by_version.sort_unstable();
        MetricsSnapshot {
            request_count: self.request_count.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            bad_request: self.bad_request.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            not_acceptable: self.not_acceptable.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            by_version,
        }
    }

    /// Render the counters in Prometheus text exposition format
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let snap = self.snapshot();
        let mut out = format!(
            "# HELP microversion_requests_total Total number of dispatched requests\n\
             # TYPE microversion_requests_total counter\n\
             microversion_requests_total {}\n\
             # HELP microversion_request_latency_seconds Average request latency in seconds\n\
             # TYPE microversion_request_latency_seconds gauge\n\
             microversion_request_latency_seconds {}\n\
             # HELP microversion_outcomes_total Requests by negotiation outcome\n\
             # TYPE microversion_outcomes_total counter\n\
             microversion_outcomes_total{{outcome=\"handled\"}} {}\n\
             microversion_outcomes_total{{outcome=\"bad_request\"}} {}\n\
             microversion_outcomes_total{{outcome=\"not_found\"}} {}\n\
             microversion_outcomes_total{{outcome=\"not_acceptable\"}} {}\n\
             microversion_outcomes_total{{outcome=\"server_error\"}} {}\n\
             # HELP microversion_version_requests_total Requests by effective version\n\
             # TYPE microversion_version_requests_total counter\n",
            snap.request_count,
            self.average_latency().as_secs_f64(),
            snap.handled,
            snap.bad_request,
            snap.not_found,
            snap.not_acceptable,
            snap.server_errors,
        );
        for (version, count) in &snap.by_version {
            let _ = writeln!(
                out,
                "microversion_version_requests_total{{version=\"{version}\"}} {count}"
            );
        }
        out
    }
}

impl Middleware for MetricsMiddleware {
    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);

        let counter = match res.status {
            400 => &self.bad_request,
            404 => &self.not_found,
            406 => &self.not_acceptable,
            s if s >= 500 => &self.server_errors,
            _ => &self.handled,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Some(version) = res.api_version {
            *self.by_version.entry(version).or_insert(0) += 1;
        }
    }
}
