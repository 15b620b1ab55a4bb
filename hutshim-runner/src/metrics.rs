//! Runner metrics definitions
//!
//! OpenTelemetry instruments for the request loop, prefixed `hutshim.shim.*`.
//! Enabled with `ShimBuilder::with_metrics()`; outbound calls are counted by
//! the client's own `ClientMetrics` on the same meter name.
//!
//! # Metrics Collected
//!
//! - **requests_total**: Requests served, by method and status (counter)
//! - **request_duration**: Time from request read to response written (histogram)
//! - **errors_total**: Error responses, by code (counter)
//! - **hook_failures_total**: Failed lifecycle hooks, by hook (counter)
//!
//! # Examples
//!
//! ```rust,no_run
//! use hutshim_runner::ShimMetrics;
//!
//! let metrics = ShimMetrics::new("image-resizer");
//! metrics.record_request("Default.add", "success", 0.004);
//! metrics.record_error(-32602);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Request loop metrics
pub struct ShimMetrics {
    /// Total number of requests served
    pub requests_total: Counter<u64>,
    /// Request handling duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of error responses
    pub errors_total: Counter<u64>,
    /// Total number of failed lifecycle hooks
    pub hook_failures_total: Counter<u64>,
}

impl ShimMetrics {
    /// Create metrics on the global meter named after the service
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("hutshim.shim.requests.total")
                .with_description("Total number of requests served")
                .build(),
            request_duration: meter
                .f64_histogram("hutshim.shim.request.duration")
                .with_description("Request handling duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("hutshim.shim.errors.total")
                .with_description("Total number of error responses written")
                .build(),
            hook_failures_total: meter
                .u64_counter("hutshim.shim.hook_failures.total")
                .with_description("Total number of failed lifecycle hooks")
                .build(),
        }
    }

    /// Record one served request
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error response by code
    pub fn record_error(&self, code: i32) {
        self.errors_total
            .add(1, &[KeyValue::new("code", i64::from(code))]);
    }

    /// Record a failed lifecycle hook
    pub fn record_hook_failure(&self, hook: &'static str) {
        self.hook_failures_total
            .add(1, &[KeyValue::new("hook", hook)]);
    }
}
