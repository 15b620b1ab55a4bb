//! Client metrics definitions
//!
//! OpenTelemetry instruments for outbound runtime calls. Recorded only when a
//! client is built with `ClientBuilder::with_metrics()`; exported wherever the
//! global meter provider sends them.
//!
//! # Metrics Collected
//!
//! - **calls_total**: Outbound calls by method and status (counter)
//! - **call_duration**: Outbound call latency in seconds (histogram)

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Outbound call metrics
pub struct ClientMetrics {
    /// Total number of outbound calls
    pub calls_total: Counter<u64>,
    /// Outbound call duration in seconds
    pub call_duration: Histogram<f64>,
}

impl ClientMetrics {
    /// Create metrics on the global meter named after the service
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            calls_total: meter
                .u64_counter("hutshim.client.calls.total")
                .with_description("Total number of runtime calls issued")
                .build(),
            call_duration: meter
                .f64_histogram("hutshim.client.call.duration")
                .with_description("Runtime call duration in seconds")
                .build(),
        }
    }

    /// Record one completed call
    ///
    /// `status` is one of "success", "rejected" (platform error reply) or
    /// "error" (transport or decoding failure).
    pub fn record_call(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.calls_total.add(1, attributes);
        self.call_duration.record(duration_secs, attributes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_provider() {
        // The default global provider is a no-op; recording must not panic.
        let metrics = ClientMetrics::new("test-client");
        metrics.record_call("put_file", "success", 0.01);
        metrics.record_call("put_file", "error", 0.02);
    }
}
