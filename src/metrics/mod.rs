//! Metrics module
//!
//! Provides Prometheus metrics for upload URL issuance.

pub mod server;

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Histogram,
};

lazy_static! {
    // Issuance metrics
    pub static ref UPLOAD_URLS_TOTAL: CounterVec = register_counter_vec!(
        "clipdrop_upload_urls_total",
        "Upload URL requests by outcome",
        &["status"]
    ).unwrap();

    pub static ref REJECTED_NAMES_TOTAL: Counter = register_counter!(
        "clipdrop_rejected_names_total",
        "Upload URL requests rejected for an invalid object name"
    ).unwrap();

    pub static ref PRESIGN_DURATION: Histogram = register_histogram!(
        "clipdrop_presign_duration_seconds",
        "Time spent signing an upload URL",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    ).unwrap();

    // HTTP metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "clipdrop_http_requests_total",
        "HTTP requests by route and status code",
        &["route", "status"]
    ).unwrap();

    // Error metrics
    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "clipdrop_errors_total",
        "Total errors",
        &["type"]
    ).unwrap();
}

/// Record an issued upload URL
pub fn record_upload_url_issued() {
    UPLOAD_URLS_TOTAL.with_label_values(&["success"]).inc();
}

/// Record a signing failure
pub fn record_upload_url_failure() {
    UPLOAD_URLS_TOTAL.with_label_values(&["failure"]).inc();
}

/// Record a rejected object name
pub fn record_rejected_name() {
    UPLOAD_URLS_TOTAL.with_label_values(&["rejected"]).inc();
    REJECTED_NAMES_TOTAL.inc();
}

/// Record signing duration
pub fn record_presign_duration(duration_secs: f64) {
    PRESIGN_DURATION.observe(duration_secs);
}

/// Record a served HTTP request
pub fn record_http_request(route: &str, status: u16) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[route, status.as_str()])
        .inc();
}

/// Record an error
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}
