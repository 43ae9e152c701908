//! Prometheus metrics: the `/metrics` endpoint, HTTP request tracking and
//! booking counters.

use anyhow::Context;
use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const BOOKINGS_TOTAL: &str = "hotel_bookings_total";
pub const PROMO_REDEMPTIONS_TOTAL: &str = "hotel_promo_redemptions_total";
pub const PENDING_REQUESTS: &str = "hotel_pending_booking_requests";

/// Install the Prometheus recorder. Call once at startup.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests received");
    describe_histogram!(HTTP_REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
    describe_counter!(BOOKINGS_TOTAL, "Guest bookings created, by kind");
    describe_counter!(
        PROMO_REDEMPTIONS_TOTAL,
        "Promo code redemption attempts, by outcome"
    );
    describe_gauge!(PENDING_REQUESTS, "Meeting hall booking requests still marked New");

    Ok(handle)
}

/// GET /metrics
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    update_gauge_metrics(&state).await;

    match state.metrics_handle.as_ref() {
        Some(h) => (StatusCode::OK, h.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics not initialized".to_string(),
        ),
    }
}

async fn update_gauge_metrics(state: &AppState) {
    if let Ok(count) =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM booking_requests WHERE status = 'New'")
            .fetch_one(&state.db)
            .await
    {
        gauge!(PENDING_REQUESTS).set(count as f64);
    }
}

/// Records request count and latency per matched route
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

pub fn record_booking_created(kind: &'static str) {
    counter!(BOOKINGS_TOTAL, "kind" => kind).increment(1);
}

/// `outcome` is `redeemed` or a promo rejection code
pub fn record_promo_redemption(outcome: &'static str) {
    counter!(PROMO_REDEMPTIONS_TOTAL, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(HTTP_REQUESTS_TOTAL.ends_with("_total"));
        assert!(BOOKINGS_TOTAL.ends_with("_total"));
        assert!(PROMO_REDEMPTIONS_TOTAL.ends_with("_total"));
        assert!(HTTP_REQUEST_DURATION_SECONDS.ends_with("_seconds"));
    }
}
