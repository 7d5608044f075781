use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// On unless `OBSERVABILITY_ENABLED` is `false` or `0`.
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep loop. `Ok(None)` when
/// observability is off.
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
        )?
        .install_recorder()?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(10));
        loop {
            ticker.tick().await;
            upkeep.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Bucket label for `http_responses_total`.
fn status_class(status: u16) -> &'static str {
    match status / 100 {
        1 => "1xx",
        2 => "2xx",
        3 => "3xx",
        4 => "4xx",
        5 => "5xx",
        _ => "other",
    }
}

/// Route template for labels, so `/api/courses/{id}` stays one series.
/// Unmatched requests share a single label.
fn route_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string())
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let route = route_label(&req);
    let in_flight = gauge!("http_requests_in_flight");
    in_flight.increment(1.0);
    let started = Instant::now();

    let response = next.run(req).await;

    in_flight.decrement(1.0);
    let status = response.status().as_u16();
    histogram!("http_request_duration_seconds", "method" => method.clone(), "route" => route.clone())
        .record(started.elapsed().as_secs_f64());
    counter!(
        "http_responses_total",
        "method" => method,
        "route" => route,
        "class" => status_class(status)
    )
    .increment(1);

    response
}

/// Router for the separate metrics listener.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Business counters

pub fn track_user_registered(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_registered_total", "role" => role.to_string()).increment(1);
}

pub fn track_login_success(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => role.to_string(), "status" => "success").increment(1);
}

pub fn track_login_failure(reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => "unknown", "status" => "failure", "reason" => reason)
        .increment(1);
}

pub fn track_course_created(status: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("courses_created_total", "status" => status.to_string()).increment(1);
}

pub fn track_exam_submitted(score: i32, total: i32) {
    if !is_observability_enabled() {
        return;
    }
    counter!("exam_submissions_total").increment(1);
    if total > 0 {
        histogram!("exam_score_ratio").record(f64::from(score) / f64::from(total));
    }
}

pub fn track_payment(mode: &str, status: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("fee_payments_total", "mode" => mode.to_string(), "status" => status.to_string())
        .increment(1);
}

pub fn track_leave_decision(status: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("leave_decisions_total", "status" => status.to_string()).increment(1);
}

pub fn track_notifications_sent(recipients: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("notifications_sent_total").increment(1);
    counter!("notification_recipients_total").increment(recipients as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classes() {
        assert_eq!(status_class(201), "2xx");
        assert_eq!(status_class(409), "4xx");
        assert_eq!(status_class(503), "5xx");
        assert_eq!(status_class(99), "other");
    }

    #[test]
    fn unmatched_requests_share_a_label() {
        let req = Request::builder()
            .uri("/api/courses/123")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(route_label(&req), "unmatched");
    }
}
