use std::rc::Rc;
use std::time::{Duration, Instant};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use once_cell::sync::Lazy;
use prometheus::core::Collector;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, TextEncoder};

use crate::domain::models::NotificationKind;

const HTTP_LABELS: &[&str] = &["method", "path", "status"];
const UNMATCHED_PATH: &str = "unmatched";

/// Register with the default registry; metric names are static, so a
/// failure here is a programming error.
fn registered<M>(metric: prometheus::Result<M>) -> M
where
    M: Collector + Clone + 'static,
{
    let metric = metric.expect("valid metric definition");
    prometheus::default_registry()
        .register(Box::new(metric.clone()))
        .expect("metric registered once");
    metric
}

fn kind_counter(name: &str, help: &str) -> IntCounterVec {
    registered(IntCounterVec::new(Opts::new(name, help), &["kind"]))
}

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    registered(IntCounterVec::new(
        Opts::new(
            "social_service_http_requests_total",
            "Total HTTP requests handled by social-service",
        ),
        HTTP_LABELS,
    ))
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    registered(HistogramVec::new(
        HistogramOpts::new(
            "social_service_http_request_duration_seconds",
            "HTTP request latency for social-service",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        HTTP_LABELS,
    ))
});

static NOTIFICATIONS_EMITTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    kind_counter(
        "social_service_notifications_emitted_total",
        "Notifications written to a recipient's outbox",
    )
});

static NOTIFICATIONS_FAILED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    kind_counter(
        "social_service_notifications_failed_total",
        "Notification writes that failed and were dropped",
    )
});

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

pub fn record_notification_emitted(kind: NotificationKind) {
    NOTIFICATIONS_EMITTED_TOTAL
        .with_label_values(&[kind.as_str()])
        .inc();
}

pub fn record_notification_failed(kind: NotificationKind) {
    NOTIFICATIONS_FAILED_TOTAL
        .with_label_values(&[kind.as_str()])
        .inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

/// Records request count and latency per route pattern
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let result = service.call(req).await;
            let elapsed = start.elapsed();
            match &result {
                Ok(response) => {
                    // Route pattern (e.g. /post/{id}/like) is only known after routing
                    let path = response
                        .request()
                        .match_pattern()
                        .unwrap_or_else(|| UNMATCHED_PATH.to_string());
                    observe_http_request(&method, &path, response.status().as_u16(), elapsed);
                }
                Err(_) => {
                    observe_http_request(&method, UNMATCHED_PATH, 500, elapsed);
                }
            }
            result
        })
    }
}
