//! Ticketeer is a small event ticketing service.
//!
//! Organizers publish events, attendees buy tickets with an email or a nostr
//! key and settle them by scanning a lightning payment QR code.

#![forbid(unsafe_code)]
#![deny(unused_mut)]
pub mod config;
mod database;
pub mod error;
mod event;
mod flash;
mod qr;
mod router;
pub mod telemetry;
mod ticket;
mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::sensitive_headers::{
    SetSensitiveRequestHeadersLayer, SetSensitiveResponseHeadersLayer,
};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: axum::http::Method,
    path: &str,
    body: String,
    cookie: Option<&str>,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// Collect a response body as text.
#[cfg(test)]
pub async fn read_body(response: axum::http::Response<axum::body::Body>) -> String {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub db: database::Database,
    pub events: event::EventRepository,
    pub tickets: ticket::TicketService,
    pub qr: Arc<qr::QrEncoder>,
    pub flash: flash::FlashKey,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire every service on top of `db`.
    pub fn new(
        config: Arc<config::Configuration>,
        db: database::Database,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            events: event::EventRepository::new(db.pool.clone()),
            tickets: ticket::TicketService::new(db.pool.clone()),
            qr: Arc::new(qr::QrEncoder::new(config.storage.qr_path())),
            flash: flash::FlashKey::new(&config.secret),
            config,
            db,
            metrics,
        }
    }

    /// Browser URL of the payment QR image. `version` defeats caching.
    pub fn qr_url(&self, version: i64) -> String {
        format!("/static/{}?v={version}", self.config.storage.qr_file)
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Hide incoming flash cookies before the request span is created.
        .layer(SetSensitiveRequestHeadersLayer::new([header::COOKIE]))
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Outgoing flash cookies must be marked before the response is logged.
        .layer(SetSensitiveResponseHeadersLayer::new([header::SET_COOKIE]))
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)));

    let mut routes = Router::new()
        // `GET /` goes to `index`.
        .route("/", get(router::events::index))
        .route("/event/{id}", get(router::events::detail))
        .route(
            "/create_event",
            get(router::create::form).post(router::create::submit),
        )
        .route(
            "/purchase_ticket/{event_id}",
            get(router::purchase::form).post(router::purchase::submit),
        )
        .route("/generate_qr/{payment_request}", get(router::qr::handler))
        .route("/dashboard", get(router::dashboard::handler));

    if state.metrics.is_some() {
        routes = routes.route("/metrics", get(telemetry::metrics));
    }

    routes
        .nest_service("/static", ServeDir::new(&state.config.storage.directory))
        .fallback(error::not_found)
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    if config.secret == config::DEFAULT_SECRET {
        tracing::warn!("`secret` is not set on `config.yaml`, flash messages can be forged");
    }

    let db = database::Database::new(&config.database.url, config.database.pool_size).await?;
    // no migrations: tables are created when absent.
    db.create_schema().await?;

    // images are written then served from here.
    std::fs::create_dir_all(&config.storage.directory)?;

    let metrics = if config.telemetry.metrics {
        Some(telemetry::setup_metrics_recorder()?)
    } else {
        None
    };

    Ok(AppState::new(config, db, metrics))
}
