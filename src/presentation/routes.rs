//! Route definitions and server setup

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, ServerConfig};
use crate::presentation::{
    controllers::{
        documents::{get_certificate, get_report},
        health::{get_stats, health_check},
        scan::{AppState, get_scan, submit_scan},
    },
    middleware::logging_middleware,
    models::*,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::scan::submit_scan,
        crate::presentation::controllers::scan::get_scan,
        crate::presentation::controllers::documents::get_certificate,
        crate::presentation::controllers::documents::get_report,
        crate::presentation::controllers::health::get_stats,
        crate::presentation::controllers::health::health_check
    ),
    components(
        schemas(
            ScanRequest,
            ScanSubmittedResponse,
            ScanJobResponse,
            ProbeOutcomeDto,
            CertificateResponse,
            ReportResponse,
            ProbeReportDto,
            StatsResponse,
            ScoreDistributionDto,
            ErrorResponse,
            ErrorDetail,
            HealthResponse
        )
    ),
    tags(
        (name = "scan", description = "Scan submission and polling"),
        (name = "documents", description = "Certificate and report documents for finished scans"),
        (name = "stats", description = "Aggregate platform statistics"),
        (name = "health", description = "System health monitoring")
    ),
    info(
        title = "SiteAudit API",
        version = "0.1.0",
        description = "Web site security audit API. Runs SSL, port, header, CMS and DDoS-mitigation probes concurrently against a target and aggregates them into one composite security score with a verifiable certificate.",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

/// Create the application router with the middleware stack
pub fn create_router(app_state: AppState, config: &Config) -> Router {
    let api_routes = Router::new()
        .route("/scan", post(submit_scan))
        .route("/scan/{scan_id}", get(get_scan))
        .route("/certificate/{scan_id}", get(get_certificate))
        .route("/report/{scan_id}", get(get_report))
        .route("/stats", get(get_stats));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check));

    if config.server.enable_docs {
        router = router
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.server))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_seconds,
                )))
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(app_state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}
