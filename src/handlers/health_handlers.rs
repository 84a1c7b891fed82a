use actix_web::{HttpResponse, web};
use chrono::Utc;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::monitoring::{self, ApplicationMonitor};
use crate::planner::GeminiClient;

async fn build_report(
    monitor: &ApplicationMonitor,
    pool: &PgPool,
    config: &AppConfig,
    planner: &GeminiClient,
) -> monitoring::HealthReport {
    monitoring::health_report(monitor, pool, config.environment.as_str(), planner.is_configured()).await
}

/// GET /health. 503 when a dependency is down.
pub async fn health(
    monitor: web::Data<ApplicationMonitor>,
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    planner: web::Data<GeminiClient>,
) -> Result<HttpResponse, AppError> {
    let report = build_report(&monitor, &pool, &config, &planner).await;
    if report.is_healthy() {
        Ok(HttpResponse::Ok().json(report))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(report))
    }
}

/// GET /health/detailed. Always 200.
pub async fn detailed(
    monitor: web::Data<ApplicationMonitor>,
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    planner: web::Data<GeminiClient>,
) -> Result<HttpResponse, AppError> {
    let report = build_report(&monitor, &pool, &config, &planner).await;
    Ok(HttpResponse::Ok().json(report))
}

/// GET /metrics, Prometheus text format.
pub async fn metrics(monitor: web::Data<ApplicationMonitor>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(monitor.prometheus())
}

/// GET /performance
pub async fn performance(monitor: web::Data<ApplicationMonitor>) -> HttpResponse {
    HttpResponse::Ok().json(monitor.profiler.report())
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Resource not found",
        "status": 404,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
