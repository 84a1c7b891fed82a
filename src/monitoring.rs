//! Request accounting, slow-request profiling and health reporting.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use actix_web::{
    Error,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

const SLOW_REQUEST: Duration = Duration::from_secs(1);
const SLOW_REQUESTS_KEPT: usize = 100;
const SLOW_REQUESTS_REPORTED: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct SlowRequest {
    pub endpoint: String,
    pub method: String,
    pub execution_time: f64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct PerformanceReport {
    pub slow_requests: Vec<SlowRequest>,
    pub request_count: usize,
}

/// Keeps the most recent slow requests.
#[derive(Default)]
pub struct PerformanceProfiler {
    slow_requests: Mutex<VecDeque<SlowRequest>>,
}

impl PerformanceProfiler {
    pub fn profile_request(&self, endpoint: &str, method: &str, elapsed: Duration) {
        if elapsed <= SLOW_REQUEST {
            return;
        }
        let mut slow = self.slow_requests.lock().unwrap_or_else(|e| e.into_inner());
        slow.push_back(SlowRequest {
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            execution_time: elapsed.as_secs_f64(),
            timestamp: Utc::now().to_rfc3339(),
        });
        while slow.len() > SLOW_REQUESTS_KEPT {
            slow.pop_front();
        }
    }

    pub fn report(&self) -> PerformanceReport {
        let slow = self.slow_requests.lock().unwrap_or_else(|e| e.into_inner());
        let skip = slow.len().saturating_sub(SLOW_REQUESTS_REPORTED);
        PerformanceReport {
            slow_requests: slow.iter().skip(skip).cloned().collect(),
            request_count: slow.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppMetrics {
    pub uptime_seconds: f64,
    pub request_count: u64,
    pub error_count: u64,
    pub error_rate: f64,
    pub requests_per_hour: f64,
}

/// Process-wide request counters.
pub struct ApplicationMonitor {
    started: Instant,
    requests: AtomicU64,
    errors: AtomicU64,
    pub profiler: PerformanceProfiler,
}

impl Default for ApplicationMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationMonitor {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            profiler: PerformanceProfiler::default(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn record(&self, status: u16, endpoint: &str, method: &str, elapsed: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if status >= 400 {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        if elapsed > SLOW_REQUEST {
            log::warn!("Slow request: {method} {endpoint} took {:.2}s", elapsed.as_secs_f64());
        }
        self.profiler.profile_request(endpoint, method, elapsed);
    }

    pub fn metrics(&self) -> AppMetrics {
        let uptime = self.uptime().as_secs_f64();
        let requests = self.requests.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let uptime_hours = (uptime / 3600.0).max(0.01);
        AppMetrics {
            uptime_seconds: round2(uptime),
            request_count: requests,
            error_count: errors,
            error_rate: round2(errors as f64 / requests.max(1) as f64 * 100.0),
            requests_per_hour: round2(requests as f64 / uptime_hours),
        }
    }

    /// Prometheus text exposition of `metrics()`.
    pub fn prometheus(&self) -> String {
        let m = self.metrics();
        [
            ("uptime_seconds", m.uptime_seconds.to_string()),
            ("request_count", m.request_count.to_string()),
            ("error_count", m.error_count.to_string()),
            ("error_rate", m.error_rate.to_string()),
            ("requests_per_hour", m.requests_per_hour.to_string()),
        ]
        .iter()
        .map(|(key, value)| format!("diet_planner_{key} {value}"))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Counts every request and profiles slow ones.
pub async fn track_requests(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let monitor = req.app_data::<web::Data<ApplicationMonitor>>().cloned();
    let endpoint = req.path().to_string();
    let method = req.method().to_string();
    let start = Instant::now();

    let res = next.call(req).await?;
    if let Some(monitor) = monitor {
        monitor.record(res.status().as_u16(), &endpoint, &method, start.elapsed());
    }
    Ok(res)
}

#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: CheckStatus,
    pub external_services: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: f64,
    pub version: &'static str,
    pub environment: &'static str,
    pub checks: HealthChecks,
    pub metrics: AppMetrics,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

async fn check_database(pool: &PgPool) -> CheckStatus {
    let start = Instant::now();
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => CheckStatus {
            status: "healthy",
            response_time_ms: Some(round2(start.elapsed().as_secs_f64() * 1000.0)),
            error: None,
        },
        Err(e) => {
            log::error!("Database health check failed: {e}");
            CheckStatus {
                status: "unhealthy",
                response_time_ms: None,
                error: Some(e.to_string()),
            }
        }
    }
}

pub async fn health_report(
    monitor: &ApplicationMonitor,
    pool: &PgPool,
    environment: &'static str,
    ai_configured: bool,
) -> HealthReport {
    let database = check_database(pool).await;
    let status = if database.status == "healthy" { "healthy" } else { "unhealthy" };
    let now = Utc::now().to_rfc3339();

    let gemini = if ai_configured {
        serde_json::json!({ "status": "healthy", "last_checked": now })
    } else {
        serde_json::json!({ "status": "unhealthy", "error": "GEMINI_API_KEY not configured", "last_checked": now })
    };

    HealthReport {
        status,
        timestamp: now,
        uptime: monitor.uptime().as_secs_f64(),
        version: env!("CARGO_PKG_VERSION"),
        environment,
        checks: HealthChecks {
            database,
            external_services: serde_json::json!({ "gemini_ai": gemini }),
        },
        metrics: monitor.metrics(),
    }
}
