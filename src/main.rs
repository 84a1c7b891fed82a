use std::io;
use std::time::Duration;

use actix_web::{App, HttpServer, middleware, middleware::from_fn, web};

use dietplan::auth::throttle::LoginThrottle;
use dietplan::auth::token::TokenService;
use dietplan::config::AppConfig;
use dietplan::monitoring::{ApplicationMonitor, track_requests};
use dietplan::planner::GeminiClient;
use dietplan::security::middleware::{request_limits, security_headers};
use dietplan::security::rate_limit::RequestLimits;
use dietplan::{db, handlers};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env();
    let report = config.validate();
    for warning in &report.warnings {
        log::warn!("Configuration warning: {warning}");
    }
    for error in &report.errors {
        log::error!("Configuration error: {error}");
    }
    if !report.errors.is_empty() && config.environment.is_production() {
        return Err(io::Error::other("Invalid configuration for production environment"));
    }

    let database_url = config
        .database_url
        .clone()
        .unwrap_or_else(|| "postgres://localhost/dietplan".to_string());
    let pool = db::init_pool(&database_url).await.map_err(io::Error::other)?;
    db::run_migrations(&pool).await.map_err(io::Error::other)?;

    let tokens = web::Data::new(TokenService::new(
        &config.jwt_secret_or_generate(),
        config.environment.token_ttl_secs(),
    ));
    let throttle = web::Data::new(LoginThrottle::with_system_clock(config.throttle));
    let planner = web::Data::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    ));
    let monitor = web::Data::new(ApplicationMonitor::new());
    let limits = web::Data::new(RequestLimits::default());
    let pool = web::Data::new(pool);

    // Idle request-limit keys, stale login failures and expired blocks are
    // otherwise kept forever.
    {
        let limits = limits.clone();
        let throttle = throttle.clone();
        actix_web::rt::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                limits.global.sweep();
                limits.login.sweep();
                throttle.sweep(throttle.now());
            }
        });
    }

    let bind_addr = config.bind_addr.clone();
    log::info!(
        "Starting diet planner API ({}) at http://{bind_addr}",
        config.environment.as_str()
    );
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(request_limits))
            .wrap(from_fn(security_headers))
            .wrap(from_fn(track_requests))
            .wrap(middleware::Logger::default())
            .app_data(pool.clone())
            .app_data(tokens.clone())
            .app_data(throttle.clone())
            .app_data(planner.clone())
            .app_data(monitor.clone())
            .app_data(limits.clone())
            .app_data(config.clone())
            .configure(handlers::configure)
            .default_service(web::to(handlers::health_handlers::not_found))
    })
    .bind(bind_addr)?
    .run()
    .await
}
