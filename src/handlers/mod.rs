pub mod auth_handlers;
pub mod diet_plan_handlers;
pub mod health_handlers;
pub mod profile_handlers;

use actix_web::{middleware::from_fn, web};

use crate::errors::json_error_handler;
use crate::security::middleware::json_guard;

fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_handlers::health))
        .route("/health/detailed", web::get().to(health_handlers::detailed))
        .route("/metrics", web::get().to(health_handlers::metrics))
        .route("/performance", web::get().to(health_handlers::performance));
}

/// Register every route. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler));

    cfg.service(
        web::scope("/api")
            .wrap(from_fn(json_guard))
            .route("/register", web::post().to(auth_handlers::register))
            .route("/login", web::post().to(auth_handlers::login))
            .route("/profile", web::get().to(profile_handlers::show))
            .route("/profile", web::put().to(profile_handlers::update))
            .route("/diet-plan", web::post().to(diet_plan_handlers::generate))
            .route("/diet-plans", web::get().to(diet_plan_handlers::list))
            .route("/diet-plan/{id}", web::get().to(diet_plan_handlers::read))
            .configure(health_routes),
    );
    cfg.configure(health_routes);
}
