use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::{
        Method,
        header::{HeaderName, HeaderValue},
    },
    middleware::Next,
    web,
};

use super::rate_limit::RequestLimits;
use super::{client_address, is_safe_payload};
use crate::config::AppConfig;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' https://apis.google.com; \
    style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
    font-src 'self' https://fonts.gstatic.com; \
    img-src 'self' data: https:; \
    connect-src 'self' https://generativelanguage.googleapis.com; \
    frame-ancestors 'none'; base-uri 'self'; object-src 'none'";

fn is_mutation(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::DELETE
}

/// Adds the security headers to every response. HSTS only in production.
pub async fn security_headers(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let production = req
        .app_data::<web::Data<AppConfig>>()
        .is_some_and(|c| c.environment.is_production());

    let mut res = next.call(req).await?;
    let headers = res.headers_mut();
    let mut set = |name: &'static str, value: &'static str| {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    };
    set("x-content-type-options", "nosniff");
    set("x-frame-options", "DENY");
    set("referrer-policy", "strict-origin-when-cross-origin");
    set("permissions-policy", "geolocation=(), camera=(), microphone=()");
    set("content-security-policy", CONTENT_SECURITY_POLICY);
    if production {
        set("strict-transport-security", "max-age=31536000; includeSubDomains");
    }
    Ok(res)
}

/// Guard for API mutations.
///
/// POST/PUT/DELETE must carry `Content-Type: application/json`. The body is
/// then inspected and handed back to the handler.
pub async fn json_guard(
    mut req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if is_mutation(req.method()) {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let body = serde_json::json!({
                "error": "Content-Type must be application/json for mutation requests"
            });
            let response = HttpResponse::BadRequest().json(body);
            return Ok(req.into_response(response).map_into_right_body());
        }

        let body = req.extract::<web::Bytes>().await?;
        if !is_safe_payload(&body) {
            log::warn!(
                "Rejected suspicious payload on {} from {}",
                req.path(),
                client_address(req.peer_addr())
            );
            let response = HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid input data"
            }));
            return Ok(req.into_response(response).map_into_right_body());
        }
        req.set_payload(Payload::from(body));
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Per-address request limits: a global cap plus a tighter one on login.
/// Skipped when no `RequestLimits` is registered.
pub async fn request_limits(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if let Some(limits) = req.app_data::<web::Data<RequestLimits>>() {
        let address = client_address(req.peer_addr());
        let is_login = req.method() == Method::POST && req.path() == "/api/login";

        let allowed = limits.global.check_and_record(&address)
            && (!is_login || limits.login.check_and_record(&address));

        if !allowed {
            log::warn!("Request limit exceeded for {address} on {}", req.path());
            let response = HttpResponse::TooManyRequests().json(serde_json::json!({
                "error": "Rate limit exceeded. Please try again later."
            }));
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}
