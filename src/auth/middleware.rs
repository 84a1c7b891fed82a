use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};

use crate::auth::token::TokenService;
use crate::errors::AppError;

/// Authenticated caller, taken from the `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(tokens) = req.app_data::<web::Data<TokenService>>() else {
            log::error!("TokenService not registered as app data");
            return ready(Err(AppError::Unauthorized));
        };
        let result = bearer_token(req)
            .ok_or(AppError::Unauthorized)
            .and_then(|token| tokens.verify(token))
            .map(|user_id| AuthUser { user_id });
        ready(result)
    }
}
