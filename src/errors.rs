use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Hash(String),
    Token(String),
    /// The generative-AI call failed or returned nothing usable.
    Upstream(String),
    Validation(Vec<String>),
    Conflict(String),
    NotFound(String),
    Unauthorized,
    InvalidCredentials,
    RateLimited,
}

/// JSON error body shared by every endpoint.
#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Token(e) => write!(f, "Token error: {e}"),
            AppError::Upstream(e) => write!(f, "Diet plan generation failed: {e}"),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join("; ")),
            AppError::Conflict(msg) | AppError::NotFound(msg) => write!(f, "{msg}"),
            AppError::Unauthorized => write!(f, "Authentication required"),
            AppError::InvalidCredentials => write!(f, "Invalid email or password"),
            AppError::RateLimited => write!(f, "Too many login attempts. Please try again later."),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Db(_) | AppError::Hash(_) | AppError::Token(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Db(_) | AppError::Hash(_) | AppError::Token(_) => {
                log::error!("{self}");
                ApiErrorResponse { error: "Internal server error".to_string(), details: None }
            }
            AppError::Upstream(_) => {
                log::error!("{self}");
                ApiErrorResponse { error: "Failed to generate diet plan".to_string(), details: None }
            }
            AppError::Validation(errors) => ApiErrorResponse {
                error: errors.first().cloned().unwrap_or_else(|| "Invalid input data".to_string()),
                details: (errors.len() > 1).then(|| errors.join("; ")),
            },
            _ => ApiErrorResponse { error: self.to_string(), details: None },
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

/// Map malformed or wrongly typed JSON bodies to a 400 with our error shape.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    log::debug!("Rejected JSON body: {err}");
    AppError::Validation(vec!["Invalid JSON body".to_string()]).into()
}
