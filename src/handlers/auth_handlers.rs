use actix_web::{HttpRequest, HttpResponse, web};
use sqlx::PgPool;

use crate::auth::throttle::LoginThrottle;
use crate::auth::token::TokenService;
use crate::auth::validate::{self, Mode};
use crate::auth::password;
use crate::errors::AppError;
use crate::models::user::{self, LoginRequest, NewUser, UserPayload, UserResponse};
use crate::security::client_address;

fn new_user_from(payload: UserPayload, password_hash: String) -> Result<NewUser, AppError> {
    let missing = |field: &str| AppError::Validation(vec![format!("Missing required field: {field}")]);
    Ok(NewUser {
        name: payload.name.ok_or_else(|| missing("name"))?,
        email: payload.email.ok_or_else(|| missing("email"))?,
        password_hash,
        age: payload.age.ok_or_else(|| missing("age"))?,
        gender: payload.gender.ok_or_else(|| missing("gender"))?,
        weight: payload.weight.ok_or_else(|| missing("weight"))?,
        height: payload.height,
        activity_level: payload.activity_level.unwrap_or_else(|| "moderate".to_string()),
        diet_preference: payload.diet_preference.unwrap_or_else(|| "balanced".to_string()),
        health_goals: payload.health_goals.unwrap_or_default(),
    })
}

/// POST /api/register
pub async fn register(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    body: web::Json<UserPayload>,
) -> Result<HttpResponse, AppError> {
    let mut payload = body.into_inner();
    let errors = validate::validate_user_payload(&mut payload, Mode::Create);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let email = payload.email.clone().unwrap_or_default();
    if user::email_exists(&pool, &email).await? {
        return Err(AppError::Conflict("User with this email already exists".to_string()));
    }

    let plain = payload.password.take().unwrap_or_default();
    let hashed = password::hash_password_blocking(plain).await?;
    let new = new_user_from(payload, hashed)?;

    let created = match user::create(&pool, &new).await {
        Ok(u) => u,
        Err(e) if user::is_unique_violation(&e) => {
            return Err(AppError::Conflict("User with this email already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let access_token = tokens.issue(created.id)?;
    log::info!("Registered user {} ({})", created.id, created.email);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "User registered successfully",
        "access_token": access_token,
        "user": UserResponse::from(created),
    })))
}

/// POST /api/login
///
/// The throttle is consulted before any credential check. Password
/// verification happens with no throttle lock held.
pub async fn login(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    throttle: web::Data<LoginThrottle>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = body.into_inner();
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::Validation(vec!["Email and password are required".to_string()]));
    };

    let identifier = validate::normalize_email(&email);
    let address = client_address(req.peer_addr());

    if !throttle.check_allowed(&identifier, &address) {
        log::warn!("Rate limit exceeded for login attempt: {identifier} from {address}");
        return Err(AppError::RateLimited);
    }

    let Some(found) = user::find_by_email(&pool, &identifier).await? else {
        throttle.record_failed_attempt(&identifier, &address);
        log::warn!("Login attempt for non-existent user: {identifier} from {address}");
        return Err(AppError::InvalidCredentials);
    };

    let verified = password::verify_password_blocking(password, found.password_hash.clone()).await?;
    if !verified {
        throttle.record_failed_attempt(&identifier, &address);
        log::warn!("Failed login attempt for user: {identifier} from {address}");
        return Err(AppError::InvalidCredentials);
    }

    let access_token = tokens.issue(found.id)?;
    log::info!("Successful login for user: {identifier} from {address}");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Login successful",
        "access_token": access_token,
        "user": UserResponse::from(found),
    })))
}
