use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::auth::password;
use crate::auth::validate::{self, Mode};
use crate::errors::AppError;
use crate::models::user::{self, ProfileUpdate, UserPayload, UserResponse};

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// GET /api/profile
pub async fn show(pool: web::Data<PgPool>, auth: AuthUser) -> Result<HttpResponse, AppError> {
    let found = user::find_by_id(&pool, auth.user_id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(found)))
}

/// PUT /api/profile
pub async fn update(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    body: web::Json<UserPayload>,
) -> Result<HttpResponse, AppError> {
    let mut payload = body.into_inner();
    let errors = validate::validate_user_payload(&mut payload, Mode::Update);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let current = user::find_by_id(&pool, auth.user_id)
        .await?
        .ok_or_else(user_not_found)?;

    if let Some(email) = &payload.email {
        if *email != current.email && user::email_exists(&pool, email).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
    }

    let password_hash = match payload.password.take() {
        Some(pw) => Some(password::hash_password_blocking(pw).await?),
        None => None,
    };

    let changes = ProfileUpdate {
        name: payload.name,
        email: payload.email,
        password_hash,
        age: payload.age,
        gender: payload.gender,
        weight: payload.weight,
        height: payload.height,
        activity_level: payload.activity_level,
        diet_preference: payload.diet_preference,
        health_goals: payload.health_goals,
    };

    let updated = match user::update_profile(&pool, auth.user_id, &changes).await {
        Ok(Some(u)) => u,
        Ok(None) => return Err(user_not_found()),
        Err(e) if user::is_unique_violation(&e) => {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    log::info!("Profile updated for user {}", updated.id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Profile updated successfully",
        "user": UserResponse::from(updated),
    })))
}
