use actix_web::{HttpResponse, web};
use chrono::{Days, Utc};
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::errors::AppError;
use crate::models::diet_plan::{self, NewDietPlan};
use crate::models::user;
use crate::planner::{GeminiClient, PlanProfile, plan_total_calories};

/// POST /api/diet-plan: generate and store a one-week plan.
pub async fn generate(
    pool: web::Data<PgPool>,
    planner: web::Data<GeminiClient>,
    auth: AuthUser,
) -> Result<HttpResponse, AppError> {
    let owner = user::find_by_id(&pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let profile = PlanProfile::from(&owner);
    let plan_data = planner.generate_plan(&profile).await?;

    let start_date = Utc::now().date_naive();
    let end_date = start_date
        .checked_add_days(Days::new(6))
        .unwrap_or(start_date);

    let new = NewDietPlan {
        user_id: owner.id,
        plan_name: profile.plan_name(),
        start_date,
        end_date,
        total_calories: plan_total_calories(&plan_data),
        plan_data,
    };
    let created = diet_plan::create(&pool, &new).await?;

    log::info!("Generated diet plan {} for user {}", created.id, owner.id);
    Ok(HttpResponse::Created().json(created))
}

/// GET /api/diet-plans
pub async fn list(pool: web::Data<PgPool>, auth: AuthUser) -> Result<HttpResponse, AppError> {
    let plans = diet_plan::find_for_user(&pool, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(plans))
}

/// GET /api/diet-plan/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let plan = diet_plan::find_owned(&pool, path.into_inner(), auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Diet plan not found".to_string()))?;
    Ok(HttpResponse::Ok().json(plan))
}
