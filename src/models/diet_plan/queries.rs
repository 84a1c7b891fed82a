use sqlx::PgPool;

use super::types::{DietPlan, NewDietPlan};

const PLAN_COLUMNS: &str =
    "id, user_id, plan_name, start_date, end_date, total_calories, plan_data, created_at";

pub async fn create(pool: &PgPool, new: &NewDietPlan) -> Result<DietPlan, sqlx::Error> {
    sqlx::query_as::<_, DietPlan>(&format!(
        "INSERT INTO diet_plans (user_id, plan_name, start_date, end_date, total_calories, plan_data) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {PLAN_COLUMNS}"
    ))
    .bind(new.user_id)
    .bind(&new.plan_name)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.total_calories)
    .bind(&new.plan_data)
    .fetch_one(pool)
    .await
}

/// All plans owned by `user_id`, newest first.
pub async fn find_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<DietPlan>, sqlx::Error> {
    sqlx::query_as::<_, DietPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM diet_plans WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// A plan, only if it belongs to `user_id`.
pub async fn find_owned(
    pool: &PgPool,
    plan_id: i64,
    user_id: i64,
) -> Result<Option<DietPlan>, sqlx::Error> {
    sqlx::query_as::<_, DietPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM diet_plans WHERE id = $1 AND user_id = $2"
    ))
    .bind(plan_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
