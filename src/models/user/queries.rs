use sqlx::PgPool;

use super::types::{NewUser, ProfileUpdate, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, age, gender, weight, height, \
    activity_level, diet_preference, health_goals, created_at, updated_at";

/// Postgres unique_violation.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .is_some_and(|code| code == "23505")
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Look up by normalized email. Returns the row with its password hash.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

pub async fn create(pool: &PgPool, new: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password_hash, age, gender, weight, height, \
                            activity_level, diet_preference, health_goals) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(new.age)
    .bind(&new.gender)
    .bind(new.weight)
    .bind(new.height)
    .bind(&new.activity_level)
    .bind(&new.diet_preference)
    .bind(&new.health_goals)
    .fetch_one(pool)
    .await
}

/// Apply a partial profile update. Returns `None` if the user is gone.
pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    changes: &ProfileUpdate,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET \
             name = COALESCE($2, name), \
             email = COALESCE($3, email), \
             password_hash = COALESCE($4, password_hash), \
             age = COALESCE($5, age), \
             gender = COALESCE($6, gender), \
             weight = COALESCE($7, weight), \
             height = COALESCE($8, height), \
             activity_level = COALESCE($9, activity_level), \
             diet_preference = COALESCE($10, diet_preference), \
             health_goals = COALESCE($11, health_goals), \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.email)
    .bind(&changes.password_hash)
    .bind(changes.age)
    .bind(&changes.gender)
    .bind(changes.weight)
    .bind(changes.height)
    .bind(&changes.activity_level)
    .bind(&changes.diet_preference)
    .bind(&changes.health_goals)
    .fetch_optional(pool)
    .await
}
