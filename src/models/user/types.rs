use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full user row, including the password hash. Never serialize this.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i32,
    pub gender: String,
    pub weight: f64,
    pub height: Option<f64>,
    pub activity_level: Option<String>,
    pub diet_preference: Option<String>,
    pub health_goals: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub gender: String,
    pub weight: f64,
    pub height: Option<f64>,
    pub activity_level: Option<String>,
    pub diet_preference: Option<String>,
    pub health_goals: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id,
            name: u.name,
            email: u.email,
            age: u.age,
            gender: u.gender,
            weight: u.weight,
            height: u.height,
            activity_level: u.activity_level,
            diet_preference: u.diet_preference,
            health_goals: u.health_goals,
            created_at: u.created_at,
        }
    }
}

/// Registration and profile-update body. Which fields are required
/// depends on the validation mode.
#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub activity_level: Option<String>,
    pub diet_preference: Option<String>,
    pub health_goals: Option<String>,
}

/// Validated data for a new user.
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i32,
    pub gender: String,
    pub weight: f64,
    pub height: Option<f64>,
    pub activity_level: String,
    pub diet_preference: String,
    pub health_goals: String,
}

/// Fields to change on a profile; `None` leaves the column as is.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub activity_level: Option<String>,
    pub diet_preference: Option<String>,
    pub health_goals: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}
