use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DietPlan {
    pub id: i64,
    pub user_id: i64,
    pub plan_name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_calories: Option<i32>,
    pub plan_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

pub struct NewDietPlan {
    pub user_id: i64,
    pub plan_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_calories: i32,
    pub plan_data: serde_json::Value,
}
