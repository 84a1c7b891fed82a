//! Diet plan generation: the user profile, the prompt sent to the model,
//! and recovery of the plan JSON from its reply.

pub mod gemini;

use serde_json::Value;

use crate::models::user::User;
use crate::nutrition::{calculate_bmr, calculate_tdee};

pub use gemini::GeminiClient;

/// Inputs to a plan, with defaults filled in for unset profile fields.
#[derive(Debug, Clone)]
pub struct PlanProfile {
    pub age: i32,
    pub gender: String,
    pub weight: f64,
    pub height: f64,
    pub activity_level: String,
    pub diet_preference: String,
    pub health_goals: String,
}

impl From<&User> for PlanProfile {
    fn from(u: &User) -> Self {
        fn or_default(v: &Option<String>, default: &str) -> String {
            v.as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(default)
                .to_string()
        }
        PlanProfile {
            age: u.age,
            gender: u.gender.clone(),
            weight: u.weight,
            height: u.height.unwrap_or(170.0),
            activity_level: or_default(&u.activity_level, "moderate"),
            diet_preference: or_default(&u.diet_preference, "balanced"),
            health_goals: or_default(&u.health_goals, "Maintain healthy weight"),
        }
    }
}

impl PlanProfile {
    pub fn daily_calories(&self) -> i64 {
        let bmr = calculate_bmr(self.weight, self.height, self.age, &self.gender);
        calculate_tdee(bmr, &self.activity_level)
    }

    /// e.g. "1-Week Low_Carb Diet Plan".
    pub fn plan_name(&self) -> String {
        format!("1-Week {} Diet Plan", title_case(&self.diet_preference))
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

pub fn build_prompt(profile: &PlanProfile, tdee: i64) -> String {
    format!(
        r#"Create a detailed 1-week diet plan for a {age}-year-old {gender} person.

User Details:
- Weight: {weight} kg
- Height: {height} cm
- Activity Level: {activity}
- Diet Preference: {pref}
- Health Goals: {goals}
- Daily Calorie Target: {tdee} calories

Requirements:
1. Create a 7-day meal plan with breakfast, lunch, dinner, and 2 snacks
2. Each meal should include specific foods, portions, and calorie counts
3. Ensure the plan is {pref} friendly
4. Include nutritional information (protein, carbs, fat) for each meal
5. Provide variety and ensure meals are practical and easy to prepare
6. Consider the health goals mentioned

Return the response as a JSON object with the following structure:
{{
    "total_calories_per_day": {tdee},
    "daily_plans": [
        {{
            "day": "Day 1",
            "date": "YYYY-MM-DD",
            "meals": [
                {{
                    "meal_type": "breakfast",
                    "meal_name": "Meal Name",
                    "foods": [
                        {{"name": "Food Item", "portion": "100g", "calories": 150, "protein": 10, "carbs": 20, "fat": 5}}
                    ],
                    "total_calories": 300,
                    "total_protein": 15,
                    "total_carbs": 25,
                    "total_fat": 8
                }}
            ]
        }}
    ]
}}

Make sure the JSON is valid and well-formatted."#,
        age = profile.age,
        gender = profile.gender,
        weight = profile.weight,
        height = profile.height,
        activity = profile.activity_level,
        pref = profile.diet_preference,
        goals = profile.health_goals,
    )
}

/// Pull the plan object out of model output. Anything between the first
/// `{` and the last `}` is tried as JSON; if that fails the raw text is kept
/// alongside an empty plan.
pub fn parse_plan_response(text: &str, tdee: i64) -> Value {
    let parsed = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Value>(&text[start..=end]).ok()
        }
        _ => None,
    };

    match parsed {
        Some(plan @ Value::Object(_)) => plan,
        _ => {
            log::warn!("Model reply was not valid plan JSON; storing raw response");
            serde_json::json!({
                "total_calories_per_day": tdee,
                "daily_plans": [],
                "raw_response": text,
            })
        }
    }
}

/// Calories per day claimed by the plan, 2000 if absent.
pub fn plan_total_calories(plan: &Value) -> i32 {
    plan.get("total_calories_per_day")
        .and_then(Value::as_f64)
        .map(|c| c.round() as i32)
        .unwrap_or(2000)
}
