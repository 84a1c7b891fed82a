use std::sync::LazyLock;

use regex::Regex;

use crate::models::user::UserPayload;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

pub const GENDERS: &[&str] = &["male", "female", "other"];
pub const ACTIVITY_LEVELS: &[&str] = &["sedentary", "light", "moderate", "active", "very_active"];
pub const DIET_PREFERENCES: &[&str] = &[
    "balanced",
    "vegetarian",
    "vegan",
    "keto",
    "paleo",
    "mediterranean",
    "low_carb",
    "high_protein",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Registration: every core field must be present.
    Create,
    /// Profile update: anything may be omitted.
    Update,
}

/// Normalized form of an account identifier.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email: 5-255 chars, user@domain.tld shape.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("Email cannot be empty".to_string());
    }
    if let Some(err) = validate_length(trimmed, "Email", 5, 255) {
        return Some(err);
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Some("Please enter a valid email address".to_string());
    }
    None
}

/// Validate a password: 6-100 chars. Not trimmed.
pub fn validate_password(password: &str) -> Option<String> {
    if password.trim().is_empty() {
        return Some("Password cannot be empty".to_string());
    }
    validate_length(password, "Password", 6, 100)
}

fn validate_length(value: &str, field_name: &str, min: usize, max: usize) -> Option<String> {
    let len = value.chars().count();
    if len < min {
        return Some(format!("{field_name} must be at least {min} characters long"));
    }
    if len > max {
        return Some(format!("{field_name} must be at most {max} characters long"));
    }
    None
}

fn validate_range<T>(value: T, field_name: &str, min: T, max: T, unit: &str) -> Option<String>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min {
        return Some(format!("{field_name} must be at least {min}{unit}"));
    }
    if value > max {
        return Some(format!("{field_name} must be at most {max}{unit}"));
    }
    None
}

/// Trim and lower-case a choice field, then check it against `allowed`.
fn validate_choice(value: &mut String, field_name: &str, allowed: &[&str]) -> Option<String> {
    *value = value.trim().to_lowercase();
    if allowed.contains(&value.as_str()) {
        None
    } else {
        Some(format!("{field_name} must be one of: {}", allowed.join(", ")))
    }
}

/// Trim a required text field in place; empty values are reported.
fn validate_required_text(
    value: &mut Option<String>,
    field_name: &str,
    mode: Mode,
) -> Result<bool, String> {
    match value {
        None if mode == Mode::Create => Err(format!("Missing required field: {}", field_name.to_lowercase())),
        None => Ok(false),
        Some(v) => {
            *v = v.trim().to_string();
            if v.is_empty() {
                Err(format!("{field_name} cannot be empty"))
            } else {
                Ok(true)
            }
        }
    }
}

/// Drop optional text fields that are blank.
fn blank_to_none(value: &mut Option<String>) {
    if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
        *value = None;
    }
}

/// Validate and normalize a user payload in place.
///
/// Strings are trimmed, choice fields lower-cased, the email normalized,
/// and blank optional fields cleared. Returns every problem found.
pub fn validate_user_payload(payload: &mut UserPayload, mode: Mode) -> Vec<String> {
    let mut errors = Vec::new();

    match validate_required_text(&mut payload.name, "Name", mode) {
        Ok(true) => {
            if let Some(name) = &payload.name {
                errors.extend(validate_length(name, "Name", 2, 100));
            }
        }
        Ok(false) => {}
        Err(e) => errors.push(e),
    }

    match validate_required_text(&mut payload.email, "Email", mode) {
        Ok(true) => {
            if let Some(email) = &mut payload.email {
                match validate_email(email) {
                    Some(e) => errors.push(e),
                    None => *email = normalize_email(email),
                }
            }
        }
        Ok(false) => {}
        Err(e) => errors.push(e),
    }

    if mode == Mode::Update && payload.password.as_deref().is_some_and(str::is_empty) {
        payload.password = None;
    }
    match &payload.password {
        Some(pw) => errors.extend(validate_password(pw)),
        None if mode == Mode::Create => errors.push("Missing required field: password".to_string()),
        None => {}
    }

    match payload.age {
        Some(age) => errors.extend(validate_range(age, "Age", 1, 120, "")),
        None if mode == Mode::Create => errors.push("Missing required field: age".to_string()),
        None => {}
    }

    match validate_required_text(&mut payload.gender, "Gender", mode) {
        Ok(true) => {
            if let Some(gender) = &mut payload.gender {
                errors.extend(validate_choice(gender, "Gender", GENDERS));
            }
        }
        Ok(false) => {}
        Err(e) => errors.push(e),
    }

    match payload.weight {
        Some(w) if !w.is_finite() => errors.push("Weight must be a valid number".to_string()),
        Some(w) => errors.extend(validate_range(w, "Weight", 20.0, 300.0, "")),
        None if mode == Mode::Create => errors.push("Missing required field: weight".to_string()),
        None => {}
    }

    match payload.height {
        Some(h) if !h.is_finite() => errors.push("Height must be a valid number".to_string()),
        Some(h) => errors.extend(validate_range(h, "Height", 100.0, 250.0, " cm")),
        None => {}
    }

    blank_to_none(&mut payload.health_goals);
    if let Some(goals) = &mut payload.health_goals {
        *goals = goals.trim().to_string();
        if goals.chars().count() > 500 {
            errors.push("Health Goals must be at most 500 characters long".to_string());
        }
    }

    blank_to_none(&mut payload.activity_level);
    if let Some(level) = &mut payload.activity_level {
        errors.extend(validate_choice(level, "Activity Level", ACTIVITY_LEVELS));
    }

    blank_to_none(&mut payload.diet_preference);
    if let Some(pref) = &mut payload.diet_preference {
        errors.extend(validate_choice(pref, "Diet Preference", DIET_PREFERENCES));
    }

    errors
}
