//! Energy expenditure estimates used to size a diet plan.

/// Basal metabolic rate (Mifflin-St Jeor), kcal/day.
pub fn calculate_bmr(weight_kg: f64, height_cm: f64, age: i32, gender: &str) -> i64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    let bmr = if gender.eq_ignore_ascii_case("male") { base + 5.0 } else { base - 161.0 };
    bmr.round_ties_even() as i64
}

pub fn activity_multiplier(activity_level: &str) -> f64 {
    match activity_level.to_lowercase().as_str() {
        "sedentary" => 1.2,
        "light" => 1.375,
        "moderate" => 1.55,
        "active" => 1.725,
        "very_active" => 1.9,
        _ => 1.55,
    }
}

/// Total daily energy expenditure, kcal/day.
pub fn calculate_tdee(bmr: i64, activity_level: &str) -> i64 {
    (bmr as f64 * activity_multiplier(activity_level)).round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmr_by_gender() {
        // 10*70 + 6.25*175 - 5*30 = 1643.75, +5 for male
        assert_eq!(calculate_bmr(70.0, 175.0, 30, "male"), 1649);
        assert_eq!(calculate_bmr(70.0, 175.0, 30, "Male"), 1649);
        assert_eq!(calculate_bmr(70.0, 175.0, 30, "female"), 1483);
        assert_eq!(calculate_bmr(70.0, 175.0, 30, "other"), 1483);
    }

    #[test]
    fn halves_round_to_even() {
        // 1642.5 and 1476.5
        assert_eq!(calculate_bmr(70.0, 174.0, 30, "male"), 1642);
        assert_eq!(calculate_bmr(70.0, 174.0, 30, "female"), 1476);
        // Default height: 1612.5
        assert_eq!(calculate_bmr(70.0, 170.0, 31, "male"), 1612);
        // 1004 * 1.375 = 1380.5
        assert_eq!(calculate_tdee(1004, "light"), 1380);
    }

    #[test]
    fn tdee_multipliers() {
        assert_eq!(calculate_tdee(1000, "sedentary"), 1200);
        assert_eq!(calculate_tdee(1000, "light"), 1375);
        assert_eq!(calculate_tdee(1000, "very_active"), 1900);
        assert_eq!(calculate_tdee(1000, "unknown"), 1550);
    }
}
