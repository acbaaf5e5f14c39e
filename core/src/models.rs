use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CALORIE_GOAL: u32 = 2000;
pub const DEFAULT_WEEKLY_WORKOUT_GOAL: u32 = 5;

/// Suggested workout categories. Any non-empty label is accepted.
pub const WORKOUT_TYPES: &[&str] = &[
    "strength", "cardio", "hiit", "yoga", "pilates", "swimming", "running", "cycling",
];

/// Suggested meal categories. Any non-empty label is accepted.
pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner", "snack"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Minutes.
    pub duration: u32,
    /// Burned once the workout is completed.
    pub calories: u32,
    #[serde(rename = "type")]
    pub workout_type: String,
    pub completed: bool,
    pub workout_date: NaiveDate,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub meal_type: String,
    pub meal_date: NaiveDate,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub display_name: Option<String>,
    /// Centimetres.
    pub height: Option<u32>,
    /// Kilograms.
    pub weight: Option<f64>,
    pub target_weight: Option<f64>,
    #[serde(default = "default_calorie_goal")]
    pub daily_calorie_goal: u32,
    #[serde(default = "default_weekly_workout_goal")]
    pub weekly_workout_goal: u32,
    pub created_at: String,
    pub updated_at: String,
}

fn default_calorie_goal() -> u32 {
    DEFAULT_CALORIE_GOAL
}

fn default_weekly_workout_goal() -> u32 {
    DEFAULT_WEEKLY_WORKOUT_GOAL
}

/// Insert payload for a workout. The owning user is injected at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewWorkout {
    pub name: String,
    pub duration: u32,
    pub calories: u32,
    #[serde(rename = "type")]
    pub workout_type: String,
    pub completed: bool,
    pub workout_date: NaiveDate,
}

impl NewWorkout {
    /// A not-yet-completed workout dated `date`.
    #[must_use]
    pub fn planned(
        name: impl Into<String>,
        duration: u32,
        calories: u32,
        workout_type: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            duration,
            calories,
            workout_type: workout_type.into(),
            completed: false,
            workout_date: date,
        }
    }
}

/// Insert payload for a meal. The owning user is injected at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMeal {
    pub name: String,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub meal_type: String,
    pub meal_date: NaiveDate,
}

/// Partial profile update. `None` leaves a field untouched; for nullable
/// fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[allow(clippy::option_option)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_goal: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_workout_goal: Option<u32>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

pub fn validate_new_workout(workout: &NewWorkout) -> Result<()> {
    if workout.name.trim().is_empty() {
        bail!("Workout name must not be empty");
    }
    if workout.workout_type.trim().is_empty() {
        bail!(
            "Workout type must not be empty (e.g. {})",
            WORKOUT_TYPES.join(", ")
        );
    }
    Ok(())
}

pub fn validate_new_meal(meal: &NewMeal) -> Result<()> {
    if meal.name.trim().is_empty() {
        bail!("Meal name must not be empty");
    }
    if meal.meal_type.trim().is_empty() {
        bail!("Meal type must not be empty (e.g. {})", MEAL_TYPES.join(", "));
    }
    Ok(())
}

/// Goals must be positive; body measurements, when set, must be positive.
pub fn validate_profile_update(update: &ProfileUpdate) -> Result<()> {
    if update.daily_calorie_goal == Some(0) {
        bail!("Daily calorie goal must be greater than 0");
    }
    if update.weekly_workout_goal == Some(0) {
        bail!("Weekly workout goal must be greater than 0");
    }
    if update.height == Some(Some(0)) {
        bail!("Height must be greater than 0");
    }
    if update.weight.flatten().is_some_and(|w| w <= 0.0) {
        bail!("Weight must be greater than 0");
    }
    if update.target_weight.flatten().is_some_and(|w| w <= 0.0) {
        bail!("Target weight must be greater than 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_workout_type_field_uses_type_key() {
        let w = NewWorkout::planned("Morning run", 30, 250, "running", date());
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["type"], "running");
        assert_eq!(json["workout_date"], "2024-06-15");
        assert_eq!(json["completed"], false);
        assert!(json.get("workout_type").is_none());
    }

    #[test]
    fn test_profile_defaults_when_goals_missing() {
        let json = serde_json::json!({
            "id": "p1",
            "user_id": "u1",
            "display_name": null,
            "height": null,
            "weight": 70.5,
            "target_weight": null,
            "created_at": "2024-06-15T08:00:00Z",
            "updated_at": "2024-06-15T08:00:00Z"
        });
        let profile: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.daily_calorie_goal, DEFAULT_CALORIE_GOAL);
        assert_eq!(profile.weekly_workout_goal, DEFAULT_WEEKLY_WORKOUT_GOAL);
        assert_eq!(profile.weight, Some(70.5));
    }

    #[test]
    fn test_profile_update_serializes_only_provided_fields() {
        let update = ProfileUpdate {
            weight: Some(Some(71.5)),
            display_name: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["weight"], 71.5);
        assert!(obj["display_name"].is_null());
    }

    #[test]
    fn test_profile_update_is_empty() {
        assert!(ProfileUpdate::default().is_empty());
        let update = ProfileUpdate {
            daily_calorie_goal: Some(1800),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_validate_new_workout() {
        let ok = NewWorkout::planned("Upper body", 45, 320, "strength", date());
        assert!(validate_new_workout(&ok).is_ok());

        let mut blank = ok.clone();
        blank.name = "  ".to_string();
        assert!(validate_new_workout(&blank).is_err());

        let mut untyped = ok.clone();
        untyped.workout_type = String::new();
        assert!(validate_new_workout(&untyped).is_err());

        let mut zero = ok;
        zero.duration = 0;
        zero.calories = 0;
        assert!(validate_new_workout(&zero).is_ok());
    }

    #[test]
    fn test_validate_new_workout_accepts_free_form_type() {
        let w = NewWorkout::planned("Climbing", 60, 500, "bouldering", date());
        assert!(validate_new_workout(&w).is_ok());
    }

    #[test]
    fn test_validate_new_meal() {
        let meal = NewMeal {
            name: "Oatmeal".to_string(),
            calories: 350,
            protein: 12,
            carbs: 55,
            fat: 8,
            meal_type: "breakfast".to_string(),
            meal_date: date(),
        };
        assert!(validate_new_meal(&meal).is_ok());

        let mut unnamed = meal.clone();
        unnamed.name = String::new();
        assert!(validate_new_meal(&unnamed).is_err());

        let mut untyped = meal;
        untyped.meal_type = " ".to_string();
        assert!(validate_new_meal(&untyped).is_err());
    }

    #[test]
    fn test_validate_profile_update() {
        assert!(validate_profile_update(&ProfileUpdate::default()).is_ok());

        let zero_goal = ProfileUpdate {
            daily_calorie_goal: Some(0),
            ..Default::default()
        };
        assert!(validate_profile_update(&zero_goal).is_err());

        let negative_weight = ProfileUpdate {
            weight: Some(Some(-1.0)),
            ..Default::default()
        };
        assert!(validate_profile_update(&negative_weight).is_err());

        let cleared_weight = ProfileUpdate {
            weight: Some(None),
            ..Default::default()
        };
        assert!(validate_profile_update(&cleared_weight).is_ok());
    }
}
