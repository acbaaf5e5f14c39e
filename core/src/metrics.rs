//! Derived daily figures. Everything here is a pure function of the current
//! workouts, meals and profile; nothing is cached.

use serde::Serialize;

use crate::models::{DEFAULT_CALORIE_GOAL, Meal, Profile, Workout};

/// The profile's daily goal, falling back to the default when no profile is
/// loaded or the stored goal is zero.
#[must_use]
pub fn calorie_goal(profile: Option<&Profile>) -> u32 {
    profile
        .map(|p| p.daily_calorie_goal)
        .filter(|&goal| goal > 0)
        .unwrap_or(DEFAULT_CALORIE_GOAL)
}

#[must_use]
pub fn total_calories_consumed(meals: &[Meal]) -> u64 {
    meals.iter().map(|m| u64::from(m.calories)).sum()
}

/// Only completed workouts count as burned.
#[must_use]
pub fn total_calories_burned(workouts: &[Workout]) -> u64 {
    workouts
        .iter()
        .filter(|w| w.completed)
        .map(|w| u64::from(w.calories))
        .sum()
}

#[must_use]
pub fn total_workout_duration(workouts: &[Workout]) -> u64 {
    workouts
        .iter()
        .filter(|w| w.completed)
        .map(|w| u64::from(w.duration))
        .sum()
}

#[must_use]
pub fn net_calories(consumed: u64, burned: u64) -> i64 {
    signed(consumed) - signed(burned)
}

/// Goal minus consumed; negative once the goal is exceeded.
#[must_use]
pub fn remaining_calories(goal: u32, consumed: u64) -> i64 {
    i64::from(goal) - signed(consumed)
}

/// Percentage of the goal eaten so far, clamped to `[0, 100]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calorie_progress(consumed: u64, goal: u32) -> f64 {
    let goal = if goal == 0 { DEFAULT_CALORIE_GOAL } else { goal };
    (consumed as f64 / f64::from(goal) * 100.0).min(100.0)
}

fn signed(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MacroTotals {
    pub protein: u64,
    pub carbs: u64,
    pub fat: u64,
}

#[must_use]
pub fn macro_totals(meals: &[Meal]) -> MacroTotals {
    meals.iter().fold(MacroTotals::default(), |acc, m| MacroTotals {
        protein: acc.protein + u64::from(m.protein),
        carbs: acc.carbs + u64::from(m.carbs),
        fat: acc.fat + u64::from(m.fat),
    })
}

/// Everything the daily dashboard shows, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMetrics {
    pub calorie_goal: u32,
    pub total_calories_consumed: u64,
    pub total_calories_burned: u64,
    pub net_calories: i64,
    pub remaining_calories: i64,
    pub calorie_progress: f64,
    pub total_workout_duration: u64,
    pub macros: MacroTotals,
    pub completed_workouts: usize,
    pub workout_count: usize,
    pub meal_count: usize,
}

impl DailyMetrics {
    #[must_use]
    pub fn compute(workouts: &[Workout], meals: &[Meal], profile: Option<&Profile>) -> Self {
        let goal = calorie_goal(profile);
        let consumed = total_calories_consumed(meals);
        let burned = total_calories_burned(workouts);
        Self {
            calorie_goal: goal,
            total_calories_consumed: consumed,
            total_calories_burned: burned,
            net_calories: net_calories(consumed, burned),
            remaining_calories: remaining_calories(goal, consumed),
            calorie_progress: calorie_progress(consumed, goal),
            total_workout_duration: total_workout_duration(workouts),
            macros: macro_totals(meals),
            completed_workouts: workouts.iter().filter(|w| w.completed).count(),
            workout_count: workouts.len(),
            meal_count: meals.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn workout(id: &str, calories: u32, duration: u32, completed: bool) -> Workout {
        Workout {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: format!("Workout {id}"),
            duration,
            calories,
            workout_type: "cardio".to_string(),
            completed,
            workout_date: date(),
            created_at: "2024-06-15T08:00:00Z".to_string(),
        }
    }

    fn meal(id: &str, calories: u32, protein: u32, carbs: u32, fat: u32) -> Meal {
        Meal {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: format!("Meal {id}"),
            calories,
            protein,
            carbs,
            fat,
            meal_type: "lunch".to_string(),
            meal_date: date(),
            created_at: "2024-06-15T12:00:00Z".to_string(),
        }
    }

    fn profile(goal: u32) -> Profile {
        Profile {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            display_name: None,
            height: None,
            weight: None,
            target_weight: None,
            daily_calorie_goal: goal,
            weekly_workout_goal: 5,
            created_at: "2024-06-01T00:00:00Z".to_string(),
            updated_at: "2024-06-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_empty_state() {
        let m = DailyMetrics::compute(&[], &[], None);
        assert_eq!(m.calorie_goal, 2000);
        assert_eq!(m.total_calories_consumed, 0);
        assert_eq!(m.total_calories_burned, 0);
        assert_eq!(m.net_calories, 0);
        assert!(m.calorie_progress.abs() < f64::EPSILON);
        assert_eq!(m.total_workout_duration, 0);
        assert_eq!(m.remaining_calories, 2000);
        assert_eq!(m.macros, MacroTotals::default());
    }

    #[test]
    fn test_one_meal_one_completed_workout() {
        let meals = [meal("m1", 400, 30, 40, 10)];
        let workouts = [workout("w1", 250, 30, true)];
        let p = profile(2000);
        let m = DailyMetrics::compute(&workouts, &meals, Some(&p));
        assert_eq!(m.total_calories_consumed, 400);
        assert_eq!(m.total_calories_burned, 250);
        assert_eq!(m.net_calories, 150);
        assert!((m.calorie_progress - 20.0).abs() < f64::EPSILON);
        assert_eq!(m.total_workout_duration, 30);
        assert_eq!(
            m.macros,
            MacroTotals {
                protein: 30,
                carbs: 40,
                fat: 10
            }
        );
        assert_eq!(m.completed_workouts, 1);
        assert_eq!(m.workout_count, 1);
    }

    #[test]
    fn test_consumed_is_sum_of_meals() {
        let mut meals = vec![meal("a", 350, 0, 0, 0), meal("b", 420, 0, 0, 0)];
        assert_eq!(total_calories_consumed(&meals), 770);
        meals.push(meal("c", 125, 0, 0, 0));
        assert_eq!(total_calories_consumed(&meals), 895);
    }

    #[test]
    fn test_burned_and_duration_skip_incomplete() {
        let workouts = [
            workout("a", 250, 30, true),
            workout("b", 320, 45, false),
            workout("c", 100, 15, true),
        ];
        assert_eq!(total_calories_burned(&workouts), 350);
        assert_eq!(total_workout_duration(&workouts), 45);
    }

    #[test]
    fn test_net_calories_can_be_negative() {
        assert_eq!(net_calories(200, 650), -450);
    }

    #[test]
    fn test_progress_clamped_at_100() {
        assert!((calorie_progress(2000, 2000) - 100.0).abs() < f64::EPSILON);
        assert!((calorie_progress(9_000, 2000) - 100.0).abs() < f64::EPSILON);
        assert!((calorie_progress(u64::MAX, 1) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_goal_falls_back_to_default() {
        let p = profile(0);
        assert_eq!(calorie_goal(Some(&p)), 2000);
        assert!((calorie_progress(500, 0) - 25.0).abs() < f64::EPSILON);
        let m = DailyMetrics::compute(&[], &[meal("m", 1000, 0, 0, 0)], Some(&p));
        assert!((m.calorie_progress - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_custom_goal() {
        let p = profile(1600);
        assert_eq!(calorie_goal(Some(&p)), 1600);
        assert!((calorie_progress(400, 1600) - 25.0).abs() < f64::EPSILON);
        assert_eq!(remaining_calories(1600, 1800), -200);
    }
}
