use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Meal, NewMeal, NewWorkout, Profile, ProfileUpdate, Workout};

/// The remote tables the tracker reads and writes.
///
/// The CLI talks to a Supabase project over REST; the embedded SQLite backend
/// implements the same contract for local use and tests. Every call may fail,
/// and callers treat all failures alike.
#[async_trait]
pub trait FitnessStore: Send + Sync {
    /// Rows for `user_id` dated `date`, newest created first.
    async fn workouts_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Workout>>;

    /// Rows for `user_id` dated `date`, newest created first.
    async fn meals_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Meal>>;

    /// Zero or one row; more than one is an error.
    async fn profile_for_user(&self, user_id: &str) -> Result<Option<Profile>>;

    async fn insert_workout(&self, user_id: &str, workout: &NewWorkout) -> Result<Workout>;

    async fn insert_meal(&self, user_id: &str, meal: &NewMeal) -> Result<Meal>;

    async fn set_workout_completed(&self, id: &str, completed: bool) -> Result<()>;

    async fn delete_workout(&self, id: &str) -> Result<()>;

    async fn delete_meal(&self, id: &str) -> Result<()>;

    /// Writes only the fields present in `update`.
    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()>;
}

#[async_trait]
impl<T: FitnessStore + ?Sized> FitnessStore for Arc<T> {
    async fn workouts_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Workout>> {
        (**self).workouts_for_day(user_id, date).await
    }

    async fn meals_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Meal>> {
        (**self).meals_for_day(user_id, date).await
    }

    async fn profile_for_user(&self, user_id: &str) -> Result<Option<Profile>> {
        (**self).profile_for_user(user_id).await
    }

    async fn insert_workout(&self, user_id: &str, workout: &NewWorkout) -> Result<Workout> {
        (**self).insert_workout(user_id, workout).await
    }

    async fn insert_meal(&self, user_id: &str, meal: &NewMeal) -> Result<Meal> {
        (**self).insert_meal(user_id, meal).await
    }

    async fn set_workout_completed(&self, id: &str, completed: bool) -> Result<()> {
        (**self).set_workout_completed(id, completed).await
    }

    async fn delete_workout(&self, id: &str) -> Result<()> {
        (**self).delete_workout(id).await
    }

    async fn delete_meal(&self, id: &str) -> Result<()> {
        (**self).delete_meal(id).await
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        (**self).update_profile(user_id, update).await
    }
}
