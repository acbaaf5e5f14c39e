//! Today's workouts, meals and profile for the signed-in user.
//!
//! [`FitnessTracker`] keeps a local copy of the current day's rows and applies
//! each change locally only after the store has accepted it. Remote failures
//! never escape as errors: they are logged, turned into one generic notice for
//! the operation, and the local state is left as it was.

use anyhow::Error;
use chrono::{Local, NaiveDate};
use tracing::{debug, error, info};

use crate::metrics::{self, DailyMetrics};
use crate::models::{Meal, NewMeal, NewWorkout, Profile, ProfileUpdate, Workout};
use crate::notify::{Notice, Notifier, Operation};
use crate::reducers;
use crate::store::FitnessStore;

/// Result of a tracker operation.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Outcome<T = ()> {
    /// The store accepted the change and local state was updated.
    Applied(T),
    /// A precondition was missing (no user, no profile, unknown id). Nothing
    /// was sent and nothing was reported.
    Skipped,
    /// The store rejected the call; a failure notice was emitted.
    Failed,
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Skipped | Self::Failed => None,
        }
    }
}

pub struct FitnessTracker<S, N> {
    store: S,
    notifier: N,
    user_id: Option<String>,
    today: NaiveDate,
    workouts: Vec<Workout>,
    meals: Vec<Meal>,
    profile: Option<Profile>,
    loading: bool,
}

impl<S: FitnessStore, N: Notifier> FitnessTracker<S, N> {
    /// An empty tracker with no user, dated to the local calendar day.
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            user_id: None,
            today: Local::now().date_naive(),
            workouts: Vec::new(),
            meals: Vec::new(),
            profile: None,
            loading: false,
        }
    }

    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    // --- Accessors ---

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Newest first.
    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    /// Newest first.
    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- Derived figures ---

    pub fn metrics(&self) -> DailyMetrics {
        DailyMetrics::compute(&self.workouts, &self.meals, self.profile.as_ref())
    }

    pub fn calorie_goal(&self) -> u32 {
        metrics::calorie_goal(self.profile.as_ref())
    }

    pub fn total_calories_consumed(&self) -> u64 {
        metrics::total_calories_consumed(&self.meals)
    }

    pub fn total_calories_burned(&self) -> u64 {
        metrics::total_calories_burned(&self.workouts)
    }

    pub fn net_calories(&self) -> i64 {
        metrics::net_calories(self.total_calories_consumed(), self.total_calories_burned())
    }

    pub fn calorie_progress(&self) -> f64 {
        metrics::calorie_progress(self.total_calories_consumed(), self.calorie_goal())
    }

    pub fn total_workout_duration(&self) -> u64 {
        metrics::total_workout_duration(&self.workouts)
    }

    // --- Session ---

    /// Switch to `user_id`. A change empties the cache. With a user present
    /// the tracker reports loading until the next [`refresh`](Self::refresh).
    pub fn set_user(&mut self, user_id: Option<String>) {
        if self.user_id == user_id {
            return;
        }
        info!(user = user_id.as_deref().unwrap_or("-"), "tracker user changed");
        self.clear();
        self.loading = user_id.is_some();
        self.user_id = user_id;
    }

    /// Reload today's rows and the profile. Each query is applied on its own,
    /// so one failing does not keep the others from landing.
    pub async fn refresh(&mut self) {
        let Some(user_id) = self.user_id.clone() else {
            self.clear();
            self.loading = false;
            return;
        };
        let today = self.today;
        let mut failed = false;

        match self.store.workouts_for_day(&user_id, today).await {
            Ok(rows) => {
                debug!(count = rows.len(), %today, "loaded workouts");
                self.workouts = rows;
            }
            Err(err) => {
                log_failure(Operation::Fetch, &err);
                failed = true;
            }
        }

        match self.store.meals_for_day(&user_id, today).await {
            Ok(rows) => {
                debug!(count = rows.len(), %today, "loaded meals");
                self.meals = rows;
            }
            Err(err) => {
                log_failure(Operation::Fetch, &err);
                failed = true;
            }
        }

        match self.store.profile_for_user(&user_id).await {
            Ok(profile) => {
                debug!(found = profile.is_some(), "loaded profile");
                self.profile = profile;
            }
            Err(err) => {
                log_failure(Operation::Fetch, &err);
                failed = true;
            }
        }

        if failed {
            self.notifier.notify(Notice::failure(Operation::Fetch));
        }
        self.loading = false;
    }

    // --- Mutations ---

    pub async fn add_workout(&mut self, workout: &NewWorkout) -> Outcome<Workout> {
        let Some(user_id) = self.user_id.clone() else {
            return Outcome::Skipped;
        };
        match self.store.insert_workout(&user_id, workout).await {
            Ok(row) => {
                debug!(id = %row.id, "workout added");
                self.workouts = reducers::prepend(std::mem::take(&mut self.workouts), row.clone());
                self.succeeded(Operation::AddWorkout);
                Outcome::Applied(row)
            }
            Err(err) => self.failed(Operation::AddWorkout, &err),
        }
    }

    pub async fn add_meal(&mut self, meal: &NewMeal) -> Outcome<Meal> {
        let Some(user_id) = self.user_id.clone() else {
            return Outcome::Skipped;
        };
        match self.store.insert_meal(&user_id, meal).await {
            Ok(row) => {
                debug!(id = %row.id, "meal added");
                self.meals = reducers::prepend(std::mem::take(&mut self.meals), row.clone());
                self.succeeded(Operation::AddMeal);
                Outcome::Applied(row)
            }
            Err(err) => self.failed(Operation::AddMeal, &err),
        }
    }

    /// Flip a workout's completion. Applied carries the new state so the
    /// caller can celebrate a completion.
    pub async fn toggle_workout_complete(&mut self, id: &str) -> Outcome<bool> {
        let Some(current) = self.workouts.iter().find(|w| w.id == id).map(|w| w.completed)
        else {
            return Outcome::Skipped;
        };
        match self.store.set_workout_completed(id, !current).await {
            Ok(()) => {
                debug!(id, completed = !current, "workout toggled");
                self.workouts = reducers::toggle_completed(std::mem::take(&mut self.workouts), id);
                Outcome::Applied(!current)
            }
            Err(err) => self.failed(Operation::ToggleWorkout, &err),
        }
    }

    pub async fn delete_workout(&mut self, id: &str) -> Outcome {
        match self.store.delete_workout(id).await {
            Ok(()) => {
                debug!(id, "workout deleted");
                self.workouts = reducers::remove_by_id(std::mem::take(&mut self.workouts), id);
                self.succeeded(Operation::DeleteWorkout);
                Outcome::Applied(())
            }
            Err(err) => self.failed(Operation::DeleteWorkout, &err),
        }
    }

    pub async fn delete_meal(&mut self, id: &str) -> Outcome {
        match self.store.delete_meal(id).await {
            Ok(()) => {
                debug!(id, "meal deleted");
                self.meals = reducers::remove_by_id(std::mem::take(&mut self.meals), id);
                self.succeeded(Operation::DeleteMeal);
                Outcome::Applied(())
            }
            Err(err) => self.failed(Operation::DeleteMeal, &err),
        }
    }

    /// Requires a user and an already loaded profile.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Outcome<Profile> {
        let Some(user_id) = self.user_id.clone() else {
            return Outcome::Skipped;
        };
        if self.profile.is_none() {
            return Outcome::Skipped;
        }
        match self.store.update_profile(&user_id, update).await {
            Ok(()) => {
                let Some(profile) = self.profile.take() else {
                    return Outcome::Skipped;
                };
                let merged = reducers::merge_profile(profile, update);
                self.profile = Some(merged.clone());
                self.succeeded(Operation::UpdateProfile);
                Outcome::Applied(merged)
            }
            Err(err) => self.failed(Operation::UpdateProfile, &err),
        }
    }

    // --- Helpers ---

    fn clear(&mut self) {
        self.workouts.clear();
        self.meals.clear();
        self.profile = None;
    }

    fn succeeded(&self, operation: Operation) {
        if let Some(notice) = Notice::success(operation) {
            self.notifier.notify(notice);
        }
    }

    fn failed<T>(&self, operation: Operation, err: &Error) -> Outcome<T> {
        log_failure(operation, err);
        self.notifier.notify(Notice::failure(operation));
        Outcome::Failed
    }
}

fn log_failure(operation: Operation, err: &Error) {
    let chain = format!("{err:#}");
    error!(?operation, error = %chain, "remote call failed");
}
