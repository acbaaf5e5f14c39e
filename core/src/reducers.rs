//! Pure state transitions applied after a remote write succeeds.

use crate::models::{Meal, Profile, ProfileUpdate, Workout};

pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for Workout {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Meal {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Newest entries go first.
#[must_use]
pub fn prepend<T>(items: Vec<T>, item: T) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len() + 1);
    out.push(item);
    out.extend(items);
    out
}

#[must_use]
pub fn remove_by_id<T: Identified>(items: Vec<T>, id: &str) -> Vec<T> {
    items.into_iter().filter(|item| item.id() != id).collect()
}

/// Flip `completed` on the matching workout only.
#[must_use]
pub fn toggle_completed(workouts: Vec<Workout>, id: &str) -> Vec<Workout> {
    workouts
        .into_iter()
        .map(|mut w| {
            if w.id == id {
                w.completed = !w.completed;
            }
            w
        })
        .collect()
}

/// Shallow merge: fields absent from `update` keep their current values.
#[must_use]
pub fn merge_profile(mut profile: Profile, update: &ProfileUpdate) -> Profile {
    if let Some(display_name) = &update.display_name {
        profile.display_name.clone_from(display_name);
    }
    if let Some(height) = update.height {
        profile.height = height;
    }
    if let Some(weight) = update.weight {
        profile.weight = weight;
    }
    if let Some(target_weight) = update.target_weight {
        profile.target_weight = target_weight;
    }
    if let Some(goal) = update.daily_calorie_goal {
        profile.daily_calorie_goal = goal;
    }
    if let Some(goal) = update.weekly_workout_goal {
        profile.weekly_workout_goal = goal;
    }
    profile
}
