use anyhow::Result;
use serde_json::json;

use fitday_core::models::{NewWorkout, validate_new_workout};
use fitday_core::tracker::Outcome;

use super::helpers::{exit_not_found, print_workout_table, resolve_id, short_id};
use crate::backend::{App, Tracker, exit_on_failure};

pub(crate) async fn cmd_workout_list(app: &App, json: bool) -> Result<()> {
    let tracker = app.open_tracker(json).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(tracker.workouts())?);
    } else if tracker.workouts().is_empty() {
        eprintln!("No workouts today. Use `fitday workout add` to plan one.");
    } else {
        print_workout_table(tracker.workouts());
    }

    Ok(())
}

/// A planned workout dated to the tracker's day.
fn workout_for_today(
    tracker: &Tracker,
    name: &str,
    duration: u32,
    calories: u32,
    workout_type: &str,
) -> Result<NewWorkout> {
    let new = NewWorkout::planned(
        name.trim(),
        duration,
        calories,
        workout_type.trim().to_lowercase(),
        tracker.today(),
    );
    validate_new_workout(&new)?;
    Ok(new)
}

pub(crate) async fn cmd_workout_add(
    app: &App,
    name: &str,
    duration: u32,
    calories: u32,
    workout_type: &str,
    json: bool,
) -> Result<()> {
    let mut tracker = app.open_tracker(json).await?;
    let new = workout_for_today(&tracker, name, duration, calories, workout_type)?;
    let outcome = tracker.add_workout(&new).await;
    exit_on_failure(&tracker);

    if let Outcome::Applied(w) = outcome {
        if json {
            println!("{}", serde_json::to_string_pretty(&w)?);
        } else {
            println!(
                "Planned {} ({} min, {} kcal, {}) [{}]",
                w.name,
                w.duration,
                w.calories,
                w.workout_type,
                short_id(&w.id)
            );
        }
    }

    Ok(())
}

pub(crate) async fn cmd_workout_toggle(app: &App, id: &str, json: bool) -> Result<()> {
    let mut tracker = app.open_tracker(json).await?;
    let Some(workout) = resolve_id(tracker.workouts(), id)?.cloned() else {
        exit_not_found(&format!("No workout today with id '{id}'"), json);
    };

    let outcome = tracker.toggle_workout_complete(&workout.id).await;
    exit_on_failure(&tracker);

    if let Outcome::Applied(completed) = outcome {
        if json {
            println!(
                "{}",
                json!({ "id": workout.id, "completed": completed })
            );
        } else if completed {
            println!(
                "Completed {}! {} kcal burned in {} min",
                workout.name, workout.calories, workout.duration
            );
        } else {
            println!("Marked {} as not done", workout.name);
        }
    }

    Ok(())
}

pub(crate) async fn cmd_workout_delete(app: &App, id: &str, json: bool) -> Result<()> {
    let mut tracker = app.open_tracker(json).await?;
    let Some(workout) = resolve_id(tracker.workouts(), id)?.cloned() else {
        exit_not_found(&format!("No workout today with id '{id}'"), json);
    };

    let outcome = tracker.delete_workout(&workout.id).await;
    exit_on_failure(&tracker);

    if outcome.is_applied() {
        if json {
            println!("{}", json!({ "deleted": workout.id }));
        } else {
            println!("Deleted workout {} [{}]", workout.name, short_id(&workout.id));
        }
    }

    Ok(())
}
