use anyhow::Result;
use serde_json::json;

use fitday_core::metrics::DailyMetrics;

use super::helpers::{print_meal_table, print_workout_table};
use crate::backend::App;

const BAR_WIDTH: usize = 30;

#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn print_metrics(m: &DailyMetrics) {
    println!(
        "Calories   {} {:>3.0}%  {} / {} kcal",
        progress_bar(m.calorie_progress),
        m.calorie_progress,
        m.total_calories_consumed,
        m.calorie_goal
    );
    if m.remaining_calories >= 0 {
        println!("Remaining  {} kcal", m.remaining_calories);
    } else {
        println!("Over goal  {} kcal", -m.remaining_calories);
    }
    println!("Burned     {} kcal", m.total_calories_burned);
    println!("Net        {} kcal", m.net_calories);
    println!(
        "Workouts   {}/{} done, {} min",
        m.completed_workouts, m.workout_count, m.total_workout_duration
    );
    println!(
        "Macros     P {}g  C {}g  F {}g",
        m.macros.protein, m.macros.carbs, m.macros.fat
    );
}

pub(crate) async fn cmd_today(app: &App, json: bool) -> Result<()> {
    let tracker = app.open_tracker(json).await?;
    let metrics = tracker.metrics();

    if json {
        let value = json!({
            "date": tracker.today(),
            "profile": tracker.profile(),
            "metrics": metrics,
            "workouts": tracker.workouts(),
            "meals": tracker.meals(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let greeting = tracker
        .profile()
        .and_then(|p| p.display_name.as_deref())
        .map_or_else(String::new, |name| format!(", {name}"));
    println!("Today{greeting}: {}\n", tracker.today().format("%A %Y-%m-%d"));
    print_metrics(&metrics);

    println!();
    if tracker.workouts().is_empty() {
        println!("No workouts today. Add one with `fitday workout add`.");
    } else {
        println!("Workouts");
        print_workout_table(tracker.workouts());
    }

    println!();
    if tracker.meals().is_empty() {
        println!("No meals logged today. Add one with `fitday meal add`.");
    } else {
        println!("Meals");
        print_meal_table(tracker.meals());
    }

    Ok(())
}
