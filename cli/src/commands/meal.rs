use anyhow::Result;
use serde_json::json;

use fitday_core::models::{NewMeal, validate_new_meal};
use fitday_core::tracker::Outcome;

use super::helpers::{exit_not_found, print_meal_table, resolve_id, short_id};
use crate::backend::{App, exit_on_failure};

/// Macros in grams.
pub(crate) struct MealInput<'a> {
    pub name: &'a str,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub meal_type: &'a str,
}

pub(crate) async fn cmd_meal_list(app: &App, json: bool) -> Result<()> {
    let tracker = app.open_tracker(json).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(tracker.meals())?);
    } else if tracker.meals().is_empty() {
        eprintln!("No meals logged today. Use `fitday meal add` to log one.");
    } else {
        print_meal_table(tracker.meals());
        let m = tracker.metrics();
        println!(
            "Total: {} kcal (P {}g  C {}g  F {}g)",
            m.total_calories_consumed, m.macros.protein, m.macros.carbs, m.macros.fat
        );
    }

    Ok(())
}

pub(crate) async fn cmd_meal_add(app: &App, input: MealInput<'_>, json: bool) -> Result<()> {
    let mut tracker = app.open_tracker(json).await?;
    let new = NewMeal {
        name: input.name.trim().to_string(),
        calories: input.calories,
        protein: input.protein,
        carbs: input.carbs,
        fat: input.fat,
        meal_type: input.meal_type.trim().to_lowercase(),
        meal_date: tracker.today(),
    };
    validate_new_meal(&new)?;

    let outcome = tracker.add_meal(&new).await;
    exit_on_failure(&tracker);

    if let Outcome::Applied(m) = outcome {
        if json {
            println!("{}", serde_json::to_string_pretty(&m)?);
        } else {
            println!(
                "Logged {} for {} ({} kcal) [{}]",
                m.name,
                m.meal_type,
                m.calories,
                short_id(&m.id)
            );
            let remaining = tracker.metrics().remaining_calories;
            if remaining >= 0 {
                println!("{remaining} kcal left today");
            } else {
                println!("{} kcal over today's goal", -remaining);
            }
        }
    }

    Ok(())
}

pub(crate) async fn cmd_meal_delete(app: &App, id: &str, json: bool) -> Result<()> {
    let mut tracker = app.open_tracker(json).await?;
    let Some(meal) = resolve_id(tracker.meals(), id)?.cloned() else {
        exit_not_found(&format!("No meal today with id '{id}'"), json);
    };

    let outcome = tracker.delete_meal(&meal.id).await;
    exit_on_failure(&tracker);

    if outcome.is_applied() {
        if json {
            println!("{}", json!({ "deleted": meal.id }));
        } else {
            println!("Deleted meal {} [{}]", meal.name, short_id(&meal.id));
        }
    }

    Ok(())
}
