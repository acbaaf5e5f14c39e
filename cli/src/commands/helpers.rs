use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::str::FromStr;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fitday_core::models::{Meal, Workout};
use fitday_core::reducers::Identified;

/// Width of the ids shown in tables.
pub(crate) const SHORT_ID_LEN: usize = 8;

pub(crate) fn short_id(id: &str) -> &str {
    id.char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(id, |(end, _)| &id[..end])
}

/// Find the entry whose id is `query` or starts with it. `Ok(None)` when
/// nothing matches; an error when a prefix is ambiguous.
pub(crate) fn resolve_id<'a, T: Identified>(items: &'a [T], query: &str) -> Result<Option<&'a T>> {
    let query = query.trim();
    if query.is_empty() {
        bail!("Id must not be empty");
    }
    if let Some(exact) = items.iter().find(|item| item.id() == query) {
        return Ok(Some(exact));
    }
    let mut matches = items.iter().filter(|item| item.id().starts_with(query));
    let first = matches.next();
    if matches.next().is_some() {
        bail!("Id prefix '{query}' matches more than one entry; use more characters");
    }
    Ok(first)
}

/// Parse a profile value where an empty string clears the field.
pub(crate) fn parse_clearable<T>(raw: &str, field: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .with_context(|| format!("Invalid {field}: '{raw}'"))
}

/// Read a line from the terminal with echo off.
pub(crate) fn prompt_secret(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Report a missing entry and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    std::process::exit(2);
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

pub(crate) fn print_workout_table(workouts: &[Workout]) {
    #[derive(Tabled)]
    struct WorkoutRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Done")]
        done: &'static str,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "Minutes")]
        minutes: u32,
        #[tabled(rename = "Calories")]
        calories: u32,
    }

    let rows: Vec<WorkoutRow> = workouts
        .iter()
        .map(|w| WorkoutRow {
            id: short_id(&w.id).to_string(),
            done: if w.completed { "✓" } else { " " },
            name: truncate(&w.name, 30),
            kind: w.workout_type.clone(),
            minutes: w.duration,
            calories: w.calories,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_meal_table(meals: &[Meal]) {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Meal")]
        meal_type: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Calories")]
        calories: u32,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .map(|m| MealRow {
            id: short_id(&m.id).to_string(),
            meal_type: m.meal_type.clone(),
            name: truncate(&m.name, 30),
            calories: m.calories,
            protein: format!("{}g", m.protein),
            carbs: format!("{}g", m.carbs),
            fat: format!("{}g", m.fat),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
