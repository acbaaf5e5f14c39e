use anyhow::{Result, bail};

use fitday_core::metrics::calorie_goal;
use fitday_core::models::{Profile, ProfileUpdate, validate_profile_update};
use fitday_core::tracker::Outcome;

use super::helpers::{exit_not_found, parse_clearable};
use crate::backend::{App, exit_on_failure};

/// Raw `profile set` flags. Nullable fields accept an empty string to clear.
#[derive(Default)]
pub(crate) struct ProfileArgs {
    pub name: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub target_weight: Option<String>,
    pub calorie_goal: Option<u32>,
    pub workout_goal: Option<u32>,
}

impl ProfileArgs {
    fn into_update(self) -> Result<ProfileUpdate> {
        let update = ProfileUpdate {
            display_name: self.name.map(|n| {
                let n = n.trim().to_string();
                (!n.is_empty()).then_some(n)
            }),
            height: self
                .height
                .map(|h| parse_clearable(&h, "height"))
                .transpose()?,
            weight: self
                .weight
                .map(|w| parse_clearable(&w, "weight"))
                .transpose()?,
            target_weight: self
                .target_weight
                .map(|w| parse_clearable(&w, "target weight"))
                .transpose()?,
            daily_calorie_goal: self.calorie_goal,
            weekly_workout_goal: self.workout_goal,
        };
        if update.is_empty() {
            bail!("Nothing to update. Pass at least one of --name, --height, --weight, --target-weight, --calorie-goal, --workout-goal");
        }
        validate_profile_update(&update)?;
        Ok(update)
    }
}

fn show_or_dash<T: std::fmt::Display>(value: Option<T>, unit: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v}{unit}"))
}

fn print_profile(profile: &Profile) {
    println!(
        "Name:            {}",
        profile.display_name.as_deref().unwrap_or("-")
    );
    println!("Height:          {}", show_or_dash(profile.height, " cm"));
    println!("Weight:          {}", show_or_dash(profile.weight, " kg"));
    println!(
        "Target weight:   {}",
        show_or_dash(profile.target_weight, " kg")
    );
    println!(
        "Calorie goal:    {} kcal/day",
        calorie_goal(Some(profile))
    );
    println!(
        "Workout goal:    {} per week",
        profile.weekly_workout_goal
    );
}

pub(crate) async fn cmd_profile_show(app: &App, json: bool) -> Result<()> {
    let tracker = app.open_tracker(json).await?;
    let Some(profile) = tracker.profile() else {
        exit_not_found("No profile found for this account", json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(profile)?);
    } else {
        print_profile(profile);
    }

    Ok(())
}

pub(crate) async fn cmd_profile_set(app: &App, args: ProfileArgs, json: bool) -> Result<()> {
    let update = args.into_update()?;
    let mut tracker = app.open_tracker(json).await?;

    match tracker.update_profile(&update).await {
        Outcome::Applied(profile) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print_profile(&profile);
            }
        }
        Outcome::Skipped => exit_not_found("No profile found for this account", json),
        Outcome::Failed => exit_on_failure(&tracker),
    }

    Ok(())
}
