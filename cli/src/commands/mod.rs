mod auth;
mod config;
mod helpers;
mod meal;
mod profile;
mod today;
mod workout;

pub(crate) use auth::{cmd_login, cmd_logout, cmd_signup, cmd_status};
pub(crate) use config::cmd_config_show;
pub(crate) use meal::{MealInput, cmd_meal_add, cmd_meal_delete, cmd_meal_list};
pub(crate) use profile::{ProfileArgs, cmd_profile_set, cmd_profile_show};
pub(crate) use today::cmd_today;
pub(crate) use workout::{cmd_workout_add, cmd_workout_delete, cmd_workout_list, cmd_workout_toggle};
