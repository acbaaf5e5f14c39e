mod backend;
mod commands;
mod config;
mod logging;
mod notifier;
mod session_file;
mod supabase;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::process;

use crate::backend::App;
use crate::commands::{
    MealInput, ProfileArgs, cmd_config_show, cmd_login, cmd_logout, cmd_meal_add,
    cmd_meal_delete, cmd_meal_list, cmd_profile_set, cmd_profile_show, cmd_signup, cmd_status,
    cmd_today, cmd_workout_add, cmd_workout_delete, cmd_workout_list, cmd_workout_toggle,
};
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "fitday",
    version,
    about = "Track today's workouts, meals and calorie goal",
    long_about = "Track today's workouts, meals and calorie goal.\n\n\
        Data lives in a local SQLite file by default, or in a Supabase project \
        when FITDAY_BACKEND=supabase."
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Less log output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up, log in, or check the current session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Show today's progress, workouts and meals
    Today {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Plan, complete and remove today's workouts
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Log and remove today's meals
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Show or edit your profile and goals
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Create an account
    Signup {
        /// E-mail address
        email: String,
        /// Password (prompted for when omitted)
        #[arg(long, env = "FITDAY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log in with e-mail and password
    Login {
        /// E-mail address
        email: String,
        /// Password (prompted for when omitted)
        #[arg(long, env = "FITDAY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log out and forget the stored session
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show who is logged in
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// List today's workouts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Plan a workout for today
    Add {
        /// Workout name
        name: String,
        /// Duration in minutes
        #[arg(short, long)]
        duration: u32,
        /// Calories burned when completed
        #[arg(short, long)]
        calories: u32,
        /// Type: strength, cardio, hiit, yoga, pilates, swimming, running, cycling
        #[arg(short = 't', long = "type")]
        workout_type: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a workout done, or not done again
    Toggle {
        /// Workout ID (or unique prefix)
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout
    Delete {
        /// Workout ID (or unique prefix)
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// List today's meals
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a meal for today
    Add {
        /// Meal name
        name: String,
        /// Calories
        #[arg(short, long)]
        calories: u32,
        /// Protein in grams
        #[arg(long, default_value = "0")]
        protein: u32,
        /// Carbs in grams
        #[arg(long, default_value = "0")]
        carbs: u32,
        /// Fat in grams
        #[arg(long, default_value = "0")]
        fat: u32,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long)]
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal
    Delete {
        /// Meal ID (or unique prefix)
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update profile fields; pass an empty value to clear one
    Set {
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Height in cm
        #[arg(long)]
        height: Option<String>,
        /// Weight in kg
        #[arg(long)]
        weight: Option<String>,
        /// Target weight in kg
        #[arg(long)]
        target_weight: Option<String>,
        /// Daily calorie goal
        #[arg(long)]
        calorie_goal: Option<u32>,
        /// Workouts per week
        #[arg(long)]
        workout_goal: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    // Config inspection works even when the backend is misconfigured.
    if let Commands::Config {
        command: ConfigCommands::Show { json },
    } = cli.command
    {
        return cmd_config_show(&config, json);
    }

    let app = App::open(config)?;

    match cli.command {
        Commands::Auth { command } => match command {
            AuthCommands::Signup {
                email,
                password,
                json,
            } => cmd_signup(&app, &email, password, json).await,
            AuthCommands::Login {
                email,
                password,
                json,
            } => cmd_login(&app, &email, password, json).await,
            AuthCommands::Logout { json } => cmd_logout(&app, json).await,
            AuthCommands::Status { json } => cmd_status(&app, json).await,
        },
        Commands::Today { json } => cmd_today(&app, json).await,
        Commands::Workout { command } => match command {
            WorkoutCommands::List { json } => cmd_workout_list(&app, json).await,
            WorkoutCommands::Add {
                name,
                duration,
                calories,
                workout_type,
                json,
            } => cmd_workout_add(&app, &name, duration, calories, &workout_type, json).await,
            WorkoutCommands::Toggle { id, json } => cmd_workout_toggle(&app, &id, json).await,
            WorkoutCommands::Delete { id, json } => cmd_workout_delete(&app, &id, json).await,
        },
        Commands::Meal { command } => match command {
            MealCommands::List { json } => cmd_meal_list(&app, json).await,
            MealCommands::Add {
                name,
                calories,
                protein,
                carbs,
                fat,
                meal,
                json,
            } => {
                let input = MealInput {
                    name: &name,
                    calories,
                    protein,
                    carbs,
                    fat,
                    meal_type: &meal,
                };
                cmd_meal_add(&app, input, json).await
            }
            MealCommands::Delete { id, json } => cmd_meal_delete(&app, &id, json).await,
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&app, json).await,
            ProfileCommands::Set {
                name,
                height,
                weight,
                target_weight,
                calorie_goal,
                workout_goal,
                json,
            } => {
                let args = ProfileArgs {
                    name,
                    height,
                    weight,
                    target_weight,
                    calorie_goal,
                    workout_goal,
                };
                cmd_profile_set(&app, args, json).await
            }
        },
        Commands::Config { .. } => Ok(()),
    }
}
