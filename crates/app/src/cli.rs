use chrono::Weekday;
use clap::{Args, Parser, Subcommand};

use lift_core::model::{ExerciseId, SetRecordId, UserId, WorkoutId, parse_weekday};

#[derive(Debug, Parser)]
#[command(name = "liftlog")]
#[command(about = "Plan workouts and log set progress", long_about = None)]
pub struct Cli {
    /// SQLite database URL or path
    #[arg(long = "db", env = "LIFT_DB_URL", default_value = "sqlite:liftlog.sqlite3")]
    pub db_url: String,

    /// Identity of the acting user
    #[arg(long = "user", env = "LIFT_USER_ID", default_value = "1")]
    pub user_id: UserId,

    /// Offset from UTC, in minutes, at which a training day starts
    #[arg(
        long,
        env = "LIFT_UTC_OFFSET_MINUTES",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub utc_offset_minutes: i32,

    /// Log filter, e.g. `debug` or `services=debug` (falls back to RUST_LOG)
    #[arg(long = "log")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage workouts
    #[command(subcommand)]
    Workout(WorkoutCommand),
    /// Manage the exercises of a workout
    #[command(subcommand)]
    Exercise(ExerciseCommand),
    /// Log and correct sets
    #[command(subcommand)]
    Set(SetCommand),
    /// Show where an exercise stands in today's session
    Status { exercise_id: ExerciseId },
    /// Weight to pre-fill for the next set of an exercise
    LastWeight { exercise_id: ExerciseId },
    /// Every logged set, newest first
    History,
}

#[derive(Debug, Subcommand)]
pub enum WorkoutCommand {
    /// Create a workout
    Add {
        name: String,
        /// Weekday the workout is scheduled on (e.g. `mon`, `Tuesday`)
        #[arg(long, value_parser = parse_day)]
        day: Weekday,
    },
    /// List workouts with their exercises
    List,
    /// Workouts scheduled for today
    Today,
    /// Delete a workout with its exercises and sets
    Delete { workout_id: WorkoutId },
}

#[derive(Debug, Subcommand)]
pub enum ExerciseCommand {
    /// Add an exercise to a workout
    Add {
        workout_id: WorkoutId,
        name: String,
        #[arg(long)]
        sets: u32,
        #[arg(long)]
        reps: u32,
        /// Target weight
        #[arg(long)]
        weight: Option<f64>,
    },
    /// List the exercises of a workout
    List { workout_id: WorkoutId },
    /// Edit name or targets
    Edit(ExerciseEdit),
    /// Set the target weight, e.g. to a suggested one
    AdoptWeight { exercise_id: ExerciseId, weight: f64 },
    /// Delete an exercise and its sets
    Delete { exercise_id: ExerciseId },
}

#[derive(Debug, Args)]
pub struct ExerciseEdit {
    pub exercise_id: ExerciseId,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub sets: Option<u32>,
    #[arg(long)]
    pub reps: Option<u32>,
    #[arg(long, conflicts_with = "clear_weight")]
    pub weight: Option<f64>,
    /// Remove the target weight
    #[arg(long)]
    pub clear_weight: bool,
}

#[derive(Debug, Subcommand)]
pub enum SetCommand {
    /// Register the next set of an exercise
    Log {
        exercise_id: ExerciseId,
        #[arg(long, allow_negative_numbers = true)]
        reps: i64,
        /// Weight lifted; defaults to the last weight of the session or the target
        #[arg(long)]
        weight: Option<f64>,
    },
    /// Correct a logged set
    Edit {
        record_id: SetRecordId,
        #[arg(long, allow_negative_numbers = true)]
        reps: i64,
        /// New weight; keeps the stored one when omitted
        #[arg(long)]
        weight: Option<f64>,
    },
    /// All sets of an exercise
    List { exercise_id: ExerciseId },
}

fn parse_day(raw: &str) -> Result<Weekday, String> {
    parse_weekday(raw).map_err(|e| e.to_string())
}
