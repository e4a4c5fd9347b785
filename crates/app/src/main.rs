use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lift_core::model::{ExerciseDraft, ExercisePatch, UserId};
use lift_core::{ProgressSettings, SessionWindow};
use services::{AppServices, Clock, RegistrationResponse, SetReport};

mod cli;
mod db;

use cli::{Cli, Command, ExerciseCommand, ExerciseEdit, SetCommand, WorkoutCommand};

fn init_tracing(filter: Option<&str>) {
    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_filter.as_deref());

    let window = SessionWindow::with_offset_minutes(cli.utc_offset_minutes)?;
    let settings = ProgressSettings::default().with_session_window(window);

    // Open + migrate SQLite here so the library crates never touch the filesystem.
    let db_url = db::normalize_sqlite_url(&cli.db_url);
    db::prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::default_clock(), settings)
        .await
        .with_context(|| format!("opening {db_url}"))?;
    tracing::debug!(db = %db_url, user = %cli.user_id, "services ready");

    let user = cli.user_id;
    match cli.command {
        Command::Workout(cmd) => workout(&app, user, cmd).await,
        Command::Exercise(cmd) => exercise(&app, user, cmd).await,
        Command::Set(cmd) => set(&app, user, cmd).await,
        Command::Status { exercise_id } => {
            let status = app.progress().session_status(user, exercise_id).await?;
            print_json(&json!({
                "status": status,
                "phase": status.phase(),
                "sessionStart": window.session_start(chrono::Utc::now()),
            }))
        }
        Command::LastWeight { exercise_id } => {
            let weight = app.progress().last_weight(user, exercise_id).await?;
            print_json(&json!({ "exerciseId": exercise_id, "weight": weight }))
        }
        Command::History => print_json(&app.progress().user_history(user).await?),
    }
}

async fn workout(app: &AppServices, user: UserId, cmd: WorkoutCommand) -> anyhow::Result<()> {
    let workouts = app.workouts();
    match cmd {
        WorkoutCommand::Add { name, day } => {
            print_json(&workouts.create_workout(user, &name, day).await?)
        }
        WorkoutCommand::List => print_json(&workouts.list_workouts(user).await?),
        WorkoutCommand::Today => print_json(&workouts.workout_of_the_day(user).await?),
        WorkoutCommand::Delete { workout_id } => {
            workouts.delete_workout(user, workout_id).await?;
            print_json(&json!({ "deleted": workout_id }))
        }
    }
}

async fn exercise(app: &AppServices, user: UserId, cmd: ExerciseCommand) -> anyhow::Result<()> {
    let workouts = app.workouts();
    match cmd {
        ExerciseCommand::Add {
            workout_id,
            name,
            sets,
            reps,
            weight,
        } => {
            let mut draft = ExerciseDraft::new(name, sets, reps);
            if let Some(weight) = weight {
                draft = draft.with_target_weight(weight);
            }
            print_json(&workouts.add_exercise(user, workout_id, draft).await?)
        }
        ExerciseCommand::List { workout_id } => {
            print_json(&workouts.list_exercises(user, workout_id).await?)
        }
        ExerciseCommand::Edit(edit) => {
            let ExerciseEdit {
                exercise_id,
                name,
                sets,
                reps,
                weight,
                clear_weight,
            } = edit;
            let target_weight = if clear_weight { Some(None) } else { weight.map(Some) };
            let patch = ExercisePatch {
                name,
                sets,
                reps,
                target_weight,
            };
            print_json(&workouts.update_exercise(user, exercise_id, patch).await?)
        }
        ExerciseCommand::AdoptWeight {
            exercise_id,
            weight,
        } => print_json(
            &workouts
                .adopt_suggested_weight(user, exercise_id, weight)
                .await?,
        ),
        ExerciseCommand::Delete { exercise_id } => {
            workouts.delete_exercise(user, exercise_id).await?;
            print_json(&json!({ "deleted": exercise_id }))
        }
    }
}

async fn set(app: &AppServices, user: UserId, cmd: SetCommand) -> anyhow::Result<()> {
    let progress = app.progress();
    match cmd {
        SetCommand::Log {
            exercise_id,
            reps,
            weight,
        } => {
            let report = SetReport {
                weight,
                reps: Some(reps),
            };
            let result = progress.register_set(user, exercise_id, report).await?;
            print_json(&RegistrationResponse::from(result))
        }
        SetCommand::Edit {
            record_id,
            reps,
            weight,
        } => {
            let report = SetReport {
                weight,
                reps: Some(reps),
            };
            print_json(&progress.update_set(user, record_id, report).await?)
        }
        SetCommand::List { exercise_id } => {
            print_json(&progress.exercise_progress(user, exercise_id).await?)
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
