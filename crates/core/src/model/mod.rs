mod exercise;
mod ids;
mod set_record;
mod workout;

pub use ids::{ExerciseId, ParseIdError, SetRecordId, UserId, WorkoutId};

pub use exercise::{Exercise, ExerciseDraft, ExerciseError, ExercisePatch};
pub use set_record::{NewSetRecord, SetRecord, SetRecordError};
pub use workout::{Workout, WorkoutError, parse_weekday, validate_workout_name, weekday_name};
