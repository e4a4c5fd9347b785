//! Session tracking: where an exercise stands within the current session.
//!
//! Everything here is derived from the exercise's *current* targets and the
//! session's set log on each call; nothing is cached between calls.

use serde::Serialize;

use crate::model::{Exercise, SetRecord};

/// Derived, never persisted, view of one exercise within one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Index the next submitted set will take.
    pub next_set_index: u32,
    pub target_sets: u32,
    /// Number of sets logged this session.
    pub completed_sets: u32,
    /// `next_set_index` lies beyond the target.
    pub is_extra: bool,
    pub is_completed: bool,
    pub suggested_weight: Option<f64>,
}

/// Per-exercise session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionPhase {
    NotStarted,
    InProgress { done: u32, target: u32 },
    Completed,
    Extra { extra: u32 },
}

impl SessionStatus {
    /// Sets still needed to reach the target; zero once completed.
    #[must_use]
    pub fn remaining_sets(&self) -> u32 {
        self.target_sets.saturating_sub(self.completed_sets)
    }

    /// Highest set index logged so far, if any.
    #[must_use]
    pub fn last_set_index(&self) -> Option<u32> {
        self.next_set_index.checked_sub(1).filter(|i| *i > 0)
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.completed_sets == 0 {
            return SessionPhase::NotStarted;
        }
        if !self.is_completed {
            return SessionPhase::InProgress {
                done: self.completed_sets,
                target: self.target_sets,
            };
        }
        match self.last_set_index() {
            Some(last) if last > self.target_sets => SessionPhase::Extra {
                extra: last - self.target_sets,
            },
            _ => SessionPhase::Completed,
        }
    }

    #[must_use]
    pub fn with_suggested_weight(mut self, weight: Option<f64>) -> Self {
        self.suggested_weight = weight;
        self
    }
}

/// Compute the session status of `exercise` from this session's records.
///
/// `records` should hold the current session's sets for the exercise; records of
/// other exercises are ignored.
#[must_use]
pub fn session_status(exercise: &Exercise, records: &[SetRecord]) -> SessionStatus {
    let own = records
        .iter()
        .filter(|record| record.exercise_id() == exercise.id());

    let (count, max_index) = own.fold((0_u32, 0_u32), |(count, max), record| {
        (count.saturating_add(1), max.max(record.set_index()))
    });

    let next_set_index = max_index.saturating_add(1);
    let target_sets = exercise.sets();

    SessionStatus {
        next_set_index,
        target_sets,
        completed_sets: count,
        is_extra: next_set_index > target_sets,
        is_completed: count >= target_sets,
        suggested_weight: None,
    }
}
