use std::sync::{Mutex, PoisonError};

use serde::Serialize;

/// Operation kinds that produce user-visible notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Fetch,
    AddWorkout,
    AddMeal,
    ToggleWorkout,
    DeleteWorkout,
    DeleteMeal,
    UpdateProfile,
}

impl Operation {
    /// Fetching and toggling succeed quietly.
    #[must_use]
    pub fn success_message(self) -> Option<&'static str> {
        match self {
            Self::Fetch | Self::ToggleWorkout => None,
            Self::AddWorkout => Some("Workout added."),
            Self::AddMeal => Some("Meal added."),
            Self::DeleteWorkout => Some("Workout deleted."),
            Self::DeleteMeal => Some("Meal deleted."),
            Self::UpdateProfile => Some("Profile updated."),
        }
    }

    #[must_use]
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Fetch => "Something went wrong while loading your data.",
            Self::AddWorkout => "Something went wrong while adding the workout.",
            Self::AddMeal => "Something went wrong while adding the meal.",
            Self::ToggleWorkout => "Something went wrong while updating the workout.",
            Self::DeleteWorkout => "Something went wrong while deleting the workout.",
            Self::DeleteMeal => "Something went wrong while deleting the meal.",
            Self::UpdateProfile => "Something went wrong while updating your profile.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: Level,
    pub operation: Operation,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(operation: Operation) -> Option<Self> {
        operation.success_message().map(|message| Self {
            level: Level::Success,
            operation,
            message: message.to_string(),
        })
    }

    #[must_use]
    pub fn failure(operation: Operation) -> Self {
        Self {
            level: Level::Failure,
            operation,
            message: operation.failure_message().to_string(),
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.level == Level::Failure
    }
}

/// Where user-facing notices go (a toast, a terminal line, a test buffer).
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Keeps every notice in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn failures(&self) -> Vec<Notice> {
        self.notices()
            .into_iter()
            .filter(Notice::is_failure)
            .collect()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
