//! To-do tasks

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Reasons a task (or its date) is refused before being admitted to a store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a task title cannot be empty")]
    EmptyTitle,
    #[error("a task description cannot be empty when it is provided")]
    EmptyDescription,
    #[error("{0:?} is not a YYYY-MM-DD date")]
    InvalidDate(String),
}


/// The unique identifier of a task
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId {
    content: String,
}

impl TaskId {
    /// Generate a random TaskId.
    pub fn random() -> Self {
        let random = Uuid::new_v4().to_hyphenated().to_string();
        Self { content: random }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

impl From<String> for TaskId {
    fn from(content: String) -> Self {
        Self { content }
    }
}

impl FromStr for TaskId {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { content: s.to_string() })
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.content)
    }
}


/// A to-do task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Immutable identifier, used for removal and lookup
    id: TaskId,

    /// The display name of the task
    title: String,
    /// An optional longer text (used by the agenda view)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    /// Important tasks are listed first
    #[serde(default)]
    is_important: bool,
    /// The 12-hour display string of a confirmed reminder, e.g. `3:00 PM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reminder_time: Option<String>,

    /// The time this task was created.
    /// Tasks migrated from older storage formats do not have one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    creation_date: Option<DateTime<Utc>>,
}


impl Task {
    /// Create a brand new Task.
    /// This will pick a new (random) task ID, and refuse blank texts.
    pub fn new(title: &str, description: Option<&str>) -> Result<Self, ValidationError> {
        Self::new_with_parameters(TaskId::random(), title, description, false, None, Some(Utc::now()))
    }

    /// Create a Task instance with every field given, e.g. when it is read from older storage formats
    pub fn new_with_parameters(id: TaskId, title: &str, description: Option<&str>,
                               is_important: bool, reminder_time: Option<String>,
                               creation_date: Option<DateTime<Utc>>,
                            ) -> Result<Self, ValidationError>
    {
        if is_blank(title) {
            return Err(ValidationError::EmptyTitle);
        }
        if let Some(descr) = description {
            if is_blank(descr) {
                return Err(ValidationError::EmptyDescription);
            }
        }

        Ok(Self {
            id,
            title: title.to_string(),
            description: description.map(str::to_string),
            is_important,
            reminder_time,
            creation_date,
        })
    }

    /// Check the rules [`Task::new_with_parameters`] enforces, e.g. on a deserialized task
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.title) {
            return Err(ValidationError::EmptyTitle);
        }
        if self.description.as_deref().map(is_blank).unwrap_or(false) {
            return Err(ValidationError::EmptyDescription);
        }
        Ok(())
    }

    pub fn id(&self) -> &TaskId     { &self.id           }
    pub fn title(&self) -> &str     { &self.title        }
    pub fn description(&self) -> Option<&str>  { self.description.as_deref() }
    pub fn is_important(&self) -> bool         { self.is_important }
    pub fn reminder_time(&self) -> Option<&str> { self.reminder_time.as_deref() }
    pub fn creation_date(&self) -> Option<&DateTime<Utc>> { self.creation_date.as_ref() }

    /// Flip the importance flag, and return its new value
    pub fn toggle_important(&mut self) -> bool {
        self.is_important = !self.is_important;
        self.is_important
    }

    pub fn set_reminder_time(&mut self, display: Option<String>) {
        self.reminder_time = display;
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_defaults() {
        let task = Task::new("Buy milk", None).unwrap();
        assert_eq!(task.title(), "Buy milk");
        assert_eq!(task.is_important(), false);
        assert_eq!(task.reminder_time(), None);
        assert!(task.creation_date().is_some());
        assert_ne!(task.id(), Task::new("Buy milk", None).unwrap().id());
    }

    #[test]
    fn blank_texts_are_refused() {
        assert_eq!(Task::new("", None), Err(ValidationError::EmptyTitle));
        assert_eq!(Task::new(" \t\n", None), Err(ValidationError::EmptyTitle));
        assert_eq!(Task::new("Dentist", Some("   ")), Err(ValidationError::EmptyDescription));
        assert!(Task::new("Dentist", Some("10 rue des Lilas")).is_ok());
    }

    #[test]
    fn deserialized_tasks_are_validated() {
        let blank: Task = serde_json::from_str(r#"{"id": "a", "title": "  "}"#).unwrap();
        assert_eq!(blank.validate(), Err(ValidationError::EmptyTitle));
        let blank_description: Task = serde_json::from_str(r#"{"id": "b", "title": "Gym", "description": ""}"#).unwrap();
        assert_eq!(blank_description.validate(), Err(ValidationError::EmptyDescription));
        let valid: Task = serde_json::from_str(r#"{"id": "c", "title": "Gym"}"#).unwrap();
        assert_eq!(valid.validate(), Ok(()));
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        let mut task = Task::new("Walk dog", None).unwrap();
        assert_eq!(task.toggle_important(), true);
        assert_eq!(task.toggle_important(), false);
        assert_eq!(task.is_important(), false);
    }

    #[test]
    fn serialized_field_names() {
        let mut task = Task::new_with_parameters(TaskId::from("abc".to_string()), "Call mum", None, true, None, None).unwrap();
        task.set_reminder_time(Some("3:00 PM".to_string()));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json, serde_json::json!({
            "id": "abc",
            "title": "Call mum",
            "isImportant": true,
            "reminderTime": "3:00 PM",
        }));
    }
}
