//! Local notifications: the requests this crate sends, and notification services that deliver them
//!
//! See [`NotificationService`](crate::traits::NotificationService).

use std::fmt::{Display, Formatter};
use std::time::Duration;

use bitflags::bitflags;
use thiserror::Error;

use crate::task::Task;

pub mod mock_notifier;
pub use mock_notifier::MockNotificationService;
pub mod tokio_notifier;
pub use tokio_notifier::{TokioNotificationService, DeliveredNotification};

/// A notification service that could not do what it was asked to
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("notification service error: {0}")]
    Service(String),
}

/// Whether the user allows this app to show notifications
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not been asked yet
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        *self == PermissionStatus::Granted
    }
}


/// Identifies a scheduled notification, so that it can be cancelled
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NotificationHandle {
    id: String,
}

impl NotificationHandle {
    /// Generate a random handle
    pub fn random() -> Self {
        Self { id: uuid::Uuid::new_v4().to_hyphenated().to_string() }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl From<String> for NotificationHandle {
    fn from(id: String) -> Self {
        Self { id }
    }
}

impl Display for NotificationHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.id)
    }
}


/// A one-shot notification to schedule
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    /// How long from now the notification should fire. Zero means "right away"
    pub delay: Duration,
    /// The channel to deliver it through, on platforms that group notifications by channel
    pub channel_id: Option<String>,
}

impl NotificationRequest {
    /// The reminder notification for `task`
    pub fn reminder_for(task: &Task, delay: Duration, channel_id: Option<String>) -> Self {
        Self {
            title: crate::config::notification_title(),
            body: format!("Task: \"{}\" is due soon!", task.title()),
            delay,
            channel_id,
        }
    }
}


bitflags! {
    /// What a notification channel may use to get the user's attention
    pub struct ChannelFeatures: u8 {
        const SOUND = 1;
        const VIBRATION = 2;
        const LIGHTS = 4;
    }
}

/// How intrusive the notifications of a channel are
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Importance {
    Low,
    Default,
    High,
}

/// A delivery channel, i.e. a group of notifications that share the same presentation settings
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub features: ChannelFeatures,
    /// Alternating off/on durations, in milliseconds
    pub vibration_pattern: Vec<u64>,
    /// `#AARRGGBB`
    pub light_color: String,
}

impl NotificationChannel {
    /// The channel every reminder is delivered through
    pub fn reminders() -> Self {
        Self {
            id: String::from("reminder-channel"),
            name: String::from("Reminders"),
            importance: Importance::High,
            features: ChannelFeatures::all(),
            vibration_pattern: vec![0, 250, 250, 250],
            light_color: String::from("#FF231F7C"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_body_embeds_the_title() {
        let task = Task::new("Buy milk", None).unwrap();
        let request = NotificationRequest::reminder_for(&task, Duration::from_secs(60), Some("reminder-channel".to_string()));
        assert_eq!(request.title, "Reminder");
        assert_eq!(request.body, "Task: \"Buy milk\" is due soon!");
        assert_eq!(request.delay, Duration::from_secs(60));
    }

    #[test]
    fn reminder_channel() {
        let channel = NotificationChannel::reminders();
        assert_eq!(channel.id, "reminder-channel");
        assert!(channel.features.contains(ChannelFeatures::SOUND | ChannelFeatures::VIBRATION));
    }
}
