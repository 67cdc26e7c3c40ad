//! Support for library configuration options

use std::sync::{Arc, Mutex};
use once_cell::sync::Lazy;

use crate::notification::NotificationChannel;

/// The storage key the whole task collection is saved under.
/// Feel free to override it when initing this library.
pub static STORAGE_KEY: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("tasks".to_string())));

/// The title of every reminder notification.
/// Feel free to override it when initing this library.
pub static NOTIFICATION_TITLE: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("Reminder".to_string())));

/// The channel reminders are delivered through (on platforms that use channels).
/// Feel free to override it when initing this library.
pub static REMINDER_CHANNEL: Lazy<Arc<Mutex<NotificationChannel>>> = Lazy::new(|| Arc::new(Mutex::new(NotificationChannel::reminders())));

/// The current value of [`STORAGE_KEY`]
pub fn storage_key() -> String {
    read(&STORAGE_KEY)
}

/// The current value of [`NOTIFICATION_TITLE`]
pub fn notification_title() -> String {
    read(&NOTIFICATION_TITLE)
}

/// The current value of [`REMINDER_CHANNEL`]
pub fn reminder_channel() -> NotificationChannel {
    read(&REMINDER_CHANNEL)
}

/// The storage key a corrupt collection is moved to, so that it is not lost by the next write
pub fn backup_key(key: &str) -> String {
    format!("{}.corrupt", key)
}

fn read<T: Clone>(setting: &Lazy<Arc<Mutex<T>>>) -> T {
    // A poisoned setting still holds a complete value
    match setting.lock() {
        Ok(value) => value.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}
