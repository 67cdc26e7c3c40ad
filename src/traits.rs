//! The capabilities this crate expects from the platform
use async_trait::async_trait;

use crate::storage::StorageError;
use crate::notification::{NotificationChannel, NotificationError, NotificationHandle, NotificationRequest, PermissionStatus};

/// A durable, string-keyed blob store (the device's local storage)
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored at `key`, or `None` if nothing has ever been stored there
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Replaces the whole value stored at `key`
    async fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removes `key`. Removing a key that does not exist is not an error
    async fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// The local-notification facility of the platform
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Returns whether the user currently allows notifications
    async fn permission_status(&self) -> Result<PermissionStatus, NotificationError>;
    /// Asks the user for permission (this may show a system prompt), and returns the answer
    async fn request_permission(&mut self) -> Result<PermissionStatus, NotificationError>;

    /// Registers a delivery channel.
    /// Some platforms group notifications by channel, the others can rely on this default (no-op) implementation
    async fn set_channel(&mut self, _channel: &NotificationChannel) -> Result<(), NotificationError> {
        Ok(())
    }

    /// Registers a one-shot notification, that will fire after `request.delay`
    async fn schedule(&mut self, request: NotificationRequest) -> Result<NotificationHandle, NotificationError>;
    /// Cancels a notification that has not fired yet.
    /// Cancelling an unknown (or already delivered) notification is not an error
    async fn cancel(&mut self, handle: &NotificationHandle) -> Result<(), NotificationError>;
}
