use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::notification::{NotificationError, NotificationHandle, NotificationRequest, PermissionStatus};
use crate::traits::NotificationService;

/// A notification that has fired
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveredNotification {
    pub handle: NotificationHandle,
    pub title: String,
    pub body: String,
}

/// A notification service for desktop sessions: every notification is a tokio timer,
/// that logs the notification and forwards it to a channel when it fires.
///
/// Desktop sessions have no permission model, so permission is always granted.
/// This must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioNotificationService {
    sender: mpsc::UnboundedSender<DeliveredNotification>,
    timers: Arc<Mutex<HashMap<NotificationHandle, JoinHandle<()>>>>,
}

impl TokioNotificationService {
    /// Create a service, and the receiver fired notifications will be sent to
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeliveredNotification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let service = Self {
            sender,
            timers: Arc::new(Mutex::new(HashMap::new())),
        };
        (service, receiver)
    }

    /// How many notifications are waiting to fire
    pub fn pending_count(&self) -> usize {
        self.timers.lock().map(|timers| timers.len()).unwrap_or(0)
    }
}

#[async_trait]
impl NotificationService for TokioNotificationService {
    async fn permission_status(&self) -> Result<PermissionStatus, NotificationError> {
        Ok(PermissionStatus::Granted)
    }

    async fn request_permission(&mut self) -> Result<PermissionStatus, NotificationError> {
        Ok(PermissionStatus::Granted)
    }

    async fn schedule(&mut self, request: NotificationRequest) -> Result<NotificationHandle, NotificationError> {
        let handle = NotificationHandle::random();
        let delivered = DeliveredNotification {
            handle: handle.clone(),
            title: request.title,
            body: request.body,
        };
        let sender = self.sender.clone();
        let timers = Arc::clone(&self.timers);
        let delay = request.delay;

        let mut timers_guard = self.timers.lock()
            .map_err(|_| NotificationError::Service("timer table lock is poisoned".to_string()))?;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut timers) = timers.lock() {
                timers.remove(&delivered.handle);
            }
            log::info!("{}: {}", delivered.title, delivered.body);
            if sender.send(delivered).is_err() {
                log::debug!("Nobody listens to delivered notifications anymore");
            }
        });
        // The timer cannot remove itself before it is inserted, since the table is still locked
        timers_guard.insert(handle.clone(), timer);
        Ok(handle)
    }

    async fn cancel(&mut self, handle: &NotificationHandle) -> Result<(), NotificationError> {
        let timer = self.timers.lock()
            .map_err(|_| NotificationError::Service("timer table lock is poisoned".to_string()))?
            .remove(handle);
        if let Some(timer) = timer {
            timer.abort();
            log::debug!("Cancelled notification {}", handle);
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(body: &str, delay: Duration) -> NotificationRequest {
        NotificationRequest {
            title: String::from("Reminder"),
            body: body.to_string(),
            delay,
            channel_id: None,
        }
    }

    #[tokio::test]
    async fn notifications_fire_unless_cancelled() {
        let (mut service, mut receiver) = TokioNotificationService::new();

        let cancelled = service.schedule(request("never", Duration::from_millis(50))).await.unwrap();
        let fired = service.schedule(request("soon", Duration::from_millis(10))).await.unwrap();
        assert_eq!(service.pending_count(), 2);
        service.cancel(&cancelled).await.unwrap();

        let delivered = tokio::time::timeout(Duration::from_secs(5), receiver.recv()).await.unwrap().unwrap();
        assert_eq!(delivered.handle, fired);
        assert_eq!(delivered.body, "soon");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(receiver.try_recv().is_err());
        assert_eq!(service.pending_count(), 0);
    }
}
