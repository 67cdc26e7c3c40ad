use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::mock_behaviour::MockBehaviour;
use crate::notification::{NotificationChannel, NotificationError, NotificationHandle, NotificationRequest, PermissionStatus};
use crate::traits::NotificationService;

#[derive(Debug)]
struct MockState {
    permission: PermissionStatus,
    /// What the user answers when they are asked for permission
    answer_to_request: PermissionStatus,
    permission_requests: u32,
    channels: Vec<NotificationChannel>,
    scheduled: Vec<(NotificationHandle, NotificationRequest)>,
    cancelled: Vec<NotificationHandle>,
}

/// A notification service that only records what it is asked to do.
///
/// Clones share the same records. Failures can be injected with a [`MockBehaviour`].
#[derive(Clone, Debug)]
pub struct MockNotificationService {
    state: Arc<Mutex<MockState>>,
    mock_behaviour: Arc<Mutex<MockBehaviour>>,
}

impl MockNotificationService {
    /// A service whose permission is currently `permission`, and that grants it if asked
    pub fn new(permission: PermissionStatus) -> Self {
        Self::new_with_answer(permission, PermissionStatus::Granted)
    }

    /// A service whose permission is currently `permission`, and that answers `answer` if asked
    pub fn new_with_answer(permission: PermissionStatus, answer: PermissionStatus) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                permission,
                answer_to_request: answer,
                permission_requests: 0,
                channels: Vec::new(),
                scheduled: Vec::new(),
                cancelled: Vec::new(),
            })),
            mock_behaviour: Arc::new(Mutex::new(MockBehaviour::new())),
        }
    }

    pub fn set_mock_behaviour(&mut self, mock_behaviour: Arc<Mutex<MockBehaviour>>) {
        self.mock_behaviour = mock_behaviour;
    }

    /// Every notification that has been scheduled, cancelled ones included
    pub fn scheduled(&self) -> Vec<(NotificationHandle, NotificationRequest)> {
        lock(&self.state).scheduled.clone()
    }

    pub fn cancelled(&self) -> Vec<NotificationHandle> {
        lock(&self.state).cancelled.clone()
    }

    /// The notifications that are scheduled and not cancelled
    pub fn pending(&self) -> Vec<(NotificationHandle, NotificationRequest)> {
        let state = lock(&self.state);
        state.scheduled.iter()
            .filter(|(handle, _)| state.cancelled.contains(handle) == false)
            .cloned()
            .collect()
    }

    pub fn permission_requests(&self) -> u32 {
        lock(&self.state).permission_requests
    }

    pub fn channels(&self) -> Vec<NotificationChannel> {
        lock(&self.state).channels.clone()
    }

    fn check(&self, allowed: impl FnOnce(&mut MockBehaviour) -> Result<(), String>) -> Result<(), NotificationError> {
        let mut behaviour = self.mock_behaviour.lock()
            .map_err(|_| NotificationError::Service("mock behaviour lock is poisoned".to_string()))?;
        allowed(&mut behaviour).map_err(NotificationError::Service)
    }
}

// The mock state is only written by the short, non-panicking sections below
fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[async_trait]
impl NotificationService for MockNotificationService {
    async fn permission_status(&self) -> Result<PermissionStatus, NotificationError> {
        self.check(MockBehaviour::can_query_permission)?;
        Ok(lock(&self.state).permission)
    }

    async fn request_permission(&mut self) -> Result<PermissionStatus, NotificationError> {
        self.check(MockBehaviour::can_query_permission)?;
        let mut state = lock(&self.state);
        state.permission_requests += 1;
        state.permission = state.answer_to_request;
        Ok(state.permission)
    }

    async fn set_channel(&mut self, channel: &NotificationChannel) -> Result<(), NotificationError> {
        let mut state = lock(&self.state);
        state.channels.retain(|existing| existing.id != channel.id);
        state.channels.push(channel.clone());
        Ok(())
    }

    async fn schedule(&mut self, request: NotificationRequest) -> Result<NotificationHandle, NotificationError> {
        self.check(MockBehaviour::can_schedule)?;
        let handle = NotificationHandle::random();
        log::debug!("Mock notifier: scheduling {:?} in {:?}", request.body, request.delay);
        lock(&self.state).scheduled.push((handle.clone(), request));
        Ok(handle)
    }

    async fn cancel(&mut self, handle: &NotificationHandle) -> Result<(), NotificationError> {
        self.check(MockBehaviour::can_cancel)?;
        lock(&self.state).cancelled.push(handle.clone());
        Ok(())
    }
}
