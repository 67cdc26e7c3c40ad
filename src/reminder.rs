//! Turns a time picked by the user into a scheduled local notification
//!
//! The [`ReminderScheduler`] drives the time picker: `Idle -> PickerVisible -> Idle`.
//! Confirming a time formats it for display, makes sure notifications are allowed, then registers one notification.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::sync::watch;

use crate::clock::{format_12_hour, Clock};
use crate::config;
use crate::notification::{NotificationError, NotificationHandle, NotificationRequest};
use crate::task::{Task, TaskId};
use crate::traits::NotificationService;

/// The state of the time picker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickerState {
    Idle,
    PickerVisible,
}

impl Default for PickerState {
    fn default() -> Self {
        PickerState::Idle
    }
}

/// What happened to a confirmed reminder
#[derive(Clone, Debug, PartialEq)]
pub enum ReminderOutcome {
    /// A notification will fire after `delay`
    Scheduled {
        display: String,
        handle: NotificationHandle,
        delay: Duration,
    },
    /// The user does not allow notifications. Nothing has been scheduled
    PermissionDenied {
        display: String,
    },
}

impl ReminderOutcome {
    /// The 12-hour display string of the confirmed time
    pub fn display(&self) -> &str {
        match self {
            ReminderOutcome::Scheduled { display, .. } => display,
            ReminderOutcome::PermissionDenied { display } => display,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self, ReminderOutcome::Scheduled { .. })
    }
}

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("no time picker is shown")]
    PickerNotVisible,
    /// The notification service failed. `display` is still the formatted confirmed time
    #[error("unable to schedule the reminder for {display}: {source}")]
    Scheduling {
        display: String,
        #[source]
        source: NotificationError,
    },
}


/// Schedules one-shot reminders through a [`NotificationService`].
///
/// It remembers the last notification scheduled for every task, so that re-scheduling a reminder (or deleting its task)
/// cancels the previous notification.
pub struct ReminderScheduler<N, C>
where
    N: NotificationService,
    C: Clock,
{
    notifier: N,
    clock: C,

    state: PickerState,
    state_sender: watch::Sender<PickerState>,
    state_receiver: watch::Receiver<PickerState>,

    pending: HashMap<TaskId, NotificationHandle>,
    channel_registered: bool,
}

impl<N, C> ReminderScheduler<N, C>
where
    N: NotificationService,
    C: Clock,
{
    pub fn new(notifier: N, clock: C) -> Self {
        let (state_sender, state_receiver) = watch::channel(PickerState::Idle);
        Self {
            notifier, clock,
            state: PickerState::Idle,
            state_sender, state_receiver,
            pending: HashMap::new(),
            channel_registered: false,
        }
    }

    pub fn notifier(&self) -> &N { &self.notifier }
    pub fn clock(&self) -> &C { &self.clock }
    pub fn state(&self) -> PickerState { self.state }

    /// Returns a receiver that observes every change of the picker state
    pub fn watch_state(&self) -> watch::Receiver<PickerState> {
        self.state_receiver.clone()
    }

    fn set_state(&mut self, state: PickerState) {
        self.state = state;
        // We hold a receiver ourselves, this cannot fail
        let _ = self.state_sender.send(state);
    }

    pub fn show_picker(&mut self) {
        self.set_state(PickerState::PickerVisible);
    }

    /// Hide the picker, discarding whatever was picked
    pub fn cancel(&mut self) {
        if self.state == PickerState::PickerVisible {
            log::debug!("Reminder picker cancelled");
        }
        self.set_state(PickerState::Idle);
    }

    /// The notification currently scheduled for `task_id`, if any
    pub fn pending_for(&self, task_id: &TaskId) -> Option<&NotificationHandle> {
        self.pending.get(task_id)
    }

    /// Register the reminder channel with the notification service, unless this has already been done
    pub async fn ensure_channel(&mut self) -> Result<(), NotificationError> {
        if self.channel_registered {
            return Ok(());
        }
        self.notifier.set_channel(&config::reminder_channel()).await?;
        self.channel_registered = true;
        Ok(())
    }

    /// Confirm the picked time `at` for `task`.
    ///
    /// The picker is hidden in any case. A denied permission is not an error: the display string is returned anyway
    /// (so that it can be shown), but no notification is scheduled.
    /// Past times are not rejected, their notification fires right away.
    pub async fn confirm(&mut self, task: &Task, at: DateTime<Local>) -> Result<ReminderOutcome, ReminderError> {
        if self.state != PickerState::PickerVisible {
            return Err(ReminderError::PickerNotVisible);
        }
        self.set_state(PickerState::Idle);

        let display = format_12_hour(&at);

        match self.ensure_permission().await {
            Ok(true) => {},
            Ok(false) => {
                log::info!("Notifications are not allowed, no reminder will fire for {:?}", task.title());
                return Ok(ReminderOutcome::PermissionDenied { display });
            },
            Err(source) => return Err(ReminderError::Scheduling { display, source }),
        }

        if let Err(source) = self.ensure_channel().await {
            return Err(ReminderError::Scheduling { display, source });
        }

        let delay = delay_until(&self.clock.now(), &at);
        let channel_id = Some(config::reminder_channel().id);
        let request = NotificationRequest::reminder_for(task, delay, channel_id);
        match self.notifier.schedule(request).await {
            Ok(handle) => {
                log::info!("Reminder for {:?} scheduled at {} (in {}s)", task.title(), display, delay.as_secs());
                // The previous reminder is only replaced once the new one exists
                if let Some(previous) = self.pending.insert(task.id().clone(), handle.clone()) {
                    log::debug!("Replacing the reminder previously scheduled for {}", task.id());
                    if let Err(err) = self.notifier.cancel(&previous).await {
                        log::warn!("Unable to cancel the previous reminder of {}: {}", task.id(), err);
                    }
                }
                Ok(ReminderOutcome::Scheduled { display, handle, delay })
            },
            Err(source) => {
                log::warn!("Unable to schedule a reminder for {:?}: {}", task.title(), source);
                Err(ReminderError::Scheduling { display, source })
            },
        }
    }

    /// Cancel the pending notification of `task_id` (if any), e.g. because this task has been deleted
    pub async fn cancel_for_task(&mut self, task_id: &TaskId) -> Result<Option<NotificationHandle>, NotificationError> {
        let handle = match self.pending.remove(task_id) {
            None => return Ok(None),
            Some(handle) => handle,
        };
        if let Err(err) = self.notifier.cancel(&handle).await {
            // Keep track of it, so that the caller can try again
            self.pending.insert(task_id.clone(), handle);
            return Err(err);
        }
        Ok(Some(handle))
    }

    /// Returns whether notifications are allowed, asking the user if needed
    async fn ensure_permission(&mut self) -> Result<bool, NotificationError> {
        if self.notifier.permission_status().await?.is_granted() {
            return Ok(true);
        }
        let answer = self.notifier.request_permission().await?;
        Ok(answer.is_granted())
    }
}

/// Whole seconds from `now` to `target` (rounded down), or zero if `target` is in the past
pub fn delay_until(now: &DateTime<Local>, target: &DateTime<Local>) -> Duration {
    let millis = target.timestamp_millis() - now.timestamp_millis();
    let seconds = millis.div_euclid(1000);
    if seconds <= 0 {
        Duration::from_secs(0)
    } else {
        Duration::from_secs(seconds as u64)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use crate::clock::FixedClock;
    use crate::notification::{MockNotificationService, PermissionStatus};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 26, 14, 0, 0).unwrap()
    }

    fn scheduler(notifier: MockNotificationService) -> ReminderScheduler<MockNotificationService, FixedClock> {
        ReminderScheduler::new(notifier, FixedClock::new(now()))
    }

    #[test]
    fn delays() {
        let now = now();
        assert_eq!(delay_until(&now, &(now + chrono::Duration::seconds(3600))), Duration::from_secs(3600));
        assert_eq!(delay_until(&now, &(now + chrono::Duration::milliseconds(1999))), Duration::from_secs(1));
        assert_eq!(delay_until(&now, &now), Duration::from_secs(0));
        assert_eq!(delay_until(&now, &(now - chrono::Duration::seconds(60))), Duration::from_secs(0));
    }

    #[tokio::test]
    async fn picker_state_machine() {
        let notifier = MockNotificationService::new(PermissionStatus::Granted);
        let mut scheduler = scheduler(notifier.clone());
        let state = scheduler.watch_state();
        let task = Task::new("Buy milk", None).unwrap();

        assert!(matches!(scheduler.confirm(&task, now()).await, Err(ReminderError::PickerNotVisible)));

        scheduler.show_picker();
        assert_eq!(*state.borrow(), PickerState::PickerVisible);
        scheduler.cancel();
        assert_eq!(*state.borrow(), PickerState::Idle);
        assert!(matches!(scheduler.confirm(&task, now()).await, Err(ReminderError::PickerNotVisible)));
        assert!(notifier.scheduled().is_empty());

        scheduler.show_picker();
        let outcome = scheduler.confirm(&task, Local.with_ymd_and_hms(2024, 3, 26, 15, 0, 0).unwrap()).await.unwrap();
        assert_eq!(scheduler.state(), PickerState::Idle);
        assert_eq!(outcome.display(), "3:00 PM");
        match outcome {
            ReminderOutcome::Scheduled { delay, handle, .. } => {
                assert_eq!(delay, Duration::from_secs(3600));
                assert_eq!(scheduler.pending_for(task.id()), Some(&handle));
            },
            other => panic!("unexpected outcome {:?}", other),
        }

        let scheduled = notifier.scheduled();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].1.body, "Task: \"Buy milk\" is due soon!");
        assert_eq!(scheduled[0].1.channel_id.as_deref(), Some("reminder-channel"));
        assert_eq!(notifier.channels().len(), 1);
    }

    #[tokio::test]
    async fn permission_is_requested_once_undetermined() {
        let notifier = MockNotificationService::new(PermissionStatus::Undetermined);
        let mut scheduler = scheduler(notifier.clone());
        let task = Task::new("Buy milk", None).unwrap();

        for _ in 0..2 {
            scheduler.show_picker();
            assert!(scheduler.confirm(&task, now()).await.unwrap().is_scheduled());
        }
        assert_eq!(notifier.permission_requests(), 1);
    }

    #[tokio::test]
    async fn denied_permission_keeps_the_display() {
        let notifier = MockNotificationService::new_with_answer(PermissionStatus::Undetermined, PermissionStatus::Denied);
        let mut scheduler = scheduler(notifier.clone());
        let task = Task::new("Buy milk", None).unwrap();

        scheduler.show_picker();
        let outcome = scheduler.confirm(&task, Local.with_ymd_and_hms(2024, 3, 26, 15, 0, 0).unwrap()).await.unwrap();
        assert_eq!(outcome, ReminderOutcome::PermissionDenied { display: "3:00 PM".to_string() });
        assert_eq!(scheduler.state(), PickerState::Idle);
        assert!(notifier.scheduled().is_empty());
        assert!(scheduler.pending_for(task.id()).is_none());
    }

    #[tokio::test]
    async fn rescheduling_replaces_the_previous_reminder() {
        let notifier = MockNotificationService::new(PermissionStatus::Granted);
        let mut scheduler = scheduler(notifier.clone());
        let task = Task::new("Buy milk", None).unwrap();
        let other = Task::new("Walk dog", None).unwrap();

        scheduler.show_picker();
        scheduler.confirm(&task, now()).await.unwrap();
        scheduler.show_picker();
        scheduler.confirm(&other, now()).await.unwrap();
        scheduler.show_picker();
        scheduler.confirm(&task, now()).await.unwrap();

        assert_eq!(notifier.scheduled().len(), 3);
        assert_eq!(notifier.cancelled().len(), 1);
        assert_eq!(notifier.pending().len(), 2);

        let cancelled = scheduler.cancel_for_task(task.id()).await.unwrap();
        assert!(cancelled.is_some());
        assert_eq!(scheduler.cancel_for_task(task.id()).await.unwrap(), None);
        assert_eq!(notifier.pending().len(), 1);
    }

    #[tokio::test]
    async fn scheduling_failures_are_reported() {
        use std::sync::{Arc, Mutex};
        use crate::mock_behaviour::MockBehaviour;

        let mut notifier = MockNotificationService::new(PermissionStatus::Granted);
        notifier.set_mock_behaviour(Arc::new(Mutex::new(MockBehaviour {
            schedule_behaviour: (0, 1),
            ..MockBehaviour::default()
        })));
        let mut scheduler = scheduler(notifier.clone());
        let task = Task::new("Buy milk", None).unwrap();

        scheduler.show_picker();
        match scheduler.confirm(&task, Local.with_ymd_and_hms(2024, 3, 26, 9, 5, 0).unwrap()).await {
            Err(ReminderError::Scheduling { display, .. }) => assert_eq!(display, "9:05 AM"),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(scheduler.state(), PickerState::Idle);
        assert!(scheduler.pending_for(task.id()).is_none());
    }

    #[tokio::test]
    async fn permission_query_failures_are_reported() {
        use std::sync::{Arc, Mutex};
        use crate::mock_behaviour::MockBehaviour;

        let mut notifier = MockNotificationService::new(PermissionStatus::Undetermined);
        notifier.set_mock_behaviour(Arc::new(Mutex::new(MockBehaviour {
            permission_behaviour: (0, 1),
            ..MockBehaviour::default()
        })));
        let mut scheduler = scheduler(notifier.clone());
        let task = Task::new("Buy milk", None).unwrap();

        scheduler.show_picker();
        match scheduler.confirm(&task, Local.with_ymd_and_hms(2024, 3, 26, 9, 5, 0).unwrap()).await {
            Err(ReminderError::Scheduling { display, .. }) => assert_eq!(display, "9:05 AM"),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(scheduler.state(), PickerState::Idle);
        assert_eq!(notifier.permission_requests(), 0);
        assert!(notifier.scheduled().is_empty());
        assert!(scheduler.pending_for(task.id()).is_none());
    }

    #[tokio::test]
    async fn failed_rescheduling_keeps_the_previous_reminder() {
        use std::sync::{Arc, Mutex};
        use crate::mock_behaviour::MockBehaviour;

        let mut notifier = MockNotificationService::new(PermissionStatus::Granted);
        notifier.set_mock_behaviour(Arc::new(Mutex::new(MockBehaviour {
            schedule_behaviour: (1, 1),
            ..MockBehaviour::default()
        })));
        let mut scheduler = scheduler(notifier.clone());
        let task = Task::new("Buy milk", None).unwrap();

        scheduler.show_picker();
        let first = match scheduler.confirm(&task, Local.with_ymd_and_hms(2024, 3, 26, 15, 0, 0).unwrap()).await.unwrap() {
            ReminderOutcome::Scheduled { handle, .. } => handle,
            other => panic!("unexpected outcome {:?}", other),
        };

        scheduler.show_picker();
        let result = scheduler.confirm(&task, Local.with_ymd_and_hms(2024, 3, 26, 18, 0, 0).unwrap()).await;
        assert!(matches!(result, Err(ReminderError::Scheduling { .. })));
        assert!(notifier.cancelled().is_empty());
        assert_eq!(notifier.pending().len(), 1);
        assert_eq!(scheduler.pending_for(task.id()), Some(&first));
    }
}
