//! This modules combines the task store and the reminder scheduler in a single service
//!
//! Screens only hold an [`Agenda`]: it keeps tasks and their reminders consistent,
//! e.g. a reminder display string is recorded on its task, and deleting a task cancels its pending notification.

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::clock::Clock;
use crate::collection::DateKey;
use crate::reminder::{PickerState, ReminderError, ReminderOutcome, ReminderScheduler};
use crate::store::{HydrateOutcome, StoreError, TaskStore};
use crate::task::{Task, TaskId};
use crate::traits::{KeyValueStorage, NotificationService};

pub mod feedback;
use feedback::{AgendaEvent, FeedbackSender};

#[derive(Debug, Error)]
pub enum AgendaError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Reminder(#[from] ReminderError),
    #[error("there is no task {id} on {date}")]
    TaskNotFound { date: DateKey, id: TaskId },
}


/// Tasks and their reminders.
///
/// Every mutating call takes `&mut self`, so calls are serialized. To share an agenda between tasks,
/// wrap it in an `Arc<tokio::sync::Mutex<_>>`.
pub struct Agenda<S, N, C>
where
    S: KeyValueStorage,
    N: NotificationService,
    C: Clock,
{
    store: TaskStore<S>,
    scheduler: ReminderScheduler<N, C>,
    feedback_channel: Option<FeedbackSender>,
}

impl<S, N, C> Agenda<S, N, C>
where
    S: KeyValueStorage,
    N: NotificationService,
    C: Clock,
{
    /// Create an agenda. Call [`Self::hydrate`] before displaying anything
    pub fn new(store: TaskStore<S>, scheduler: ReminderScheduler<N, C>) -> Self {
        Self { store, scheduler, feedback_channel: None }
    }

    /// Create an agenda that reports every change to `channel`
    pub fn new_with_feedback_channel(store: TaskStore<S>, scheduler: ReminderScheduler<N, C>, channel: FeedbackSender) -> Self {
        Self { store, scheduler, feedback_channel: Some(channel) }
    }

    pub fn store(&self) -> &TaskStore<S> { &self.store }
    pub fn scheduler(&self) -> &ReminderScheduler<N, C> { &self.scheduler }

    /// Send an event as a feedback to the listener (if any).
    fn feedback(&self, event: AgendaEvent) {
        if let Some(sender) = &self.feedback_channel {
            let _ = sender.send(event);
        }
    }

    /// Report a failure to the listener, and hand it back to the caller
    fn failed<E: Into<AgendaError>>(&self, err: E) -> AgendaError {
        let err = err.into();
        self.feedback(AgendaEvent::Failed { details: err.to_string() });
        err
    }

    /// Load the stored tasks. See [`TaskStore::hydrate`]
    pub async fn hydrate(&mut self) -> Result<HydrateOutcome, AgendaError> {
        match self.store.hydrate().await {
            Ok(outcome) => {
                self.feedback(AgendaEvent::Hydrated { tasks: self.store.collection().task_count() });
                Ok(outcome)
            },
            Err(err) => Err(self.failed(err)),
        }
    }

    pub fn list_for_date(&self, date: &DateKey) -> &[Task] {
        self.store.list_for_date(date)
    }

    /// Today's tasks, important ones first
    pub fn today(&self) -> Vec<Task> {
        self.store.list_today(self.scheduler.clock())
    }

    pub async fn add_task(&mut self, date: DateKey, title: &str, description: Option<&str>) -> Result<Task, AgendaError> {
        match self.store.add_task(date, title, description).await {
            Ok(task) => {
                self.feedback(AgendaEvent::TaskAdded { date, id: task.id().clone() });
                Ok(task)
            },
            Err(err) => Err(self.failed(err)),
        }
    }

    /// Remove a task, and cancel its pending reminder (if any).
    /// Returns `None` in case there is no such task
    pub async fn remove_task(&mut self, date: &DateKey, id: &TaskId) -> Result<Option<Task>, AgendaError> {
        let result = self.store.remove_task(date, id).await;

        // The task leaves the memory even when it could not be saved
        if self.store.find_task(id).is_none() {
            match self.scheduler.cancel_for_task(id).await {
                Ok(Some(handle)) => log::debug!("Cancelled reminder {} of deleted task {}", handle, id),
                Ok(None) => {},
                Err(err) => log::warn!("Unable to cancel the reminder of deleted task {}: {}", id, err),
            }
        }

        match result {
            Ok(None) => Ok(None),
            Ok(Some(removed)) => {
                self.feedback(AgendaEvent::TaskRemoved { date: *date, id: id.clone() });
                Ok(Some(removed))
            },
            Err(err) => Err(self.failed(err)),
        }
    }

    /// Flip the importance of a task. Returns its new importance, or `None` in case there is no such task
    pub async fn toggle_important(&mut self, date: &DateKey, id: &TaskId) -> Result<Option<bool>, AgendaError> {
        match self.store.toggle_important(date, id).await {
            Ok(Some(is_important)) => {
                self.feedback(AgendaEvent::ImportanceToggled { date: *date, id: id.clone(), is_important });
                Ok(Some(is_important))
            },
            Ok(None) => Ok(None),
            Err(err) => Err(self.failed(err)),
        }
    }

    pub fn picker_state(&self) -> PickerState {
        self.scheduler.state()
    }

    pub fn show_picker(&mut self) {
        self.scheduler.show_picker();
    }

    pub fn cancel_picker(&mut self) {
        self.scheduler.cancel();
    }

    /// Confirm the picked time `at` as the reminder of a task.
    ///
    /// The display string is recorded on the task even if notifications are not allowed
    /// (see [`ReminderOutcome::PermissionDenied`]), or if the notification could not be scheduled.
    pub async fn confirm_reminder(&mut self, date: &DateKey, id: &TaskId, at: DateTime<Local>) -> Result<ReminderOutcome, AgendaError> {
        let task = match self.store.list_for_date(date).iter().find(|task| task.id() == id) {
            Some(task) => task.clone(),
            None => {
                self.scheduler.cancel();
                return Err(self.failed(AgendaError::TaskNotFound { date: *date, id: id.clone() }));
            },
        };

        let result = self.scheduler.confirm(&task, at).await;
        let display = match &result {
            Ok(outcome) => Some(outcome.display().to_string()),
            Err(ReminderError::Scheduling { display, .. }) => Some(display.clone()),
            Err(ReminderError::PickerNotVisible) => None,
        };

        if let Some(display) = display {
            if let Err(err) = self.store.set_reminder_display(date, id, &display).await {
                return Err(self.failed(err));
            }
            self.feedback(AgendaEvent::ReminderSet { date: *date, id: id.clone(), display });
        }

        result.map_err(|err| self.failed(err))
    }
}
