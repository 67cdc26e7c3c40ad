//! This module provides the task store, the single owner of every task
//!
//! The whole [`TaskCollection`] is saved under a single storage key, and re-written after every change.

use thiserror::Error;

use crate::clock::Clock;
use crate::collection::{sorted_by_importance, DateKey, DecodeError, TaskCollection};
use crate::config;
use crate::storage::StorageError;
use crate::task::{Task, TaskId, ValidationError};
use crate::traits::KeyValueStorage;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation was refused, nothing has changed
    #[error("invalid task: {0}")]
    Validation(#[from] ValidationError),
    /// Reading or writing the storage failed.
    /// In case of a write, the in-memory change is kept and [`TaskStore::persist`] can be retried
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
    #[error("unable to serialize tasks: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The stored tasks could not be read. They have been set aside (see [`config::backup_key`]), the store is now empty
    #[error("stored tasks are corrupt: {reason}")]
    CorruptState {
        raw: String,
        #[source]
        reason: DecodeError,
    },
}

/// What [`TaskStore::hydrate`] has found in the storage
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HydrateOutcome {
    /// Nothing was stored yet
    Empty,
    Loaded { dates: usize, tasks: usize },
    /// Tasks were stored in an older format. They have been converted, and saved back in the current format
    Migrated { from_version: u64, dates: usize, tasks: usize },
}


/// The task store: tasks grouped by date, saved to a [`KeyValueStorage`] after every change
#[derive(Debug)]
pub struct TaskStore<S: KeyValueStorage> {
    storage: S,
    key: String,
    collection: TaskCollection,
}

impl<S: KeyValueStorage> TaskStore<S> {
    /// Create an empty store that saves to `storage`, under the configured [`config::STORAGE_KEY`].
    /// You will probably want to call [`Self::hydrate`] next
    pub fn new(storage: S) -> Self {
        Self::new_with_key(storage, &config::storage_key())
    }

    pub fn new_with_key(storage: S, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
            collection: TaskCollection::new(),
        }
    }

    pub fn storage(&self) -> &S { &self.storage }
    pub fn key(&self) -> &str { &self.key }
    /// The full collection, all dates included
    pub fn collection(&self) -> &TaskCollection { &self.collection }

    /// Replace the in-memory tasks with the stored ones.
    ///
    /// When the stored tasks cannot be read or decoded, the store is left empty. A corrupt document is copied to the
    /// backup key before being reported, so that the next write does not destroy it.
    /// When migrated tasks cannot be written back, they are kept in memory and the storage error is returned
    /// (a later [`TaskStore::persist`] can retry).
    pub async fn hydrate(&mut self) -> Result<HydrateOutcome, StoreError> {
        self.collection = TaskCollection::new();

        let raw = match self.storage.get_item(&self.key).await {
            Err(err) => {
                log::warn!("Unable to read stored tasks: {}", err);
                return Err(err.into());
            },
            Ok(None) => {
                log::debug!("No stored tasks under {:?}, starting empty", self.key);
                return Ok(HydrateOutcome::Empty);
            },
            Ok(Some(raw)) => raw,
        };

        let decoded = match TaskCollection::from_json(&raw) {
            Ok(decoded) => decoded,
            Err(reason) => {
                log::error!("Stored tasks are corrupt ({}). Starting empty", reason);
                let backup_key = config::backup_key(&self.key);
                match self.storage.set_item(&backup_key, &raw).await {
                    Ok(()) => log::info!("Corrupt tasks have been kept under {:?}", backup_key),
                    Err(err) => log::warn!("Unable to back corrupt tasks up: {}", err),
                }
                return Err(StoreError::CorruptState { raw, reason });
            },
        };

        let migrated = decoded.was_migrated();
        let from_version = decoded.from_version;
        self.collection = decoded.collection;
        let dates = self.collection.dates().count();
        let tasks = self.collection.task_count();

        if migrated {
            log::info!("Migrating {} stored tasks from format version {}", tasks, from_version);
            self.persist().await?;
            return Ok(HydrateOutcome::Migrated { from_version, dates, tasks });
        }
        log::debug!("Loaded {} tasks over {} dates", tasks, dates);
        Ok(HydrateOutcome::Loaded { dates, tasks })
    }

    /// Save the whole collection to the storage
    pub async fn persist(&mut self) -> Result<(), StoreError> {
        let serialized = self.collection.to_json()?;
        if let Err(err) = self.storage.set_item(&self.key, &serialized).await {
            log::warn!("Unable to save tasks: {}", err);
            return Err(err.into());
        }
        Ok(())
    }

    /// The tasks filed under `date`, in insertion order
    pub fn list_for_date(&self, date: &DateKey) -> &[Task] {
        self.collection.get(date)
    }

    /// The tasks filed under `date`, important ones first (insertion order is kept otherwise)
    pub fn list_for_date_sorted(&self, date: &DateKey) -> Vec<Task> {
        sorted_by_importance(self.collection.get(date))
    }

    /// Today's tasks, important ones first
    pub fn list_today<C: Clock + ?Sized>(&self, clock: &C) -> Vec<Task> {
        self.list_for_date_sorted(&DateKey::today(clock))
    }

    /// Locate a task by its id, whatever date it is filed under
    pub fn find_task(&self, id: &TaskId) -> Option<(&DateKey, &Task)> {
        self.collection.find(id)
    }

    /// Create a task at the end of `date`, and save.
    ///
    /// Blank titles (or blank descriptions, when one is given) are refused.
    pub async fn add_task(&mut self, date: DateKey, title: &str, description: Option<&str>) -> Result<Task, StoreError> {
        let task = Task::new(title, description)?;
        log::debug!("Adding task {} ({:?}) to {}", task.id(), task.title(), date);
        self.collection.push(date, task.clone());
        self.persist().await?;
        Ok(task)
    }

    /// Remove a task, and save.
    /// Returns `None` (and saves nothing) in case there is no such task
    pub async fn remove_task(&mut self, date: &DateKey, id: &TaskId) -> Result<Option<Task>, StoreError> {
        let removed = match self.collection.remove(date, id) {
            None => {
                log::debug!("No task {} to remove on {}", id, date);
                return Ok(None);
            },
            Some(task) => task,
        };
        self.persist().await?;
        Ok(Some(removed))
    }

    /// Flip the importance of a task, and save.
    /// Returns the new importance, or `None` in case there is no such task
    pub async fn toggle_important(&mut self, date: &DateKey, id: &TaskId) -> Result<Option<bool>, StoreError> {
        let is_important = match self.collection.get_task_mut(date, id) {
            None => return Ok(None),
            Some(task) => task.toggle_important(),
        };
        self.persist().await?;
        Ok(Some(is_important))
    }

    /// Record the display string of a confirmed reminder, and save.
    /// Returns whether the task exists
    pub async fn set_reminder_display(&mut self, date: &DateKey, id: &TaskId, display: &str) -> Result<bool, StoreError> {
        self.update_reminder(date, id, Some(display.to_string())).await
    }

    /// Forget the reminder of a task, and save.
    /// Returns whether the task exists
    pub async fn clear_reminder_display(&mut self, date: &DateKey, id: &TaskId) -> Result<bool, StoreError> {
        self.update_reminder(date, id, None).await
    }

    async fn update_reminder(&mut self, date: &DateKey, id: &TaskId, display: Option<String>) -> Result<bool, StoreError> {
        match self.collection.get_task_mut(date, id) {
            None => return Ok(false),
            Some(task) => task.set_reminder_time(display),
        }
        self.persist().await?;
        Ok(true)
    }
}
