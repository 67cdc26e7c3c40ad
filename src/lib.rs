//! This crate provides a date-keyed to-do store with local reminders.
//!
//! Tasks are filed under a calendar date, in a [`TaskStore`](store::TaskStore) that saves the whole collection to a
//! key-value storage after every change, and that loads it back (migrating older formats if needed) on startup.
//!
//! Reminders are scheduled by a [`ReminderScheduler`](reminder::ReminderScheduler), that drives a time picker and
//! registers one-shot notifications with the platform notification service.
//!
//! Both are combined in an [`Agenda`], which is the only thing screens need to hold. \
//! The platform capabilities (storage and notifications) are abstracted by the traits of the [`traits`] module.

pub mod traits;

pub mod clock;
mod task;
pub use task::{Task, TaskId, ValidationError};
pub mod collection;
pub use collection::{DateKey, TaskCollection};
pub mod store;
pub use store::TaskStore;
pub mod reminder;
pub use reminder::ReminderScheduler;
pub mod agenda;
pub use agenda::Agenda;

pub mod storage;
pub mod notification;
pub mod mock_behaviour;

pub mod config;
pub mod utils;
