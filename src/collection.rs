//! The date-keyed collection of tasks, and its persisted format
//!
//! The collection is persisted as a single JSON document:
//! ```json
//! {"version": 2, "tasks": {"2024-03-26": [{"id": "...", "title": "Buy milk", "isImportant": false}]}}
//! ```
//! Documents without a `version` field were written by older versions of the app, which stored the bare
//! date map with various record shapes. [`TaskCollection::from_json`] migrates them.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::clock::Clock;
use crate::task::{Task, TaskId, ValidationError};

/// The version tag written along with the collection
pub const CURRENT_VERSION: u64 = 2;

const DATE_FORMAT: &str = "%Y-%m-%d";


/// A calendar date (`YYYY-MM-DD`) that files a group of tasks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey {
    date: NaiveDate,
}

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// The key of the current local date of `clock`
    pub fn today<C: Clock + ?Sized>(clock: &C) -> Self {
        Self { date: clock.now().naive_local().date() }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl FromStr for DateKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(s.to_string()))?;
        let key = Self { date };
        // chrono tolerates non-padded fields, keys must be canonical
        if key.to_string() != s {
            return Err(ValidationError::InvalidDate(s.to_string()));
        }
        Ok(key)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self::new(date)
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.date.format(DATE_FORMAT))
    }
}

/// Used to support serde
impl Serialize for DateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
/// Used to support serde
impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D>(deserializer: D) -> Result<DateKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}


/// Errors that prevent a persisted document from being read
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("the document is not a JSON object")]
    NotAnObject,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u64),
    #[error("invalid date key: {0}")]
    InvalidDate(#[from] ValidationError),
    #[error("tasks of {0} are not stored as a list")]
    NotAList(String),
}

/// The result of reading a persisted document
#[derive(Debug)]
pub struct Decoded {
    pub collection: TaskCollection,
    /// The format version the document was written in. Anything below [`CURRENT_VERSION`] has been migrated
    pub from_version: u64,
}

impl Decoded {
    pub fn was_migrated(&self) -> bool {
        self.from_version < CURRENT_VERSION
    }
}


/// Tasks, grouped by date, in insertion order.
///
/// A date is present only as long as it has at least one task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskCollection {
    tasks: BTreeMap<DateKey, Vec<Task>>,
}

/// `version` is checked before this is deserialized
#[derive(Deserialize)]
struct VersionedCollection {
    tasks: TaskCollection,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tasks filed under `date` (an empty slice if there are none)
    pub fn get(&self, date: &DateKey) -> &[Task] {
        self.tasks.get(date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_task_mut(&mut self, date: &DateKey, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(date)?
            .iter_mut()
            .find(|task| task.id() == id)
    }

    /// Locate a task by its id, whatever date it is filed under
    pub fn find(&self, id: &TaskId) -> Option<(&DateKey, &Task)> {
        self.tasks.iter()
            .find_map(|(date, tasks)| {
                tasks.iter().find(|task| task.id() == id).map(|task| (date, task))
            })
    }

    /// Append a task to `date`, creating the date if needed
    pub fn push(&mut self, date: DateKey, task: Task) {
        self.tasks.entry(date).or_insert_with(Vec::new).push(task);
    }

    /// Remove a task. The date itself is removed once it has no task left
    pub fn remove(&mut self, date: &DateKey, id: &TaskId) -> Option<Task> {
        let tasks = self.tasks.get_mut(date)?;
        let position = tasks.iter().position(|task| task.id() == id)?;
        let removed = tasks.remove(position);
        if tasks.is_empty() {
            self.tasks.remove(date);
        }
        Some(removed)
    }

    pub fn dates(&self) -> impl Iterator<Item = &DateKey> {
        self.tasks.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &[Task])> {
        self.tasks.iter().map(|(date, tasks)| (date, tasks.as_slice()))
    }

    pub fn contains_date(&self, date: &DateKey) -> bool {
        self.tasks.contains_key(date)
    }

    /// The total number of tasks, all dates included
    pub fn task_count(&self) -> usize {
        self.tasks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove tasks that break the task rules (e.g. blank titles), and dates left without any task
    fn drop_invalid(&mut self) {
        self.tasks.retain(|date, tasks| {
            tasks.retain(|task| match task.validate() {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("Dropping invalid task {} of {}: {}", task.id(), date, err);
                    false
                },
            });
            tasks.is_empty() == false
        });
    }

    /// Serialize into the current (versioned) format
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Borrowed<'a> {
            version: u64,
            tasks: &'a TaskCollection,
        }
        serde_json::to_string(&Borrowed { version: CURRENT_VERSION, tasks: self })
    }

    /// Read a persisted document, in the current format or in any older one
    pub fn from_json(raw: &str) -> Result<Decoded, DecodeError> {
        let value: Value = serde_json::from_str(raw)?;
        let object = match value {
            Value::Object(object) => object,
            _ => return Err(DecodeError::NotAnObject),
        };

        if let Some(version) = object.get("version") {
            let version = version.as_u64().unwrap_or(0);
            if version != CURRENT_VERSION {
                return Err(DecodeError::UnsupportedVersion(version));
            }
            let versioned: VersionedCollection = serde_json::from_value(Value::Object(object))?;
            let mut collection = versioned.tasks;
            collection.drop_invalid();
            return Ok(Decoded { collection, from_version: CURRENT_VERSION });
        }

        migrate_unversioned(object)
    }
}

/// Sort tasks so that important ones come first.
/// This sort is stable: tasks of equal importance keep their insertion order
pub fn sorted_by_importance(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|task| !task.is_important());
    sorted
}



/// Records written before the format was versioned
#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyRecord {
    /// The list screen stored bare strings
    Text(String),
    Fields(LegacyFields),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyFields {
    /// Either a string or a timestamp
    id: Option<Value>,
    #[serde(alias = "name", alias = "text")]
    title: Option<String>,
    #[serde(alias = "data")]
    description: Option<String>,
    #[serde(default)]
    is_important: bool,
    reminder_time: Option<String>,
}

fn migrate_unversioned(object: serde_json::Map<String, Value>) -> Result<Decoded, DecodeError> {
    let mut collection = TaskCollection::new();
    // Records with ids were introduced in version 1
    let mut from_version = 0;

    for (raw_date, records) in object {
        let date: DateKey = raw_date.parse()?;
        let records: Vec<LegacyRecord> = match records {
            Value::Array(_) => serde_json::from_value(records)?,
            _ => return Err(DecodeError::NotAList(raw_date)),
        };

        for record in records {
            let (id, title, description, is_important, reminder_time) = match record {
                LegacyRecord::Text(text) => (None, Some(text), None, false, None),
                LegacyRecord::Fields(f) => (f.id, f.title, f.description, f.is_important, f.reminder_time),
            };
            if id.is_some() {
                from_version = 1;
            }

            let id = match id {
                Some(Value::String(id)) => TaskId::from(id),
                Some(Value::Number(id)) => TaskId::from(id.to_string()),
                _ => TaskId::random(),
            };
            let title = title.unwrap_or_default();
            let description = description.filter(|d| d.trim().is_empty() == false);
            match Task::new_with_parameters(id, &title, description.as_deref(), is_important, reminder_time, None) {
                Ok(task) => collection.push(date, task),
                Err(err) => log::warn!("Dropping a task of {} that cannot be migrated: {}", date, err),
            }
        }
    }

    Ok(Decoded { collection, from_version })
}
