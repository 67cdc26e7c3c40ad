//! Utilities to observe the changes made to an agenda

use std::fmt::{Display, Error, Formatter};

use crate::collection::DateKey;
use crate::task::TaskId;

/// The last thing that happened to an agenda
#[derive(Clone, Debug, PartialEq)]
pub enum AgendaEvent {
    /// Tasks have not been loaded yet
    NotLoaded,
    /// Tasks have been loaded from the storage
    Hydrated { tasks: usize },
    TaskAdded { date: DateKey, id: TaskId },
    TaskRemoved { date: DateKey, id: TaskId },
    ImportanceToggled { date: DateKey, id: TaskId, is_important: bool },
    ReminderSet { date: DateKey, id: TaskId, display: String },
    /// Something could not be done. Details have been logged as well
    Failed { details: String },
}

impl Display for AgendaEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            AgendaEvent::NotLoaded => write!(f, "Not loaded"),
            AgendaEvent::Hydrated{tasks} => write!(f, "Loaded {} tasks", tasks),
            AgendaEvent::TaskAdded{date, id} => write!(f, "[{}] added {}", date, id),
            AgendaEvent::TaskRemoved{date, id} => write!(f, "[{}] removed {}", date, id),
            AgendaEvent::ImportanceToggled{date, id, is_important} => match is_important {
                true => write!(f, "[{}] {} is now important", date, id),
                false => write!(f, "[{}] {} is not important anymore", date, id),
            },
            AgendaEvent::ReminderSet{date, id, display} => write!(f, "[{}] reminder of {} set at {}", date, id, display),
            AgendaEvent::Failed{details} => write!(f, "Failure: {}", details),
        }
    }
}

impl Default for AgendaEvent {
    fn default() -> Self {
        Self::NotLoaded
    }
}



/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<AgendaEvent>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<AgendaEvent>;

/// Create a feeback channel, that can be used to observe the last change made to an agenda
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(AgendaEvent::default())
}
