//! Some utility functions

use crate::collection::TaskCollection;
use crate::task::Task;

/// A debug utility that pretty-prints every task of a collection
pub fn print_task_collection(collection: &TaskCollection) {
    for (date, tasks) in collection.iter() {
        println!("DAY {} ({} tasks)", date, tasks.len());
        for task in tasks {
            print_task(task);
        }
    }
}

pub fn print_task(task: &Task) {
    println!("    {}", format_task(task));
}

/// A one-line summary of a task: its importance, its title, its reminder and its id
pub fn format_task(task: &Task) -> String {
    let importance = if task.is_important() { "!" } else { " " };
    let reminder = match task.reminder_time() {
        Some(time) => format!(" [{}]", time),
        None => String::new(),
    };
    let description = match task.description() {
        Some(descr) => format!(" - {}", descr),
        None => String::new(),
    };
    format!("{} {}{}{}\t{}", importance, task.title(), description, reminder, task.id())
}
