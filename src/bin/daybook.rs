use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};

use daybook::clock::{parse_time_of_day, SystemClock};
use daybook::notification::TokioNotificationService;
use daybook::agenda::AgendaError;
use daybook::reminder::ReminderOutcome;
use daybook::store::StoreError;
use daybook::storage::FileStorage;
use daybook::utils::{print_task, print_task_collection};
use daybook::{Agenda, DateKey, ReminderScheduler, TaskId, TaskStore};

const DEFAULT_DATA_DIR: &str = "daybook_data";

#[derive(Parser, Debug)]
#[command(name = "daybook", version, about = "Dated to-do list with reminders")]
struct Cli {
    /// Folder the tasks are saved in
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task to a date (YYYY-MM-DD)
    Add {
        date: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List the tasks of a date, important ones first (today by default)
    List {
        date: Option<String>,
    },
    /// Delete a task
    Remove {
        date: String,
        id: String,
    },
    /// Mark a task as important, or not important anymore
    Toggle {
        date: String,
        id: String,
    },
    /// Set a reminder at a time of day (HH:MM or h:MM AM/PM) on the task's date, and wait for it to fire
    Remind {
        date: String,
        id: String,
        time: String,
    },
    /// Print every task
    Dump,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        log::error!("{}", err);
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let (notifier, mut delivered) = TokioNotificationService::new();
    let store = TaskStore::new(FileStorage::new(&cli.data_dir));
    let scheduler = ReminderScheduler::new(notifier, SystemClock);
    let mut agenda = Agenda::new(store, scheduler);

    match agenda.hydrate().await {
        Ok(outcome) => log::debug!("Hydrated: {:?}", outcome),
        Err(AgendaError::Store(StoreError::CorruptState { reason, .. })) => {
            log::warn!("Stored tasks are corrupt ({}). They have been kept aside, starting empty", reason);
        },
        Err(err) => return Err(err.into()),
    }

    match cli.command {
        Command::Add { date, title, description } => {
            let date: DateKey = date.parse()?;
            let task = agenda.add_task(date, &title, description.as_deref()).await?;
            println!("Added {}", task.id());
        },
        Command::List { date } => {
            let tasks = match date {
                Some(date) => agenda.store().list_for_date_sorted(&date.parse()?),
                None => agenda.today(),
            };
            if tasks.is_empty() {
                println!("No tasks for this date.");
            }
            for task in &tasks {
                print_task(task);
            }
        },
        Command::Remove { date, id } => {
            let id: TaskId = id.parse()?;
            match agenda.remove_task(&date.parse()?, &id).await? {
                Some(task) => println!("Removed {:?}", task.title()),
                None => println!("No such task"),
            }
        },
        Command::Toggle { date, id } => {
            let id: TaskId = id.parse()?;
            match agenda.toggle_important(&date.parse()?, &id).await? {
                Some(true) => println!("{} is now important", id),
                Some(false) => println!("{} is not important anymore", id),
                None => println!("No such task"),
            }
        },
        Command::Remind { date, id, time } => {
            let date: DateKey = date.parse()?;
            let id: TaskId = id.parse()?;
            let naive = date.date().and_time(parse_time_of_day(&time)?);
            let at = Local.from_local_datetime(&naive).earliest()
                .ok_or_else(|| format!("{} does not exist in the local time zone", naive))?;

            agenda.show_picker();
            match agenda.confirm_reminder(&date, &id, at).await? {
                ReminderOutcome::PermissionDenied { display } => {
                    println!("Reminder set at {}, but notifications are not allowed", display);
                },
                ReminderOutcome::Scheduled { display, delay, .. } => {
                    println!("Reminder set at {}, waiting {}s for it to fire...", display, delay.as_secs());
                    // Leave some slack for the timer itself
                    let wait = delay + Duration::from_secs(1);
                    match tokio::time::timeout(wait, delivered.recv()).await {
                        Ok(Some(notification)) => println!("{}: {}", notification.title, notification.body),
                        _ => println!("The reminder did not fire"),
                    }
                },
            }
        },
        Command::Dump => {
            print_task_collection(agenda.store().collection());
        },
    }

    Ok(())
}
