// File: ./src/bin/taskcal.rs
use anyhow::Result;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::env;
use std::sync::Arc;
use taskcal::cli::{self, Command};
use taskcal::config::Config;
use taskcal::context::{AppContext, StandardContext};
use taskcal::controller::{CalendarController, SyncOutcome};
use taskcal::model::LocalDate;
use taskcal::storage::LocalStorage;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let binary_name = args.first().map(String::as_str).unwrap_or("taskcal");
    let invocation = cli::parse_args(args.get(1..).unwrap_or_default())?;

    let ctx: Arc<dyn AppContext> = Arc::new(StandardContext::new(invocation.root.clone()));
    let config = Config::load_or_default(ctx.as_ref())?;

    let level = if invocation.verbose {
        LevelFilter::Debug
    } else {
        config.log_level_filter()
    };
    let _ = TermLogger::init(
        level,
        ConfigBuilder::new().set_time_level(LevelFilter::Off).build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let controller = CalendarController::open(ctx, config)?;

    match invocation.command {
        Command::Help => cli::print_help(binary_name),
        Command::Resync => {
            let outcome = controller.resync().await?;
            print_outcome(&outcome);
        }
        Command::Due(date) => {
            let date = date.unwrap_or_else(LocalDate::today);
            let due = controller.due_on(date).await;
            if due.is_empty() {
                println!("Nothing due on {}", date);
            }
            for task in due {
                let time = task.time.as_deref().unwrap_or("all day");
                println!("{}  {:<8}  {} [{}]", date, time, task.name, task.category);
            }
        }
        Command::Events { from, to } => {
            let from = from.unwrap_or_else(LocalDate::today);
            let to = match to {
                Some(to) => to,
                None => from.add_months(1).unwrap_or(from),
            };
            for event in controller.events_between(from, to).await {
                let time = event.time.as_deref().unwrap_or("all day");
                println!("{}  {:<8}  {:<8}  {}", event.date, time, event.kind, event.title);
            }
        }
        Command::Tasks => {
            let tasks = controller.tasks.lock().await;
            for task in &tasks.tasks {
                let shown = if task.show_in_calendar { "" } else { " (hidden)" };
                println!(
                    "{}  {:<10}  {}{}",
                    task.id, task.recurrence_pattern, task.name, shown
                );
            }
        }
        Command::Project { task_id, days } => {
            for draft in controller.preview(&task_id, days).await? {
                let time = draft.time.as_deref().unwrap_or("all day");
                println!("{}  {:<8}  {}", draft.date, time, draft.title);
            }
        }
        Command::Import(path) => {
            let incoming = LocalStorage::read_task_file(&path)?;
            println!("Importing {} tasks from {}", incoming.len(), path.display());
            let outcome = controller.import_tasks(incoming).await?;
            print_outcome(&outcome);
        }
    }

    Ok(())
}

fn print_outcome(outcome: &SyncOutcome) {
    let t = &outcome.tasks;
    println!(
        "Tasks: {} events removed, {} created, {} tasks skipped",
        t.deleted, t.created, t.skipped_sources
    );
    if let Some(b) = &outcome.bills {
        println!(
            "Bills: {} events removed, {} created, {} bills skipped",
            b.deleted, b.created, b.skipped_sources
        );
    }
    let failures = t.failed_deletes + t.failed_inserts
        + outcome
            .bills
            .map(|b| b.failed_deletes + b.failed_inserts)
            .unwrap_or(0);
    if failures > 0 {
        eprintln!("{} store operations failed; see log output", failures);
    }
}
