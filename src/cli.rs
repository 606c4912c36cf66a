// File: ./src/cli.rs
//! Command-line parsing and help text for the `taskcal` binary.
use crate::model::LocalDate;
use anyhow::{Result, anyhow, bail};
use std::path::PathBuf;

pub const DEFAULT_PREVIEW_DAYS: u64 = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Resync,
    Due(Option<LocalDate>),
    Events {
        from: Option<LocalDate>,
        to: Option<LocalDate>,
    },
    Tasks,
    Project {
        task_id: String,
        days: u64,
    },
    Import(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub root: Option<PathBuf>,
    pub verbose: bool,
    pub command: Command,
}

/// Parses arguments, excluding the binary name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut root = None;
    let mut verbose = false;
    let mut rest: Vec<&str> = Vec::new();

    let mut iter = args.iter().map(String::as_str);
    while let Some(arg) = iter.next() {
        match arg {
            "-r" | "--root" => {
                let path = iter.next().ok_or_else(|| anyhow!("{} needs a path", arg))?;
                root = Some(PathBuf::from(path));
            }
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" | "help" => {
                return Ok(Invocation {
                    root,
                    verbose,
                    command: Command::Help,
                });
            }
            other => rest.push(other),
        }
    }

    let command = match rest.split_first() {
        None => Command::Help,
        Some((&"resync", [])) => Command::Resync,
        Some((&"tasks", [])) => Command::Tasks,
        Some((&"due", [])) => Command::Due(None),
        Some((&"due", [date])) => Command::Due(Some(date.parse()?)),
        Some((&"events", flags)) => {
            let mut from = None;
            let mut to = None;
            let mut flags = flags.iter();
            while let Some(flag) = flags.next() {
                let value = flags
                    .next()
                    .ok_or_else(|| anyhow!("{} needs a date", flag))?;
                match *flag {
                    "--from" => from = Some(value.parse()?),
                    "--to" => to = Some(value.parse()?),
                    _ => bail!("Unknown events option '{}'", flag),
                }
            }
            Command::Events { from, to }
        }
        Some((&"project", [task_id])) => Command::Project {
            task_id: task_id.to_string(),
            days: DEFAULT_PREVIEW_DAYS,
        },
        Some((&"project", [task_id, "--days", n])) => Command::Project {
            task_id: task_id.to_string(),
            days: n
                .parse()
                .map_err(|_| anyhow!("--days expects a number, got '{}'", n))?,
        },
        Some((&"import", [file])) => Command::Import(PathBuf::from(file)),
        Some((cmd, _)) => bail!("Unknown or incomplete command '{}'. See --help.", cmd),
    };

    Ok(Invocation {
        root,
        verbose,
        command,
    })
}

pub fn print_help(binary_name: &str) {
    println!(
        "Taskcal v{} - Calendar projection for recurring tasks and bills",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] [-v] <command>", binary_name);
    println!();
    println!("COMMANDS:");
    println!("    resync                         Regenerate task and bill events");
    println!("    due [YYYY-MM-DD]               List tasks due on a date (default: today)");
    println!("    events [--from D] [--to D]     List calendar events");
    println!("    tasks                          List task definitions");
    println!(
        "    project <task-id> [--days N]   Preview a task's occurrences (default: {} days)",
        DEFAULT_PREVIEW_DAYS
    );
    println!("    import <file.json>             Merge tasks from a JSON array, then resync");
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -v, --verbose         Log debug output.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("RECURRENCE PATTERNS:");
    println!("    one-time    On scheduled_date only");
    println!("    tomorrow    The day after the task was created");
    println!("    everyday    Every day (materialized one year ahead)");
    println!("    weekly      On the weekdays in schedule");
    println!("    biweekly    On the weekdays in schedule, every other week from recurrence_date");
    println!("    monthly     On the day of month of recurrence_date");
    println!("    yearly      On the day and month of recurrence_date");
}
