//! Timemaster CLI - hierarchical task tracking with Eisenhower-matrix priorities.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use timemaster::{
    Category, NewTask, Settings, SortBy, SortOptions, SortOrder, Status, Store, Task, TaskPatch, parse_timestamp,
};

mod cli;

use cli::{Cli, Command};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timemaster")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("timemaster.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn get_store_dir(cli: &Cli) -> PathBuf {
    cli.dir
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn format_status(status: Status) -> ColoredString {
    match status {
        Status::Pending => "pending".white(),
        Status::InProgress => "in_progress".yellow(),
        Status::Completed => "completed".green(),
    }
}

fn format_score(task: &Task) -> ColoredString {
    let score = format!("P{:02}", task.priority_score());
    match task.category() {
        Category::UrgentImportant => score.red().bold(),
        Category::ImportantNotUrgent => score.yellow(),
        Category::UrgentNotImportant => score.blue(),
        Category::NotUrgentNotImportant => score.dimmed(),
    }
}

fn parse_due(raw: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_timestamp(raw).ok_or_else(|| eyre::eyre!("Invalid date '{}': expected YYYY-MM-DD or RFC 3339", raw))
}

fn print_line(task: &Task, indent: usize, now: chrono::DateTime<chrono::Utc>) {
    let overdue = if task.is_overdue(now) {
        format!(" {}", "overdue".red())
    } else {
        String::new()
    };
    println!(
        "{}{} {} {} {} {}{}",
        "  ".repeat(indent),
        task.task_number.bold(),
        format_status(task.status()),
        format_score(task),
        task.id().cyan(),
        task.title,
        overdue
    );
}

fn print_tree(task: &Task, indent: usize, now: chrono::DateTime<chrono::Utc>) {
    print_line(task, indent, now);
    for child in task.sub_tasks() {
        print_tree(child, indent + 1, now);
    }
}

fn print_task(task: &Task, now: chrono::DateTime<chrono::Utc>) {
    println!("{}: {}", "ID".bold(), task.id().cyan());
    println!("{}: {}", "Number".bold(), task.task_number);
    println!("{}: {}", "Title".bold(), task.title);
    if !task.description.is_empty() {
        println!("{}: {}", "Description".bold(), task.description);
    }
    println!("{}: {} ({})", "Status".bold(), format_status(task.status()), task.status().label());
    println!(
        "{}: {} (importance {}, urgency {})",
        "Priority".bold(),
        format_score(task),
        task.importance(),
        task.urgency()
    );
    println!("{}: {}", "Category".bold(), task.category().label());
    println!("{}: {}", "Level".bold(), task.task_level());
    if let Some(parent) = task.parent_id() {
        println!("{}: {}", "Parent".bold(), parent.cyan());
    }
    println!("{}: {}", "Created".bold(), task.created_at());
    if let Some(started) = task.started_at() {
        println!("{}: {}", "Started".bold(), started);
    }
    if let Some(completed) = task.completed_at() {
        println!("{}: {}", "Completed".bold(), completed);
    }
    if let Some(due) = task.due_date {
        let marker = if task.is_overdue(now) { " (overdue)".red() } else { "".normal() };
        println!("{}: {}{}", "Due".bold(), due, marker);
    }
    if task.estimated_hours() > 0.0 || task.actual_hours() > 0.0 {
        println!(
            "{}: {}h estimated, {}h spent",
            "Effort".bold(),
            task.estimated_hours(),
            task.actual_hours()
        );
    }
    if !task.sub_tasks().is_empty() {
        println!("{}: {} ({}% done)", "Subtasks".bold(), task.sub_tasks().len(), task.progress());
    }
}

fn run(cli: Cli) -> Result<()> {
    let store_dir = get_store_dir(&cli);

    match cli.command {
        Command::Init => {
            Store::init(&store_dir).context("Failed to initialize timemaster store")?;
            println!("{} Initialized timemaster store in {}", "✓".green(), store_dir.display());
        }

        Command::Add {
            title,
            importance,
            urgency,
            description,
            parent,
            due,
            estimate,
        } => {
            let mut store = Store::open(&store_dir).context("Failed to open store")?;

            let mut fields = NewTask::new(title).with_priority(importance, urgency);
            if let Some(description) = description {
                fields = fields.with_description(description);
            }
            if let Some(parent) = parent {
                fields = fields.with_parent(parent);
            }
            if let Some(due) = due {
                fields = fields.with_due_date(parse_due(&due)?);
            }
            if let Some(hours) = estimate {
                fields = fields.with_estimated_hours(hours);
            }

            let task = store.create(fields).context("Failed to create task")?;
            println!(
                "{} Created: {} {} {}",
                "✓".green(),
                task.task_number.bold(),
                task.id().cyan(),
                task.title
            );
        }

        Command::List {
            sort,
            order,
            group_by_status,
            no_overdue_first,
            tree,
        } => {
            let store = Store::open(&store_dir).context("Failed to open store")?;
            let sorting = store.get_settings().sorting;

            let mut options: SortOptions = sorting.sort_options();
            if let Some(sort) = sort {
                options.sort_by = sort.parse::<SortBy>().map_err(|e| eyre::eyre!(e))?;
            }
            options.sort_order = order.parse::<SortOrder>().map_err(|e| eyre::eyre!(e))?;
            options.group_by_status |= group_by_status;
            if no_overdue_first {
                options.prioritize_overdue = false;
            }

            let tasks = store.list_sorted(&options);
            let now = store.now();

            if tasks.is_empty() {
                println!("{}", "No tasks found".dimmed());
            } else {
                for task in &tasks {
                    if tree {
                        print_tree(task, 0, now);
                    } else {
                        print_line(task, 0, now);
                    }
                }
            }
        }

        Command::Get { id } => {
            let store = Store::open(&store_dir).context("Failed to open store")?;
            match store.get(&id) {
                Some(task) => print_task(&task, store.now()),
                None => {
                    eprintln!("{} Task not found: {}", "✗".red(), id);
                    std::process::exit(1);
                }
            }
        }

        Command::Start { id } => {
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            let task = store
                .update(&id, TaskPatch::status(Status::InProgress))
                .context("Failed to start task")?;

            println!("{} Started: {} {}", "→".blue(), task.id().cyan(), task.title);
        }

        Command::Done { id } => {
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            let task = store
                .update(&id, TaskPatch::status(Status::Completed))
                .context("Failed to complete task")?;

            println!("{} Completed: {} {}", "✓".green(), task.id().cyan(), task.title);
        }

        Command::Status { id, status } => {
            let status = status.parse::<Status>().map_err(|e| eyre::eyre!(e))?;
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            let task = store
                .update(&id, TaskPatch::status(status))
                .context("Failed to set status")?;

            println!(
                "{} {} is now {}",
                "✓".green(),
                task.id().cyan(),
                format_status(task.status())
            );
        }

        Command::Update {
            id,
            title,
            description,
            importance,
            urgency,
            due,
            clear_due,
            actual,
            json,
        } => {
            let patch = match json {
                Some(json) => serde_json::from_str::<TaskPatch>(&json).context("Failed to parse patch JSON")?,
                None => {
                    let due_date = match (due, clear_due) {
                        (Some(due), _) => Some(Some(parse_due(&due)?)),
                        (None, true) => Some(None),
                        (None, false) => None,
                    };
                    TaskPatch {
                        title,
                        description,
                        importance,
                        urgency,
                        due_date,
                        actual_hours: actual,
                        ..Default::default()
                    }
                }
            };

            if patch.is_empty() {
                println!("{}", "Nothing to update".dimmed());
                return Ok(());
            }

            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            let task = store.update(&id, patch).context("Failed to update task")?;

            println!("{} Updated: {} {}", "✓".green(), task.id().cyan(), task.title);
        }

        Command::Delete { id } => {
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            if !store.delete(&id) {
                eyre::bail!("Failed to delete task {}", id);
            }
            println!("{} Deleted: {}", "✓".green(), id.cyan());
        }

        Command::Children { id } => {
            let store = Store::open(&store_dir).context("Failed to open store")?;
            let children = store.children_of(&id).context("Failed to list subtasks")?;
            let now = store.now();

            if children.is_empty() {
                println!("{}", "No subtasks".dimmed());
            } else {
                for child in &children {
                    print_line(child, 0, now);
                }
            }
        }

        Command::Export { output } => {
            let store = Store::open(&store_dir).context("Failed to open store")?;
            let bundle = store.export_all();
            let json = serde_json::to_string_pretty(&bundle).context("Failed to serialize export")?;

            match output {
                Some(path) => {
                    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
                    println!(
                        "{} Exported {} task(s) to {}",
                        "✓".green(),
                        bundle.tasks.len(),
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }

        Command::Import { file } => {
            let data = fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            if !store.import_json(&data) {
                eyre::bail!("{} is not a valid export file", file.display());
            }
            println!("{} Imported {}", "✓".green(), file.display());
        }

        Command::Settings { set } => {
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            if let Some(json) = set {
                let settings: Settings = serde_json::from_str(&json).context("Failed to parse settings JSON")?;
                if !store.save_settings(&settings) {
                    eyre::bail!("Failed to save settings");
                }
                println!("{} Settings saved", "✓".green());
            } else {
                let settings = store.get_settings();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&settings).context("Failed to serialize settings")?
                );
            }
        }

        Command::Info => {
            let store = Store::open(&store_dir).context("Failed to open store")?;
            let info = store.storage_info();
            println!("{}: {}", "Location".bold(), store.storage().dir().display());
            println!("{}: {:.2} KB", "Tasks".bold(), info.tasks_kb);
            println!("{}: {:.2} KB", "Settings".bold(), info.settings_kb);
            println!("{}: {:.2} KB", "Total".bold(), info.total_kb);
        }

        Command::Clear { yes } => {
            if !yes {
                eprintln!("{} Refusing to clear without --yes", "✗".red());
                std::process::exit(1);
            }
            let mut store = Store::open(&store_dir).context("Failed to open store")?;
            if !store.clear_all() {
                eyre::bail!("Failed to clear store");
            }
            println!("{} Cleared all tasks and settings", "✓".green());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
