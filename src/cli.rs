//! CLI argument parsing for Timemaster.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tm",
    about = "Hierarchical task tracking with Eisenhower-matrix priorities",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/timemaster/logs/timemaster.log"
)]
pub struct Cli {
    /// Directory holding the .timemaster store (default: current directory)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new store in the current directory
    Init,

    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Importance (1=low, 3=high)
        #[arg(short, long, default_value = "2")]
        importance: i64,

        /// Urgency (1=low, 3=high)
        #[arg(short, long, default_value = "2")]
        urgency: i64,

        /// Description
        #[arg(short = 'D', long)]
        description: Option<String>,

        /// Parent task ID
        #[arg(short, long)]
        parent: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,

        /// Estimated effort in hours
        #[arg(long)]
        estimate: Option<f64>,
    },

    /// List top-level tasks, ranked
    List {
        /// Sort key (priority, createdAt, dueDate, title); defaults to settings
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort order (asc, desc)
        #[arg(short, long, default_value = "desc")]
        order: String,

        /// Group by status (in progress, pending, completed)
        #[arg(long)]
        group_by_status: bool,

        /// Do not float overdue tasks to the top
        #[arg(long)]
        no_overdue_first: bool,

        /// Show subtasks as a tree
        #[arg(short, long)]
        tree: bool,
    },

    /// Get a task by ID
    Get {
        /// Task ID
        id: String,
    },

    /// Start working on a task (set status to in_progress)
    Start {
        /// Task ID
        id: String,
    },

    /// Mark a task completed
    Done {
        /// Task ID
        id: String,
    },

    /// Set a task's status
    Status {
        /// Task ID
        id: String,

        /// New status (pending, in_progress, completed)
        status: String,
    },

    /// Update task fields
    Update {
        /// Task ID
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New description
        #[arg(short = 'D', long)]
        description: Option<String>,

        /// New importance (1-3)
        #[arg(short, long)]
        importance: Option<i64>,

        /// New urgency (1-3)
        #[arg(short, long)]
        urgency: Option<i64>,

        /// New due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// Hours actually spent
        #[arg(long)]
        actual: Option<f64>,

        /// Raw JSON patch, applied instead of the flags
        #[arg(long)]
        json: Option<String>,
    },

    /// Delete a task and its subtasks
    Delete {
        /// Task ID
        id: String,
    },

    /// List the direct subtasks of a task
    Children {
        /// Task ID
        id: String,
    },

    /// Export all tasks and settings as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import tasks and settings from an export file
    Import {
        /// Path to the export file
        file: PathBuf,
    },

    /// Show settings, or replace them with a JSON document
    Settings {
        /// Settings JSON to store
        #[arg(long)]
        set: Option<String>,
    },

    /// Show storage usage
    Info,

    /// Delete all tasks and settings
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}
