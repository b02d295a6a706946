//! High-level store API: CRUD and tree search over the persisted forest.
//!
//! Every mutating call is load -> mutate -> save of the whole forest blob.
//! Nothing here locks; two stores writing the same backend interleave with
//! last-write-wins.

use crate::clock::{Clock, SystemClock};
use crate::forest;
use crate::priority::{self, PriorityError, SortOptions};
use crate::settings::Settings;
use crate::storage::{FileStorage, KeyValueStore};
use crate::task::{NewTask, PortableTask, Task, TaskError, TaskPatch};
use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Key holding the serialized task forest.
pub const TASKS_KEY: &str = "time_master_tasks";

/// Key holding the settings blob.
pub const SETTINGS_KEY: &str = "time_master_settings";

/// Reserved backup timestamp key; cleared by `clear_all`.
pub const LAST_BACKUP_KEY: &str = "time_master_last_backup";

/// Version stamped into exports.
pub const EXPORT_VERSION: &str = "1.0.0";

/// Errors that can occur during store operations.
#[derive(Debug)]
pub enum StoreError {
    /// No task with this id.
    TaskNotFound(String),
    /// `parent_id` did not resolve.
    ParentNotFound(String),
    /// Strict priority validation failed.
    InvalidInput(PriorityError),
    /// A tree operation was refused.
    Task(TaskError),
    /// `create` was handed subtasks; each must be created on its own.
    NestedCreate { count: usize },
    /// The backend refused the write.
    Persistence,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::TaskNotFound(id) => write!(f, "task not found: {}", id),
            StoreError::ParentNotFound(id) => write!(f, "parent task not found: {}", id),
            StoreError::InvalidInput(e) => write!(f, "invalid input: {}", e),
            StoreError::Task(e) => write!(f, "{}", e),
            StoreError::NestedCreate { count } => {
                write!(f, "cannot create a task with {} subtask(s); create them under it instead", count)
            }
            StoreError::Persistence => write!(f, "failed to persist tasks"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Whole-dataset export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub tasks: Vec<PortableTask>,
    pub settings: Settings,
}

/// Import payload. Either part may be missing; a missing part is left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBundle {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tasks: Option<Vec<PortableTask>>,
    #[serde(default)]
    pub settings: Option<Settings>,
}

impl From<ExportBundle> for ImportBundle {
    fn from(bundle: ExportBundle) -> Self {
        Self {
            version: Some(bundle.version),
            tasks: Some(bundle.tasks),
            settings: Some(bundle.settings),
        }
    }
}

/// Payload sizes in KiB, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StorageInfo {
    pub tasks_kb: f64,
    pub settings_kb: f64,
    pub total_kb: f64,
}

fn kib(bytes: usize) -> f64 {
    (bytes as f64 / 1024.0 * 100.0).round() / 100.0
}

/// The task store.
pub struct Store<S = FileStorage, C = SystemClock> {
    storage: S,
    clock: C,
}

impl Store<FileStorage, SystemClock> {
    /// Initialize a new file-backed store in the given directory.
    pub fn init(root: &Path) -> Result<Self> {
        let storage = FileStorage::init(root)?;
        Ok(Self::new(storage, SystemClock))
    }

    /// Open an existing file-backed store.
    pub fn open(root: &Path) -> Result<Self> {
        let storage = FileStorage::open(root)?;
        Ok(Self::new(storage, SystemClock))
    }
}

impl<S: KeyValueStore, C: Clock> Store<S, C> {
    pub fn new(storage: S, clock: C) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Load the whole forest. Unreadable or corrupt data yields an empty
    /// forest and a warning.
    pub fn get_all(&self) -> Vec<Task> {
        let raw = match self.storage.get(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Failed to read tasks: {:#}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<PortableTask>>(&raw) {
            Ok(data) => {
                let now = self.clock.now();
                data.into_iter().map(|t| Task::from_portable(t, now)).collect()
            }
            Err(e) => {
                log::warn!("Failed to parse stored tasks, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Persist the whole forest. Returns false if the backend refused.
    pub fn save_all(&mut self, tasks: &[Task]) -> bool {
        let data: Vec<PortableTask> = tasks.iter().map(Task::to_portable).collect();
        let result = serde_json::to_string(&data)
            .context("Failed to serialize tasks")
            .and_then(|json| self.storage.set(TASKS_KEY, &json));

        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save tasks: {:#}", e);
                false
            }
        }
    }

    /// Depth-first search of `tasks` for `id`.
    pub fn find_by_id<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
        forest::find(tasks, id)
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Option<Task> {
        Self::find_by_id(&self.get_all(), id).cloned()
    }

    /// Direct children of a task, in creation order.
    pub fn children_of(&self, id: &str) -> Result<Vec<Task>> {
        let tasks = self.get_all();
        let task =
            Self::find_by_id(&tasks, id).ok_or_else(|| eyre::eyre!(StoreError::TaskNotFound(id.to_string())))?;
        Ok(task.sub_tasks().to_vec())
    }

    /// Top-level tasks ranked with `options` at the current time.
    pub fn list_sorted(&self, options: &SortOptions) -> Vec<Task> {
        priority::sort_tasks(&self.get_all(), options, self.clock.now())
    }

    fn persist(&mut self, tasks: &[Task]) -> Result<()> {
        if self.save_all(tasks) {
            Ok(())
        } else {
            Err(eyre::eyre!(StoreError::Persistence))
        }
    }

    /// Create a task, top-level or under `fields.parent_id`.
    ///
    /// The id is always generated here; a caller-supplied `fields.id` is
    /// ignored. The task number comes from the current sibling count and is
    /// never renumbered afterwards.
    pub fn create(&mut self, fields: NewTask) -> Result<Task> {
        if !fields.sub_tasks.is_empty() {
            return Err(eyre::eyre!(StoreError::NestedCreate {
                count: fields.sub_tasks.len()
            }));
        }
        if let Some(id) = &fields.id {
            log::debug!("Ignoring caller-supplied id {} on create", id);
        }

        let now = self.clock.now();
        let mut tasks = self.get_all();
        let parent_id = fields.parent_id.clone();

        let (task_number, task_level) = match parent_id.as_deref() {
            None => (forest::next_root_number(&tasks), 1),
            Some(pid) => {
                let parent = forest::find(&tasks, pid)
                    .ok_or_else(|| eyre::eyre!(StoreError::ParentNotFound(pid.to_string())))?;
                (forest::next_child_number(parent), parent.task_level() as i64 + 1)
            }
        };

        let task = Task::new(
            NewTask {
                id: None,
                task_number,
                task_level: Some(task_level),
                ..fields
            },
            now,
        );
        let id = task.id().to_string();

        match parent_id.as_deref() {
            Some(pid) => {
                let parent = forest::find_mut(&mut tasks, pid)
                    .ok_or_else(|| eyre::eyre!(StoreError::ParentNotFound(pid.to_string())))?;
                parent.add_child(task).map_err(|e| eyre::eyre!(StoreError::Task(e)))?;
            }
            None => tasks.push(task),
        }

        self.persist(&tasks)?;

        let created = forest::find(&tasks, &id)
            .cloned()
            .ok_or_else(|| eyre::eyre!(StoreError::TaskNotFound(id.clone())))?;
        log::debug!("Created task {} ({})", created.id(), created.task_number);
        Ok(created)
    }

    /// Apply a patch to a task anywhere in the forest.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        let now = self.clock.now();
        let mut tasks = self.get_all();

        let task =
            forest::find_mut(&mut tasks, id).ok_or_else(|| eyre::eyre!(StoreError::TaskNotFound(id.to_string())))?;
        task.apply_patch(patch, now)
            .map_err(|e| eyre::eyre!(StoreError::InvalidInput(e)))?;
        let updated = task.clone();

        self.persist(&tasks)?;
        log::debug!("Updated task {}", id);
        Ok(updated)
    }

    /// Delete a task and its subtree. Deleting an unknown id succeeds; only a
    /// failed write returns false.
    pub fn delete(&mut self, id: &str) -> bool {
        let mut tasks = self.get_all();
        if !forest::remove(&mut tasks, id) {
            log::debug!("Delete of unknown task {} is a no-op", id);
        }
        self.save_all(&tasks)
    }

    /// Stored settings, or defaults when missing or unreadable.
    pub fn get_settings(&self) -> Settings {
        match self.storage.get(SETTINGS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Failed to parse settings, using defaults: {}", e);
                Settings::default()
            }),
            Ok(None) => Settings::default(),
            Err(e) => {
                log::warn!("Failed to read settings, using defaults: {:#}", e);
                Settings::default()
            }
        }
    }

    pub fn save_settings(&mut self, settings: &Settings) -> bool {
        let result = serde_json::to_string(settings)
            .context("Failed to serialize settings")
            .and_then(|json| self.storage.set(SETTINGS_KEY, &json));

        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save settings: {:#}", e);
                false
            }
        }
    }

    /// Snapshot of every task and the settings.
    pub fn export_all(&self) -> ExportBundle {
        let tasks = self.get_all();
        log::info!("Exporting {} top-level tasks", tasks.len());
        ExportBundle {
            version: EXPORT_VERSION.to_string(),
            export_date: self.clock.now(),
            tasks: tasks.iter().map(Task::to_portable).collect(),
            settings: self.get_settings(),
        }
    }

    /// Replace tasks and/or settings with the parts present in `bundle`.
    ///
    /// Write failures are logged but still report success.
    pub fn import_all(&mut self, bundle: ImportBundle) -> bool {
        let now = self.clock.now();

        if let Some(data) = bundle.tasks {
            let tasks: Vec<Task> = data.into_iter().map(|t| Task::from_portable(t, now)).collect();
            log::info!("Importing {} top-level tasks", tasks.len());
            if !self.save_all(&tasks) {
                log::warn!("Imported tasks were not saved");
            }
        }

        if let Some(settings) = bundle.settings {
            if !self.save_settings(&settings) {
                log::warn!("Imported settings were not saved");
            }
        }

        true
    }

    /// Parse and import a JSON export. Returns false if it does not parse.
    pub fn import_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<ImportBundle>(json) {
            Ok(bundle) => self.import_all(bundle),
            Err(e) => {
                log::warn!("Failed to parse import data: {}", e);
                false
            }
        }
    }

    /// Remove tasks, settings and the backup marker.
    pub fn clear_all(&mut self) -> bool {
        for key in [TASKS_KEY, SETTINGS_KEY, LAST_BACKUP_KEY] {
            if let Err(e) = self.storage.remove(key) {
                log::warn!("Failed to clear {}: {:#}", key, e);
                return false;
            }
        }
        log::info!("Cleared all data");
        true
    }

    /// Size of the stored payloads.
    pub fn storage_info(&self) -> StorageInfo {
        let size = |key: &str| {
            self.storage
                .get(key)
                .ok()
                .flatten()
                .map(|raw| raw.len())
                .unwrap_or(0)
        };
        let tasks = size(TASKS_KEY);
        let settings = size(SETTINGS_KEY);

        StorageInfo {
            tasks_kb: kib(tasks),
            settings_kb: kib(settings),
            total_kb: kib(tasks + settings),
        }
    }
}
