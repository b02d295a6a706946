//! Task entity: one node of a task tree.

use crate::id::generate_id;
use crate::lenient::{self, clamp_hours, clamp_task_level, coerce_level};
use crate::priority::{self, Category, PriorityError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Depth of a top-level task.
pub const MIN_TASK_LEVEL: u8 = 1;

/// Deepest level a task may sit at. A task at this level cannot take children.
pub const MAX_TASK_LEVEL: u8 = 10;

/// Task status states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Pending => "To do",
            Status::InProgress => "In progress",
            Status::Completed => "Done",
        }
    }

    /// Grouping rank used when sorting by status: active work first.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Status::InProgress => 0,
            Status::Pending => 1,
            Status::Completed => 2,
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            other => Err(format!("unknown status '{}' (expected pending, in_progress or completed)", other)),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by tree operations on a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskError {
    /// Attaching would push a node below `MAX_TASK_LEVEL`.
    DepthExceeded { parent_level: u8 },
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskError::DepthExceeded { parent_level } => write!(
                f,
                "task level cannot exceed {} (parent is at level {})",
                MAX_TASK_LEVEL, parent_level
            ),
        }
    }
}

impl std::error::Error for TaskError {}

/// Field bag for constructing a task. Omitted fields take defaults and
/// out-of-range values are coerced rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub importance: Option<i64>,
    pub urgency: Option<i64>,
    pub status: Option<Status>,
    pub parent_id: Option<String>,
    pub task_level: Option<i64>,
    pub task_number: String,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder_time: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub sub_tasks: Vec<Task>,
}

impl NewTask {
    /// Start a field bag with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, importance: i64, urgency: i64) -> Self {
        self.importance = Some(importance);
        self.urgency = Some(urgency);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }
}

/// Partial update applied by `Store::update`.
///
/// `id`, `createdAt`, `parentId`, `taskLevel` and `subTasks` are not patchable.
/// Importance and urgency are checked strictly here: a patch carrying an
/// out-of-range value is rejected, unlike construction which coerces.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub importance: Option<i64>,
    #[serde(default)]
    pub urgency: Option<i64>,
    #[serde(default, deserialize_with = "lenient::patch_status")]
    pub status: Option<Status>,
    #[serde(default)]
    pub task_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::patch_timestamp")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "lenient::patch_timestamp")]
    pub reminder_time: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub actual_hours: Option<f64>,
}

impl TaskPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Serialized form of a task, as persisted and exported.
///
/// Field names and layout match existing backups. Deserialization is lenient:
/// bad levels, statuses, dates and hours are coerced instead of failing the
/// whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortableTask {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default = "lenient::default_level", deserialize_with = "lenient::level")]
    pub importance: u8,
    #[serde(default = "lenient::default_level", deserialize_with = "lenient::level")]
    pub urgency: u8,
    #[serde(default, deserialize_with = "lenient::status")]
    pub status: Status,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default = "lenient::default_task_level", deserialize_with = "lenient::task_level")]
    pub task_level: u8,
    #[serde(default, deserialize_with = "lenient::text")]
    pub task_number: String,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    pub reminder_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::hours")]
    pub estimated_hours: f64,
    #[serde(default, deserialize_with = "lenient::hours")]
    pub actual_hours: f64,
    /// Derived; ignored on read and recomputed on rehydration.
    #[serde(skip_deserializing)]
    pub priority_score: u8,
    #[serde(default, deserialize_with = "lenient::sub_tasks")]
    pub sub_tasks: Vec<PortableTask>,
}

/// A task node. Children are owned by their parent in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: String,
    pub title: String,
    pub description: String,
    importance: u8,
    urgency: u8,
    status: Status,
    parent_id: Option<String>,
    task_level: u8,
    pub task_number: String,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder_time: Option<DateTime<Utc>>,
    estimated_hours: f64,
    actual_hours: f64,
    sub_tasks: Vec<Task>,
    priority_score: u8,
}

impl Task {
    /// Build a task from a field bag, coercing invalid values to defaults.
    pub fn new(fields: NewTask, now: DateTime<Utc>) -> Self {
        let id = fields
            .id
            .unwrap_or_else(|| generate_id(&fields.title, fields.parent_id.as_deref(), now));
        let importance = fields.importance.map(coerce_level).unwrap_or(lenient::DEFAULT_LEVEL);
        let urgency = fields.urgency.map(coerce_level).unwrap_or(lenient::DEFAULT_LEVEL);

        Task {
            id,
            title: fields.title,
            description: fields.description,
            importance,
            urgency,
            status: fields.status.unwrap_or_default(),
            parent_id: fields.parent_id,
            task_level: fields.task_level.map(clamp_task_level).unwrap_or(MIN_TASK_LEVEL),
            task_number: fields.task_number,
            created_at: fields.created_at.unwrap_or(now),
            started_at: fields.started_at,
            completed_at: fields.completed_at,
            due_date: fields.due_date,
            reminder_time: fields.reminder_time,
            estimated_hours: fields.estimated_hours.map(clamp_hours).unwrap_or(0.0),
            actual_hours: fields.actual_hours.map(clamp_hours).unwrap_or(0.0),
            sub_tasks: fields.sub_tasks,
            priority_score: priority::raw_score(importance, urgency),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn importance(&self) -> u8 {
        self.importance
    }

    pub fn urgency(&self) -> u8 {
        self.urgency
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn task_level(&self) -> u8 {
        self.task_level
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn estimated_hours(&self) -> f64 {
        self.estimated_hours
    }

    pub fn actual_hours(&self) -> f64 {
        self.actual_hours
    }

    pub fn sub_tasks(&self) -> &[Task] {
        &self.sub_tasks
    }

    pub(crate) fn sub_tasks_mut(&mut self) -> &mut Vec<Task> {
        &mut self.sub_tasks
    }

    /// `importance * 3 + urgency`, kept in step with both fields.
    pub fn priority_score(&self) -> u8 {
        self.priority_score
    }

    pub fn category(&self) -> Category {
        priority::category(self.importance, self.urgency)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        priority::is_overdue(self, now)
    }

    /// Change importance and urgency together. Unlike construction this is
    /// strict: out-of-range values are an error and nothing changes.
    pub fn set_priority(&mut self, importance: i64, urgency: i64) -> Result<(), PriorityError> {
        self.priority_score = priority::score(importance, urgency)?;
        self.importance = importance as u8;
        self.urgency = urgency as u8;
        Ok(())
    }

    pub fn set_estimated_hours(&mut self, hours: f64) {
        self.estimated_hours = clamp_hours(hours);
    }

    pub fn set_actual_hours(&mut self, hours: f64) {
        self.actual_hours = clamp_hours(hours);
    }

    /// Move to a new status, stamping `started_at` on the first
    /// pending -> in_progress move and `completed_at` on entering completed.
    pub fn update_status(&mut self, status: Status, now: DateTime<Utc>) {
        let old = self.status;
        self.status = status;

        if status == Status::InProgress && old == Status::Pending {
            if self.started_at.is_none() {
                self.started_at = Some(now);
            }
        } else if status == Status::Completed && old != Status::Completed {
            self.completed_at = Some(now);
        }
    }

    /// Apply a partial update. Priority fields are validated before any field
    /// is touched, so a rejected patch leaves the task unchanged.
    pub fn apply_patch(&mut self, patch: TaskPatch, now: DateTime<Utc>) -> Result<(), PriorityError> {
        let importance = patch.importance.unwrap_or(self.importance as i64);
        let urgency = patch.urgency.unwrap_or(self.urgency as i64);
        self.set_priority(importance, urgency)?;

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(task_number) = patch.task_number {
            self.task_number = task_number;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(reminder_time) = patch.reminder_time {
            self.reminder_time = reminder_time;
        }
        if let Some(hours) = patch.estimated_hours {
            self.set_estimated_hours(hours);
        }
        if let Some(hours) = patch.actual_hours {
            self.set_actual_hours(hours);
        }
        if let Some(status) = patch.status {
            self.update_status(status, now);
        }

        Ok(())
    }

    /// Number of levels in this subtree, counting this node.
    fn height(&self) -> u8 {
        1 + self.sub_tasks.iter().map(Task::height).max().unwrap_or(0)
    }

    fn relevel(&mut self, level: u8) {
        self.task_level = level;
        for child in &mut self.sub_tasks {
            child.relevel(level + 1);
        }
    }

    /// Attach `child` as the last subtask, re-pointing its parent and levels.
    pub fn add_child(&mut self, mut child: Task) -> Result<(), TaskError> {
        if self.task_level >= MAX_TASK_LEVEL || self.task_level + child.height() > MAX_TASK_LEVEL {
            return Err(TaskError::DepthExceeded {
                parent_level: self.task_level,
            });
        }

        child.parent_id = Some(self.id.clone());
        child.relevel(self.task_level + 1);
        self.sub_tasks.push(child);
        Ok(())
    }

    /// Detach the direct child with `child_id`, if present.
    pub fn remove_child(&mut self, child_id: &str) -> Option<Task> {
        let pos = self.sub_tasks.iter().position(|t| t.id == child_id)?;
        Some(self.sub_tasks.remove(pos))
    }

    /// Completion percentage, 0..=100.
    pub fn progress(&self) -> u8 {
        if self.status == Status::Completed {
            return 100;
        }
        if self.sub_tasks.is_empty() {
            return if self.status == Status::InProgress { 50 } else { 0 };
        }

        let done = self
            .sub_tasks
            .iter()
            .filter(|t| t.status == Status::Completed)
            .count();
        (100.0 * done as f64 / self.sub_tasks.len() as f64).round() as u8
    }

    /// Serialize into the portable layout, children included.
    pub fn to_portable(&self) -> PortableTask {
        PortableTask {
            id: Some(self.id.clone()),
            title: self.title.clone(),
            description: self.description.clone(),
            importance: self.importance,
            urgency: self.urgency,
            status: self.status,
            parent_id: self.parent_id.clone(),
            task_level: self.task_level,
            task_number: self.task_number.clone(),
            created_at: Some(self.created_at),
            started_at: self.started_at,
            completed_at: self.completed_at,
            due_date: self.due_date,
            reminder_time: self.reminder_time,
            estimated_hours: self.estimated_hours,
            actual_hours: self.actual_hours,
            priority_score: self.priority_score,
            sub_tasks: self.sub_tasks.iter().map(Task::to_portable).collect(),
        }
    }

    /// Rehydrate a task tree. A missing id is generated and a missing
    /// `createdAt` falls back to `now`.
    pub fn from_portable(data: PortableTask, now: DateTime<Utc>) -> Self {
        let sub_tasks = data
            .sub_tasks
            .into_iter()
            .map(|child| Task::from_portable(child, now))
            .collect();

        Task::new(
            NewTask {
                id: data.id,
                title: data.title,
                description: data.description,
                importance: Some(data.importance as i64),
                urgency: Some(data.urgency as i64),
                status: Some(data.status),
                parent_id: data.parent_id,
                task_level: Some(data.task_level as i64),
                task_number: data.task_number,
                created_at: data.created_at,
                started_at: data.started_at,
                completed_at: data.completed_at,
                due_date: data.due_date,
                reminder_time: data.reminder_time,
                estimated_hours: Some(data.estimated_hours),
                actual_hours: Some(data.actual_hours),
                sub_tasks,
            },
            now,
        )
    }

    /// Copy this task and its whole subtree. Every node in the copy gets a
    /// fresh id and children point at their new parents; everything else is
    /// carried over unchanged.
    pub fn duplicate(&self, now: DateTime<Utc>) -> Self {
        let mut copy = Task::from_portable(self.to_portable(), now);
        copy.reassign_ids(now);
        copy
    }

    fn reassign_ids(&mut self, now: DateTime<Utc>) {
        self.id = generate_id(&self.title, self.parent_id.as_deref(), now);
        for child in &mut self.sub_tasks {
            child.parent_id = Some(self.id.clone());
            child.reassign_ids(now);
        }
    }
}
