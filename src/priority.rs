//! Priority engine: Eisenhower-matrix scoring, categorisation and ranking.
//!
//! `score` is strict and rejects anything outside 1..=3. Task construction is
//! deliberately lenient and coerces the same inputs to defaults (see
//! `lenient`). Both behaviours are relied on; do not unify them.

use crate::task::{Status, Task};
use chrono::{DateTime, Utc};
use icu_collator::options::CollatorOptions;
use icu_collator::{Collator, CollatorBorrowed};
use icu_locale_core::locale;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Weight added per whole day since creation.
const TIME_FACTOR_PER_DAY: f64 = 0.01;

/// Upper bound on the time bonus.
const TIME_FACTOR_CAP: f64 = 0.5;

/// Errors from strict priority math.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorityError {
    /// A rating was not an integer in 1..=3.
    InvalidInput { field: &'static str, value: i64 },
}

impl std::fmt::Display for PriorityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityError::InvalidInput { field, value } => {
                write!(f, "{} must be an integer between 1 and 3, got {}", field, value)
            }
        }
    }
}

impl std::error::Error for PriorityError {}

/// Eisenhower-matrix quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    UrgentImportant,
    ImportantNotUrgent,
    UrgentNotImportant,
    NotUrgentNotImportant,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::UrgentImportant => "urgent_important",
            Category::ImportantNotUrgent => "important_not_urgent",
            Category::UrgentNotImportant => "urgent_not_important",
            Category::NotUrgentNotImportant => "not_urgent_not_important",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::UrgentImportant => "Urgent & important",
            Category::ImportantNotUrgent => "Important, not urgent",
            Category::UrgentNotImportant => "Urgent, not important",
            Category::NotUrgentNotImportant => "Neither urgent nor important",
        }
    }

    /// CSS class used by web front ends for the quadrant badge.
    pub fn color(&self) -> &'static str {
        match self {
            Category::UrgentImportant => "bg-red-500",
            Category::ImportantNotUrgent => "bg-yellow-500",
            Category::UrgentNotImportant => "bg-blue-500",
            Category::NotUrgentNotImportant => "bg-gray-500",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn check(field: &'static str, value: i64) -> Result<u8, PriorityError> {
    if (1..=3).contains(&value) {
        Ok(value as u8)
    } else {
        Err(PriorityError::InvalidInput { field, value })
    }
}

/// Priority score `importance * 3 + urgency`, in 4..=12.
pub fn score(importance: i64, urgency: i64) -> Result<u8, PriorityError> {
    let importance = check("importance", importance)?;
    let urgency = check("urgency", urgency)?;
    Ok(raw_score(importance, urgency))
}

/// Score for ratings already known to be in range.
pub(crate) fn raw_score(importance: u8, urgency: u8) -> u8 {
    importance * 3 + urgency
}

/// Quadrant for a rating pair. Check order matters: (3, 3) must land in
/// `UrgentImportant`, never in `ImportantNotUrgent`.
pub fn category(importance: u8, urgency: u8) -> Category {
    if importance == 3 && urgency == 3 {
        Category::UrgentImportant
    } else if importance == 3 && urgency < 3 {
        Category::ImportantNotUrgent
    } else if importance < 3 && urgency == 3 {
        Category::UrgentNotImportant
    } else {
        Category::NotUrgentNotImportant
    }
}

fn time_factor(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - created_at).num_milliseconds().div_euclid(DAY_MS);
    (days as f64 * TIME_FACTOR_PER_DAY).min(TIME_FACTOR_CAP)
}

/// Score plus a small bonus for every whole day since creation, capped at +0.5.
pub fn weight(importance: i64, urgency: i64, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<f64, PriorityError> {
    Ok(score(importance, urgency)? as f64 + time_factor(created_at, now))
}

fn task_weight(task: &Task, now: DateTime<Utc>) -> f64 {
    task.priority_score() as f64 + time_factor(task.created_at(), now)
}

/// Past its due date and not completed.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    task.due_date.is_some_and(|due| now > due) && task.status() != Status::Completed
}

/// Primary sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Priority,
    CreatedAt,
    DueDate,
    Title,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(SortBy::Priority),
            "createdAt" | "created_at" | "created" => Ok(SortBy::CreatedAt),
            "dueDate" | "due_date" | "due" => Ok(SortBy::DueDate),
            "title" => Ok(SortBy::Title),
            other => Err(format!("unknown sort key '{}' (expected priority, createdAt, dueDate or title)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}' (expected asc or desc)", other)),
        }
    }
}

/// Options for `sort_tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOptions {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    /// Only applies when sorting by priority.
    pub group_by_status: bool,
    /// Only applies when sorting by priority.
    pub prioritize_overdue: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            sort_by: SortBy::Priority,
            sort_order: SortOrder::Desc,
            group_by_status: false,
            prioritize_overdue: true,
        }
    }
}

/// Collator for title sorting. Chinese collation orders Han titles by
/// pinyin and Latin titles alphabetically with lowercase first.
fn title_collator() -> Option<CollatorBorrowed<'static>> {
    match Collator::try_new(locale!("zh").into(), CollatorOptions::default()) {
        Ok(collator) => Some(collator),
        Err(e) => {
            log::warn!("Title collation unavailable, falling back to case-folded order: {}", e);
            None
        }
    }
}

fn compare_titles(a: &str, b: &str, collator: Option<&CollatorBorrowed<'_>>) -> Ordering {
    let primary = match collator {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()),
    };
    primary.then_with(|| a.cmp(b))
}

fn compare_weights(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn compare(
    a: &Task,
    b: &Task,
    options: &SortOptions,
    now: DateTime<Utc>,
    collator: Option<&CollatorBorrowed<'_>>,
) -> Ordering {
    let by_priority = options.sort_by == SortBy::Priority;

    // Overdue first, regardless of sort order
    if options.prioritize_overdue && by_priority {
        match (is_overdue(a, now), is_overdue(b, now)) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }

    if options.group_by_status && by_priority {
        let by_status = a.status().rank().cmp(&b.status().rank());
        if by_status != Ordering::Equal {
            return by_status;
        }
    }

    let mut ordering = match options.sort_by {
        SortBy::Priority => compare_weights(task_weight(a, now), task_weight(b, now)),
        SortBy::CreatedAt => a.created_at().cmp(&b.created_at()),
        SortBy::DueDate => match (a.due_date, b.due_date) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.cmp(&y),
        },
        SortBy::Title => compare_titles(&a.title, &b.title, collator),
    };

    if options.sort_order == SortOrder::Desc {
        ordering = ordering.reverse();
    }

    // Secondary key: heavier first
    if ordering == Ordering::Equal && !by_priority {
        ordering = compare_weights(task_weight(b, now), task_weight(a, now));
    }

    ordering
}

/// Return a sorted copy of `tasks`. The sort is stable, so tasks equal on
/// every key keep their input order.
pub fn sort_tasks(tasks: &[Task], options: &SortOptions, now: DateTime<Utc>) -> Vec<Task> {
    let collator = match options.sort_by {
        SortBy::Title => title_collator(),
        _ => None,
    };
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| compare(a, b, options, now, collator.as_ref()));
    sorted
}
