//! User settings blob, stored alongside the task forest.

use crate::priority::{SortBy, SortOptions, SortOrder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: String,
    pub language: String,
    pub notifications: NotificationSettings,
    pub sorting: SortingSettings,
    pub display: DisplaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            language: "zh-CN".to_string(),
            notifications: NotificationSettings::default(),
            sorting: SortingSettings::default(),
            display: DisplaySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub sound: bool,
    pub desktop: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            desktop: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortingSettings {
    pub default_sort: SortBy,
    pub group_by_status: bool,
    pub prioritize_overdue: bool,
}

impl Default for SortingSettings {
    fn default() -> Self {
        Self {
            default_sort: SortBy::Priority,
            group_by_status: false,
            prioritize_overdue: true,
        }
    }
}

impl SortingSettings {
    /// Sort options seeded from these settings, in descending order.
    pub fn sort_options(&self) -> SortOptions {
        SortOptions {
            sort_by: self.default_sort,
            sort_order: SortOrder::Desc,
            group_by_status: self.group_by_status,
            prioritize_overdue: self.prioritize_overdue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplaySettings {
    pub show_sub_tasks: bool,
    pub compact_mode: bool,
    pub show_progress: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_sub_tasks: true,
            compact_mode: false,
            show_progress: true,
        }
    }
}
