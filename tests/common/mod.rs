//! Shared test infrastructure for Timemaster integration tests.
//!
//! Provides TestEnv helper for consistent test setup/teardown.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use timemaster::{FixedClock, MemoryStorage, NewTask, SortOptions, Status, Store, Task, TaskPatch};

/// Fixed starting instant for every test environment.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

/// Test environment with an in-memory store and a controllable clock.
pub struct TestEnv {
    pub clock: FixedClock,
    pub store: Store<MemoryStorage, FixedClock>,
}

impl TestEnv {
    /// Create a new test environment with an empty store.
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::new())
    }

    /// Create a test environment over the given storage.
    pub fn with_storage(storage: MemoryStorage) -> Self {
        let clock = FixedClock::new(epoch());
        let store = Store::new(storage, clock.clone());
        Self { clock, store }
    }

    /// Move the store's clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Create a top-level task with default priority.
    pub fn create_task(&mut self, title: &str) -> Task {
        self.store.create(NewTask::new(title)).expect("Failed to create task")
    }

    /// Create a top-level task with the given ratings.
    pub fn create_task_with_priority(&mut self, title: &str, importance: i64, urgency: i64) -> Task {
        self.store
            .create(NewTask::new(title).with_priority(importance, urgency))
            .expect("Failed to create task")
    }

    /// Create a subtask under `parent`.
    pub fn create_child(&mut self, parent: &Task, title: &str) -> Task {
        self.store
            .create(NewTask::new(title).with_parent(parent.id()))
            .expect("Failed to create subtask")
    }

    /// Build a chain of `depth` tasks, each a child of the previous one.
    /// Returns the deepest task.
    pub fn create_chain(&mut self, depth: usize) -> Task {
        let mut current = self.create_task("Level 1");
        for level in 2..=depth {
            current = self.create_child(&current, &format!("Level {}", level));
        }
        current
    }

    /// Set a task's status.
    pub fn set_status(&mut self, task: &Task, status: Status) -> Task {
        self.store
            .update(task.id(), TaskPatch::status(status))
            .expect("Failed to update status")
    }

    /// Reload a task from storage.
    pub fn reload(&self, task: &Task) -> Task {
        self.store.get(task.id()).expect("Task disappeared from store")
    }

    /// Titles of the top-level tasks in ranked order.
    pub fn ranked_titles(&self, options: &SortOptions) -> Vec<String> {
        self.store
            .list_sorted(options)
            .into_iter()
            .map(|t| t.title)
            .collect()
    }

    /// Count every task in the forest.
    pub fn total_count(&self) -> usize {
        timemaster::forest::walk(&self.store.get_all()).count()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
