//! Timemaster: a hierarchical task tracker with Eisenhower-matrix priorities.
//!
//! Tasks form a forest (at most ten levels deep) persisted as a single JSON
//! blob in a flat key-value store. Each task carries an importance and an
//! urgency rating in 1..=3, from which a priority score, a quadrant and an
//! age-weighted ranking are derived.
//!
//! # Example
//!
//! ```no_run
//! use timemaster::{NewTask, SortOptions, Status, Store, TaskPatch};
//! use std::path::Path;
//!
//! // Initialize a new store
//! let mut store = Store::init(Path::new(".")).unwrap();
//!
//! // Create a task and a subtask
//! let launch = store.create(NewTask::new("Prepare launch").with_priority(3, 3)).unwrap();
//! let slides = store.create(NewTask::new("Write slides").with_parent(launch.id())).unwrap();
//! assert_eq!(slides.task_number, "T001.1");
//!
//! // Rank top-level work
//! let ranked = store.list_sorted(&SortOptions::default());
//! assert_eq!(ranked[0].id(), launch.id());
//!
//! // Finish the subtask
//! store.update(slides.id(), TaskPatch::status(Status::Completed)).unwrap();
//! ```

mod id;

pub mod clock;
pub mod forest;
pub mod lenient;
pub mod priority;
pub mod settings;
pub mod storage;
pub mod store;
pub mod task;

// Re-export public API
pub use clock::{Clock, FixedClock, SystemClock};
pub use lenient::parse_timestamp;
pub use priority::{Category, PriorityError, SortBy, SortOptions, SortOrder};
pub use settings::Settings;
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};
pub use store::{ExportBundle, ImportBundle, StorageInfo, Store, StoreError};
pub use task::{NewTask, PortableTask, Status, Task, TaskError, TaskPatch};
