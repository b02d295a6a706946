//! Integration tests for the task store.
//!
//! Covers creation and numbering, status transitions, deletion, ranking and
//! the export/import cycle.

mod common;

use chrono::Duration;
use common::{TestEnv, epoch};
use timemaster::{ImportBundle, NewTask, Settings, SortBy, SortOptions, SortOrder, Status, TaskPatch};

// =============================================================================
// Creation and Numbering
// =============================================================================

#[test]
fn test_root_tasks_numbered_in_order() {
    let mut env = TestEnv::new();

    let first = env.create_task("First");
    let second = env.create_task("Second");
    let third = env.create_task("Third");

    assert_eq!(first.task_number, "T001");
    assert_eq!(second.task_number, "T002");
    assert_eq!(third.task_number, "T003");
    assert!(first.parent_id().is_none());
    assert_eq!(first.task_level(), 1);
}

#[test]
fn test_child_numbering_and_levels() {
    let mut env = TestEnv::new();

    env.create_task("Other root");
    let root = env.create_task("Root");
    let a = env.create_child(&root, "A");
    let b = env.create_child(&root, "B");
    let a1 = env.create_child(&a, "A1");

    assert_eq!(root.task_number, "T002");
    assert_eq!(a.task_number, "T002.1");
    assert_eq!(b.task_number, "T002.2");
    assert_eq!(a1.task_number, "T002.1.1");

    assert_eq!(a.task_level(), 2);
    assert_eq!(a1.task_level(), 3);
    assert_eq!(a1.parent_id(), Some(a.id()));

    // Roots are counted without their subtrees
    let next_root = env.create_task("Next root");
    assert_eq!(next_root.task_number, "T003");
}

#[test]
fn test_created_task_is_stored_copy() {
    let mut env = TestEnv::new();

    let task = env
        .store
        .create(
            NewTask::new("Plan offsite")
                .with_description("Venue and agenda")
                .with_priority(3, 1)
                .with_due_date(epoch() + Duration::days(7))
                .with_estimated_hours(6.5),
        )
        .unwrap();

    assert_eq!(task.created_at(), epoch());
    assert_eq!(task.priority_score(), 10);
    assert_eq!(env.reload(&task), task);
}

#[test]
fn test_children_of_returns_direct_children_in_order() {
    let mut env = TestEnv::new();

    let root = env.create_task("Root");
    let a = env.create_child(&root, "A");
    env.create_child(&a, "A1");
    env.create_child(&root, "B");

    let children = env.store.children_of(root.id()).unwrap();
    let titles: Vec<&str> = children.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B"]);
    assert!(env.store.children_of(children[1].id()).unwrap().is_empty());
}

// =============================================================================
// Status Transitions
// =============================================================================

#[test]
fn test_start_then_complete_stamps_times() {
    let mut env = TestEnv::new();
    let task = env.create_task("Work");

    env.advance(Duration::hours(1));
    let started = env.set_status(&task, Status::InProgress);
    assert_eq!(started.started_at(), Some(epoch() + Duration::hours(1)));
    assert!(started.completed_at().is_none());

    env.advance(Duration::hours(2));
    let done = env.set_status(&task, Status::Completed);
    assert_eq!(done.completed_at(), Some(epoch() + Duration::hours(3)));
    assert_eq!(done.started_at(), started.started_at());
}

#[test]
fn test_update_nested_task() {
    let mut env = TestEnv::new();
    let root = env.create_task("Root");
    let child = env.create_child(&root, "Child");
    let grandchild = env.create_child(&child, "Grandchild");

    let patch = TaskPatch {
        title: Some("Renamed".to_string()),
        importance: Some(3),
        urgency: Some(3),
        ..Default::default()
    };
    let updated = env.store.update(grandchild.id(), patch).unwrap();
    assert_eq!(updated.priority_score(), 12);

    let stored = env.reload(&grandchild);
    assert_eq!(stored.title, "Renamed");
    assert_eq!(stored.task_level(), 3);
    assert_eq!(stored.parent_id(), Some(child.id()));
}

#[test]
fn test_patch_clears_due_date() {
    let mut env = TestEnv::new();
    let task = env
        .store
        .create(NewTask::new("Due").with_due_date(epoch() + Duration::days(1)))
        .unwrap();

    let patch: TaskPatch = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
    let updated = env.store.update(task.id(), patch).unwrap();
    assert!(updated.due_date.is_none());
}

// =============================================================================
// Deletion
// =============================================================================

#[test]
fn test_delete_root_removes_subtree() {
    let mut env = TestEnv::new();
    let root = env.create_task("Root");
    let child = env.create_child(&root, "Child");
    env.create_child(&child, "Grandchild");
    let other = env.create_task("Other");

    assert!(env.store.delete(root.id()));
    assert_eq!(env.total_count(), 1);
    assert!(env.store.get(child.id()).is_none());
    assert!(env.store.get(other.id()).is_some());
}

#[test]
fn test_delete_child_keeps_siblings_and_parent() {
    let mut env = TestEnv::new();
    let root = env.create_task("Root");
    let a = env.create_child(&root, "A");
    let b = env.create_child(&root, "B");
    let c = env.create_child(&root, "C");

    assert!(env.store.delete(b.id()));

    let children = env.store.children_of(root.id()).unwrap();
    let ids: Vec<&str> = children.iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec![a.id(), c.id()]);
    assert_eq!(children[1].task_number, "T001.3");
}

// =============================================================================
// Ranking
// =============================================================================

#[test]
fn test_list_sorted_by_priority() {
    let mut env = TestEnv::new();
    env.create_task_with_priority("Low", 1, 1);
    env.create_task_with_priority("Critical", 3, 3);
    env.create_task_with_priority("Important", 3, 1);

    let titles = env.ranked_titles(&SortOptions::default());
    assert_eq!(titles, vec!["Critical", "Important", "Low"]);
}

#[test]
fn test_list_sorted_overdue_first() {
    let mut env = TestEnv::new();
    env.create_task_with_priority("Critical", 3, 3);
    env.store
        .create(
            NewTask::new("Late")
                .with_priority(1, 1)
                .with_due_date(epoch() + Duration::hours(2)),
        )
        .unwrap();

    assert_eq!(env.ranked_titles(&SortOptions::default())[0], "Critical");

    env.advance(Duration::hours(3));
    assert_eq!(env.ranked_titles(&SortOptions::default())[0], "Late");
}

#[test]
fn test_older_task_outranks_equal_score() {
    let mut env = TestEnv::new();
    env.create_task("Older");
    env.advance(Duration::days(3));
    env.create_task("Newer");

    let titles = env.ranked_titles(&SortOptions::default());
    assert_eq!(titles, vec!["Older", "Newer"]);
}

#[test]
fn test_list_sorted_by_title_ascending() {
    let mut env = TestEnv::new();
    env.create_task("charlie");
    env.create_task("Alpha");
    env.create_task("bravo");

    let options = SortOptions {
        sort_by: SortBy::Title,
        sort_order: SortOrder::Asc,
        ..Default::default()
    };
    assert_eq!(env.ranked_titles(&options), vec!["Alpha", "bravo", "charlie"]);
}

#[test]
fn test_list_sorted_by_title_non_ascii() {
    let mut env = TestEnv::new();
    for title in ["Zebra", "Éclair", "apple", "Apple"] {
        env.create_task(title);
    }

    let options = SortOptions {
        sort_by: SortBy::Title,
        sort_order: SortOrder::Asc,
        ..Default::default()
    };
    assert_eq!(env.ranked_titles(&options), vec!["apple", "Apple", "Éclair", "Zebra"]);
}

#[test]
fn test_list_sorted_from_settings() {
    let mut env = TestEnv::new();
    let done = env.create_task_with_priority("Done", 3, 3);
    env.set_status(&done, Status::Completed);
    env.create_task_with_priority("Waiting", 1, 1);

    let mut settings = Settings::default();
    settings.sorting.group_by_status = true;
    assert!(env.store.save_settings(&settings));

    let options = env.store.get_settings().sorting.sort_options();
    assert_eq!(env.ranked_titles(&options), vec!["Waiting", "Done"]);
}

// =============================================================================
// Export and Import
// =============================================================================

#[test]
fn test_export_bundle_shape() {
    let mut env = TestEnv::new();
    let root = env.create_task("Root");
    env.create_child(&root, "Child");

    let bundle = env.store.export_all();
    assert_eq!(bundle.version, "1.0.0");
    assert_eq!(bundle.export_date, epoch());
    assert_eq!(bundle.tasks.len(), 1);
    assert_eq!(bundle.tasks[0].sub_tasks.len(), 1);

    let json = serde_json::to_value(&bundle).unwrap();
    assert!(json.get("exportDate").is_some());
    assert_eq!(json["tasks"][0]["subTasks"][0]["taskNumber"], "T001.1");
    assert_eq!(json["settings"]["theme"], "dark");
}

#[test]
fn test_export_import_into_fresh_store() {
    let mut source = TestEnv::new();
    let root = source.create_task_with_priority("Root", 3, 2);
    let child = source.create_child(&root, "Child");
    source.set_status(&child, Status::InProgress);
    let mut settings = Settings::default();
    settings.language = "en-US".to_string();
    source.store.save_settings(&settings);

    let json = serde_json::to_string(&source.store.export_all()).unwrap();

    let mut target = TestEnv::new();
    assert!(target.store.import_json(&json));

    assert_eq!(target.store.get_all(), source.store.get_all());
    assert_eq!(target.store.get_settings().language, "en-US");
}

#[test]
fn test_import_without_settings_keeps_existing_settings() {
    let mut env = TestEnv::new();
    let mut settings = Settings::default();
    settings.theme = "light".to_string();
    env.store.save_settings(&settings);
    env.create_task("Replaced");

    assert!(env.store.import_json(r#"{"tasks": [{"title": "Imported"}]}"#));

    let tasks = env.store.get_all();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Imported");
    assert!(tasks[0].id().starts_with("tm-"));
    assert_eq!(env.store.get_settings().theme, "light");
}

#[test]
fn test_import_bundle_from_export() {
    let mut source = TestEnv::new();
    source.create_task("Carried over");
    let bundle: ImportBundle = source.store.export_all().into();

    let mut target = TestEnv::new();
    assert!(target.store.import_all(bundle));
    assert_eq!(target.store.get_all()[0].title, "Carried over");
}

#[test]
fn test_clear_all_and_storage_info() {
    let mut env = TestEnv::new();
    env.create_task("Something");
    env.store.save_settings(&Settings::default());

    let info = env.store.storage_info();
    assert!(info.tasks_kb > 0.0);
    assert!(info.settings_kb > 0.0);
    assert!((info.total_kb - (info.tasks_kb + info.settings_kb)).abs() <= 0.01);

    assert!(env.store.clear_all());
    assert!(env.store.get_all().is_empty());
    assert_eq!(env.store.storage_info().total_kb, 0.0);
}
