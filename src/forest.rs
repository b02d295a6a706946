//! Depth-first operations over a forest of task trees.

use crate::task::Task;

/// Find a task anywhere in the forest.
pub fn find<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    walk(tasks).find(|task| task.id() == id)
}

/// Mutable counterpart of `find`.
pub fn find_mut<'a>(tasks: &'a mut [Task], id: &str) -> Option<&'a mut Task> {
    for task in tasks.iter_mut() {
        if task.id() == id {
            return Some(task);
        }
        if let Some(found) = find_mut(task.sub_tasks_mut(), id) {
            return Some(found);
        }
    }
    None
}

/// Remove every node with `id` (and its subtree) from wherever it sits.
/// Returns whether anything was removed.
pub fn remove(tasks: &mut Vec<Task>, id: &str) -> bool {
    let before = tasks.len();
    tasks.retain(|task| task.id() != id);
    let mut removed = tasks.len() != before;

    for task in tasks.iter_mut() {
        removed |= remove(task.sub_tasks_mut(), id);
    }
    removed
}

/// Pre-order, depth-first iterator over every node.
pub fn walk(tasks: &[Task]) -> Walk<'_> {
    Walk {
        stack: tasks.iter().rev().collect(),
    }
}

pub struct Walk<'a> {
    stack: Vec<&'a Task>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<Self::Item> {
        let task = self.stack.pop()?;
        self.stack.extend(task.sub_tasks().iter().rev());
        Some(task)
    }
}

/// Number assigned to the next top-level task: `T001`, `T002`, ...
///
/// Derived from the current root count, so deleting a root and adding another
/// can reuse an existing number. Existing exports depend on this scheme.
pub fn next_root_number(tasks: &[Task]) -> String {
    let roots = tasks.iter().filter(|task| task.parent_id().is_none()).count();
    format!("T{:03}", roots + 1)
}

/// Number assigned to the next child of `parent`: `T001.1`, `T001.1.2`, ...
pub fn next_child_number(parent: &Task) -> String {
    format!("{}.{}", parent.task_number, parent.sub_tasks().len() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::{TimeZone, Utc};

    fn make(title: &str) -> Task {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        Task::new(NewTask::new(title), now)
    }

    /// a(a1(a1x), a2), b
    fn sample() -> Vec<Task> {
        let mut a = make("a");
        let mut a1 = make("a1");
        a1.add_child(make("a1x")).unwrap();
        a.add_child(a1).unwrap();
        a.add_child(make("a2")).unwrap();
        vec![a, make("b")]
    }

    fn id_of(tasks: &[Task], title: &str) -> String {
        walk(tasks).find(|t| t.title == title).unwrap().id().to_string()
    }

    #[test]
    fn test_walk_is_preorder() {
        let forest = sample();
        let order: Vec<&str> = walk(&forest).map(|t| t.title.as_str()).collect();
        assert_eq!(order, vec!["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn test_find_nested() {
        let forest = sample();
        let id = id_of(&forest, "a1x");
        let found = find(&forest, &id).unwrap();
        assert_eq!(found.title, "a1x");
        assert_eq!(found.task_level(), 3);
        assert!(find(&forest, "tm-nothere000").is_none());
    }

    #[test]
    fn test_find_mut_nested() {
        let mut forest = sample();
        let id = id_of(&forest, "a2");
        find_mut(&mut forest, &id).unwrap().title = "renamed".to_string();
        assert_eq!(find(&forest, &id).unwrap().title, "renamed");
    }

    #[test]
    fn test_remove_nested_keeps_siblings() {
        let mut forest = sample();
        let id = id_of(&forest, "a1");
        assert!(remove(&mut forest, &id));

        let order: Vec<&str> = walk(&forest).map(|t| t.title.as_str()).collect();
        assert_eq!(order, vec!["a", "a2", "b"]);
        assert!(!remove(&mut forest, &id));
    }

    #[test]
    fn test_remove_root() {
        let mut forest = sample();
        let id = id_of(&forest, "a");
        assert!(remove(&mut forest, &id));
        assert_eq!(walk(&forest).count(), 1);
    }

    #[test]
    fn test_numbering() {
        let mut forest = sample();
        assert_eq!(next_root_number(&forest), "T003");
        assert_eq!(next_root_number(&[]), "T001");

        forest[0].task_number = "T001".to_string();
        assert_eq!(next_child_number(&forest[0]), "T001.3");
    }
}
