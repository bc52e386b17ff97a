//! Read-side views the screens compute from the current task list.

use std::collections::BTreeSet;

use crate::model::Task;
use crate::schedule::normalize_date;

/// Newest first. Stable for equal timestamps.
pub fn sort_recent_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Case-insensitive substring match over title, list name and priority.
/// A blank query matches everything.
pub fn search<'a>(tasks: &'a [Task], text: &str) -> Vec<&'a Task> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return tasks.iter().collect();
    }
    tasks
        .iter()
        .filter(|t| haystack(t).contains(&needle))
        .collect()
}

fn haystack(task: &Task) -> String {
    let mut text = task.title.clone();
    text.push(' ');
    text.push_str(task.list_name.as_deref().unwrap_or_default());
    text.push(' ');
    text.push_str(task.priority.map(|p| p.label()).unwrap_or_default());
    text.to_lowercase()
}

/// Tasks scheduled on `date`. Accepts `YYYY-MM-DD` or `DD/MM/YYYY`; an
/// unparseable date matches nothing.
pub fn on_date<'a>(tasks: &'a [Task], date: &str) -> Vec<&'a Task> {
    let Ok(Some(day)) = normalize_date(date) else {
        return Vec::new();
    };
    tasks
        .iter()
        .filter(|t| t.date.as_deref() == Some(day.as_str()))
        .collect()
}

pub fn in_list<'a>(tasks: &'a [Task], list_name: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.list_name.as_deref() == Some(list_name))
        .collect()
}

/// Home screen counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskSummary {
    pub pending: usize,
    pub completed: usize,
}

pub fn summary(tasks: &[Task]) -> TaskSummary {
    let completed = tasks.iter().filter(|t| t.completed).count();
    TaskSummary {
        pending: tasks.len() - completed,
        completed,
    }
}

/// Distinct scheduled dates, ascending. Used for calendar markers.
pub fn scheduled_dates(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .filter_map(|t| t.date.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
