//! One user's task collection, in memory.
//!
//! `TaskList` is the authoritative state while a session is open. All
//! mutations go through [`TaskList::apply`], which validates, mutates and
//! returns the [`TaskEvent`] describing what happened. Persistence and
//! notification live one layer up in [`crate::repository`].

use chrono::Utc;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::model::{NewTask, Subtask, SubtaskId, Task, TaskId, TaskPatch};
use crate::schedule::{normalize_date_opt, normalize_time_opt};
use crate::validate::task_title;

// ── Commands ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum TaskCommand {
    Add(NewTask),
    Update {
        task_id: TaskId,
        patch: TaskPatch,
    },
    ToggleSubtask {
        task_id: TaskId,
        subtask_id: SubtaskId,
    },
    AddSubtask {
        task_id: TaskId,
        title: String,
    },
    Delete {
        task_id: TaskId,
    },
    ToggleComplete {
        task_id: TaskId,
    },
}

// ── Events ─────────────────────────────────────────────────────

/// What a command actually did. Each event carries the revision it was
/// applied at.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Added {
        revision: u64,
        task: Task,
    },
    Updated {
        revision: u64,
        task_id: TaskId,
    },
    SubtaskToggled {
        revision: u64,
        task_id: TaskId,
        subtask_id: SubtaskId,
        completed: bool,
    },
    SubtaskAdded {
        revision: u64,
        task_id: TaskId,
        subtask: Subtask,
    },
    Deleted {
        revision: u64,
        task_id: TaskId,
    },
    CompletionToggled {
        revision: u64,
        task_id: TaskId,
        completed: bool,
    },
}

impl TaskEvent {
    pub fn revision(&self) -> u64 {
        match self {
            TaskEvent::Added { revision, .. }
            | TaskEvent::Updated { revision, .. }
            | TaskEvent::SubtaskToggled { revision, .. }
            | TaskEvent::SubtaskAdded { revision, .. }
            | TaskEvent::Deleted { revision, .. }
            | TaskEvent::CompletionToggled { revision, .. } => *revision,
        }
    }
}

// ── The list ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
    revision: u64,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap tasks loaded from storage, keeping their stored order.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        TaskList { tasks, revision: 0 }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn get(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Build a task from `input` and put it first. Never a no-op.
    pub fn add(&mut self, input: NewTask) -> Result<Task, ValidationError> {
        let task = build_task(input)?;
        self.revision += 1;
        // Newest first.
        self.tasks.insert(0, task.clone());
        Ok(task)
    }

    /// Apply a command. `Ok(None)` means the target task or subtask does not
    /// exist and nothing changed.
    pub fn apply(&mut self, cmd: TaskCommand) -> Result<Option<TaskEvent>, ValidationError> {
        match cmd {
            TaskCommand::Add(input) => {
                let task = self.add(input)?;
                Ok(Some(TaskEvent::Added {
                    revision: self.revision,
                    task,
                }))
            }

            TaskCommand::Update { task_id, patch } => {
                let patch = clean_patch(patch)?;
                let Some(task) = self.find_mut(task_id) else {
                    return Ok(None);
                };
                merge(task, patch);

                self.revision += 1;
                Ok(Some(TaskEvent::Updated {
                    revision: self.revision,
                    task_id,
                }))
            }

            TaskCommand::ToggleSubtask { task_id, subtask_id } => {
                let Some(subtask) = self
                    .find_mut(task_id)
                    .and_then(|t| t.subtasks.iter_mut().find(|s| s.id == subtask_id))
                else {
                    return Ok(None);
                };
                subtask.completed = !subtask.completed;
                let completed = subtask.completed;

                self.revision += 1;
                Ok(Some(TaskEvent::SubtaskToggled {
                    revision: self.revision,
                    task_id,
                    subtask_id,
                    completed,
                }))
            }

            TaskCommand::AddSubtask { task_id, title } => {
                let title = task_title(&title)?;
                let Some(task) = self.find_mut(task_id) else {
                    return Ok(None);
                };
                let subtask = Subtask::new(title);
                task.subtasks.push(subtask.clone());

                self.revision += 1;
                Ok(Some(TaskEvent::SubtaskAdded {
                    revision: self.revision,
                    task_id,
                    subtask,
                }))
            }

            TaskCommand::Delete { task_id } => {
                let before = self.tasks.len();
                self.tasks.retain(|t| t.id != task_id);
                if self.tasks.len() == before {
                    return Ok(None);
                }

                self.revision += 1;
                Ok(Some(TaskEvent::Deleted {
                    revision: self.revision,
                    task_id,
                }))
            }

            TaskCommand::ToggleComplete { task_id } => {
                let Some(task) = self.find_mut(task_id) else {
                    return Ok(None);
                };
                task.completed = !task.completed;
                let completed = task.completed;

                self.revision += 1;
                Ok(Some(TaskEvent::CompletionToggled {
                    revision: self.revision,
                    task_id,
                    completed,
                }))
            }
        }
    }

    fn find_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

// ── Input cleanup ──────────────────────────────────────────────

/// Forms send `""` for untouched fields; store those as absent.
fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn build_task(input: NewTask) -> Result<Task, ValidationError> {
    let title = task_title(&input.title)?;
    let date = normalize_date_opt(input.date)?;
    let time = normalize_time_opt(input.time)?;

    let subtasks = input
        .subtasks
        .into_iter()
        .filter_map(|s| clean_text(Some(s)))
        .map(Subtask::new)
        .collect();

    Ok(Task {
        id: Uuid::new_v4(),
        title,
        date,
        time,
        list_name: clean_text(input.list_name),
        priority: input.priority,
        goal: clean_text(input.goal),
        description: clean_text(input.description),
        meeting: clean_text(input.meeting),
        subtasks,
        completed: false,
        created_at: Utc::now(),
    })
}

fn clean_patch(patch: TaskPatch) -> Result<TaskPatch, ValidationError> {
    Ok(TaskPatch {
        title: patch.title.as_deref().map(task_title).transpose()?,
        date: patch.date.map(normalize_date_opt).transpose()?,
        time: patch.time.map(normalize_time_opt).transpose()?,
        list_name: patch.list_name.map(clean_text),
        priority: patch.priority,
        goal: patch.goal.map(clean_text),
        description: patch.description.map(clean_text),
        meeting: patch.meeting.map(clean_text),
        subtasks: patch.subtasks,
        completed: patch.completed,
    })
}

fn merge(task: &mut Task, patch: TaskPatch) {
    if let Some(title) = patch.title {
        task.title = title;
    }
    if let Some(date) = patch.date {
        task.date = date;
    }
    if let Some(time) = patch.time {
        task.time = time;
    }
    if let Some(list_name) = patch.list_name {
        task.list_name = list_name;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(goal) = patch.goal {
        task.goal = goal;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(meeting) = patch.meeting {
        task.meeting = meeting;
    }
    if let Some(subtasks) = patch.subtasks {
        task.subtasks = subtasks;
    }
    if let Some(completed) = patch.completed {
        task.completed = completed;
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    fn add(list: &mut TaskList, input: NewTask) -> Task {
        match list.apply(TaskCommand::Add(input)).unwrap() {
            Some(TaskEvent::Added { task, .. }) => task,
            other => panic!("expected Added, got {other:?}"),
        }
    }

    fn with_subtasks() -> NewTask {
        NewTask {
            title: " Rotina de skincare ".into(),
            list_name: Some("AutoCuidado".into()),
            priority: Some(Priority::High),
            date: Some("12/10/2025".into()),
            time: Some("21:00".into()),
            goal: Some("".into()),
            subtasks: vec!["Tônico".into(), "  ".into(), "Hidratante".into()],
            ..Default::default()
        }
    }

    #[test]
    fn add_builds_full_record() {
        let mut list = TaskList::new();
        let task = add(&mut list, with_subtasks());

        assert_eq!(task.title, "Rotina de skincare");
        assert_eq!(task.date.as_deref(), Some("2025-10-12"));
        assert_eq!(task.time.as_deref(), Some("21:00"));
        assert_eq!(task.goal, None);
        assert!(!task.completed);
        assert_eq!(task.subtasks.len(), 2);
        assert!(task.subtasks.iter().all(|s| !s.completed));
        assert_ne!(task.subtasks[0].id, task.subtasks[1].id);
        assert_eq!(list.revision(), 1);
    }

    #[test]
    fn add_prepends() {
        let mut list = TaskList::new();
        add(&mut list, NewTask::titled("first"));
        add(&mut list, NewTask::titled("second"));
        let third = add(&mut list, NewTask::titled("third"));

        assert_eq!(list.tasks()[0], third);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn direct_add_matches_add_command() {
        let mut list = TaskList::new();
        let direct = list.add(NewTask::titled("direto")).unwrap();
        let via_command = add(&mut list, NewTask::titled("comando"));

        assert_eq!(list.tasks(), &[via_command, direct][..]);
        assert_eq!(list.revision(), 2);
        assert_eq!(list.add(NewTask::titled(" ")).unwrap_err(), ValidationError::EmptyTitle);
        assert_eq!(list.revision(), 2);
    }

    #[test]
    fn add_rejects_blank_title_without_mutating() {
        let mut list = TaskList::new();
        let err = list.apply(TaskCommand::Add(NewTask::titled("  "))).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTitle);
        assert!(list.is_empty());
        assert_eq!(list.revision(), 0);
    }

    #[test]
    fn add_rejects_bad_date() {
        let mut list = TaskList::new();
        let input = NewTask { date: Some("32/13/2025".into()), ..NewTask::titled("x") };
        assert!(matches!(
            list.apply(TaskCommand::Add(input)),
            Err(ValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn update_is_shallow_merge() {
        let mut list = TaskList::new();
        let task = add(&mut list, with_subtasks());

        let event = list
            .apply(TaskCommand::Update {
                task_id: task.id,
                patch: TaskPatch {
                    title: Some("Skincare noturno".into()),
                    priority: Some(None),
                    ..Default::default()
                },
            })
            .unwrap();
        assert!(matches!(event, Some(TaskEvent::Updated { revision: 2, .. })));

        let updated = list.get(task.id).unwrap();
        assert_eq!(updated.title, "Skincare noturno");
        assert_eq!(updated.priority, None);
        assert_eq!(updated.list_name, task.list_name);
        assert_eq!(updated.subtasks, task.subtasks);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[test]
    fn update_unknown_is_noop() {
        let mut list = TaskList::new();
        add(&mut list, NewTask::titled("x"));
        let event = list
            .apply(TaskCommand::Update { task_id: Uuid::new_v4(), patch: TaskPatch::completed(true) })
            .unwrap();
        assert_eq!(event, None);
        assert_eq!(list.revision(), 1);
    }

    #[test]
    fn toggle_subtask_twice_restores_and_leaves_parent() {
        let mut list = TaskList::new();
        let task = add(&mut list, with_subtasks());
        let sub = task.subtasks[0].id;
        let cmd = TaskCommand::ToggleSubtask { task_id: task.id, subtask_id: sub };

        list.apply(cmd.clone()).unwrap();
        assert!(list.get(task.id).unwrap().subtasks[0].completed);
        assert!(!list.get(task.id).unwrap().subtasks[1].completed);
        assert!(!list.get(task.id).unwrap().completed);

        list.apply(cmd).unwrap();
        assert!(!list.get(task.id).unwrap().subtasks[0].completed);
        assert!(!list.get(task.id).unwrap().completed);
    }

    #[test]
    fn completing_every_subtask_does_not_complete_parent() {
        let mut list = TaskList::new();
        let task = add(&mut list, with_subtasks());
        for s in &task.subtasks {
            list.apply(TaskCommand::ToggleSubtask { task_id: task.id, subtask_id: s.id }).unwrap();
        }
        assert!(!list.get(task.id).unwrap().completed);
    }

    #[test]
    fn toggle_unknown_subtask_is_noop() {
        let mut list = TaskList::new();
        let task = add(&mut list, with_subtasks());
        let event = list
            .apply(TaskCommand::ToggleSubtask { task_id: task.id, subtask_id: Uuid::new_v4() })
            .unwrap();
        assert_eq!(event, None);
    }

    #[test]
    fn add_subtask_appends() {
        let mut list = TaskList::new();
        let task = add(&mut list, with_subtasks());
        list.apply(TaskCommand::AddSubtask { task_id: task.id, title: "Protetor".into() }).unwrap();

        let subs = &list.get(task.id).unwrap().subtasks;
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[2].title, "Protetor");
        assert!(!subs[2].completed);
    }

    #[test]
    fn delete_twice() {
        let mut list = TaskList::new();
        let task = add(&mut list, NewTask::titled("Doomed"));

        let first = list.apply(TaskCommand::Delete { task_id: task.id }).unwrap();
        assert!(matches!(first, Some(TaskEvent::Deleted { .. })));
        assert!(list.get(task.id).is_none());

        let second = list.apply(TaskCommand::Delete { task_id: task.id }).unwrap();
        assert_eq!(second, None);
    }

    #[test]
    fn toggle_complete_flips() {
        let mut list = TaskList::new();
        let task = add(&mut list, NewTask::titled("x"));
        let cmd = TaskCommand::ToggleComplete { task_id: task.id };

        let event = list.apply(cmd.clone()).unwrap().unwrap();
        assert!(matches!(event, TaskEvent::CompletionToggled { completed: true, .. }));
        list.apply(cmd).unwrap();
        assert!(!list.get(task.id).unwrap().completed);
        assert_eq!(list.revision(), 3);
    }
}
