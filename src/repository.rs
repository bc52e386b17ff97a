//! Per-user task repository.
//!
//! Holds the signed-in user's [`TaskList`] in memory, writes the whole list
//! back to `tasks_<userId>` after every mutation, and publishes the full list
//! to subscribers. Storage write failures are logged; memory stays the truth
//! until the next successful write.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::error::{StorageError, TaskError};
use crate::model::{NewTask, Subtask, SubtaskId, Task, TaskId, TaskPatch, UserId};
use crate::storage::{load_json, save_json, tasks_key, KeyValueStore};
use crate::tasks::{TaskCommand, TaskEvent, TaskList};

/// What subscribers receive: the whole list, every time.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    /// `None` while nobody is signed in.
    pub owner: Option<UserId>,
    /// Bumped on every publish, including reloads and clears.
    pub revision: u64,
    pub tasks: Arc<[Task]>,
}

impl TaskSnapshot {
    fn empty(revision: u64) -> Self {
        TaskSnapshot {
            owner: None,
            revision,
            tasks: Arc::from(Vec::new()),
        }
    }
}

struct Partition {
    owner: UserId,
    list: TaskList,
}

#[derive(Default)]
struct Inner {
    partition: Option<Partition>,
    published: u64,
}

/// Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<dyn KeyValueStore>,
    inner: Arc<Mutex<Inner>>,
    notify: Arc<watch::Sender<TaskSnapshot>>,
}

// ── Partition I/O ──────────────────────────────────────────────

/// Load one user's tasks. Missing or malformed data yields an empty list.
pub async fn load_partition(store: &dyn KeyValueStore, user_id: UserId) -> Vec<Task> {
    load_json(store, &tasks_key(user_id)).await
}

pub async fn save_partition(store: &dyn KeyValueStore, user_id: UserId, tasks: &[Task]) -> Result<(), StorageError> {
    save_json(store, &tasks_key(user_id), tasks).await
}

impl TaskRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (notify, _) = watch::channel(TaskSnapshot::empty(0));
        TaskRepository {
            store,
            inner: Arc::new(Mutex::new(Inner::default())),
            notify: Arc::new(notify),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────

    /// Switch partitions. `Some` loads that user's tasks from storage,
    /// `None` drops whatever is in memory.
    pub async fn on_user_change(&self, user: Option<UserId>) {
        let mut inner = self.inner.lock().await;
        match user {
            Some(owner) => {
                let tasks = load_partition(self.store.as_ref(), owner).await;
                tracing::info!(user_id = %owner, count = tasks.len(), "task partition loaded");
                inner.partition = Some(Partition {
                    owner,
                    list: TaskList::from_tasks(tasks),
                });
            }
            None => {
                if let Some(old) = inner.partition.take() {
                    tracing::info!(user_id = %old.owner, "task partition cleared");
                }
            }
        }
        self.publish(&mut inner);
    }

    /// Drop in-memory state. Storage is left untouched.
    pub async fn dispose(&self) {
        self.on_user_change(None).await;
    }

    // ── Mutations ──────────────────────────────────────────────

    pub async fn add_task(&self, input: NewTask) -> Result<Task, TaskError> {
        let mut inner = self.inner.lock().await;
        let partition = inner.partition.as_mut().ok_or(TaskError::SignedOut)?;

        let task = partition.list.add(input)?;
        self.flush(partition).await;
        tracing::debug!(user_id = %partition.owner, revision = partition.list.revision(), task_id = %task.id, "task added");

        self.publish(&mut inner);
        Ok(task)
    }

    /// `Ok(false)` when no task has that id.
    pub async fn update_task(&self, task_id: TaskId, patch: TaskPatch) -> Result<bool, TaskError> {
        Ok(self.apply(TaskCommand::Update { task_id, patch }).await?.is_some())
    }

    pub async fn toggle_subtask(&self, task_id: TaskId, subtask_id: SubtaskId) -> Result<bool, TaskError> {
        Ok(self
            .apply(TaskCommand::ToggleSubtask { task_id, subtask_id })
            .await?
            .is_some())
    }

    pub async fn add_subtask(&self, task_id: TaskId, title: &str) -> Result<Option<Subtask>, TaskError> {
        let event = self
            .apply(TaskCommand::AddSubtask {
                task_id,
                title: title.to_string(),
            })
            .await?;
        Ok(match event {
            Some(TaskEvent::SubtaskAdded { subtask, .. }) => Some(subtask),
            _ => None,
        })
    }

    pub async fn delete_task(&self, task_id: TaskId) -> Result<bool, TaskError> {
        Ok(self.apply(TaskCommand::Delete { task_id }).await?.is_some())
    }

    pub async fn toggle_task_complete(&self, task_id: TaskId) -> Result<bool, TaskError> {
        Ok(self.apply(TaskCommand::ToggleComplete { task_id }).await?.is_some())
    }

    /// The single mutation path: apply, persist the full list, publish.
    /// The lock is held across the write so mutations never interleave.
    pub async fn apply(&self, cmd: TaskCommand) -> Result<Option<TaskEvent>, TaskError> {
        let mut inner = self.inner.lock().await;
        let partition = inner.partition.as_mut().ok_or(TaskError::SignedOut)?;

        let Some(event) = partition.list.apply(cmd)? else {
            return Ok(None);
        };

        self.flush(partition).await;
        tracing::debug!(user_id = %partition.owner, revision = event.revision(), ?event, "task event applied");

        self.publish(&mut inner);
        Ok(Some(event))
    }

    // ── Reads ──────────────────────────────────────────────────

    /// Current tasks in collection order (newest additions first).
    pub async fn tasks(&self) -> Vec<Task> {
        let inner = self.inner.lock().await;
        inner
            .partition
            .as_ref()
            .map(|p| p.list.tasks().to_vec())
            .unwrap_or_default()
    }

    pub async fn get(&self, task_id: TaskId) -> Option<Task> {
        let inner = self.inner.lock().await;
        inner.partition.as_ref()?.list.get(task_id).cloned()
    }

    pub async fn owner(&self) -> Option<UserId> {
        self.inner.lock().await.partition.as_ref().map(|p| p.owner)
    }

    /// Latest published snapshot without waiting on the lock.
    pub fn snapshot(&self) -> TaskSnapshot {
        self.notify.borrow().clone()
    }

    /// The receiver starts with the current snapshot marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.notify.subscribe()
    }

    /// Write the whole partition back. Failures leave memory as the truth.
    async fn flush(&self, partition: &Partition) {
        if let Err(e) = save_partition(self.store.as_ref(), partition.owner, partition.list.tasks()).await {
            tracing::warn!(user_id = %partition.owner, error = %e, "task save failed; keeping in-memory state");
        }
    }

    fn publish(&self, inner: &mut Inner) {
        inner.published += 1;
        let snapshot = match &inner.partition {
            Some(p) => TaskSnapshot {
                owner: Some(p.owner),
                revision: inner.published,
                tasks: Arc::from(p.list.tasks().to_vec()),
            },
            None => TaskSnapshot::empty(inner.published),
        };
        // send_replace stores the value even with no live receivers.
        self.notify.send_replace(snapshot);
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use uuid::Uuid;

    fn repo_on(store: Arc<dyn KeyValueStore>) -> TaskRepository {
        TaskRepository::new(store)
    }

    async fn signed_in(user: UserId) -> (TaskRepository, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let repo = repo_on(store.clone());
        repo.on_user_change(Some(user)).await;
        (repo, store)
    }

    fn skincare() -> NewTask {
        NewTask {
            title: "Rotina de skincare".into(),
            list_name: Some("Autocuidado".into()),
            priority: Some(Priority::High),
            date: Some("2025-10-12".into()),
            subtasks: vec!["Tônico".into(), "Hidratante".into()],
            ..Default::default()
        }
    }

    /// Store whose writes always fail.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Redb("disk full".into()))
        }
        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Redb("disk full".into()))
        }
    }

    #[tokio::test]
    async fn partition_round_trip() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mut list = TaskList::new();
        list.apply(TaskCommand::Add(skincare())).unwrap();
        let tasks = list.into_tasks();

        save_partition(&store, user, &tasks).await.unwrap();
        assert_eq!(load_partition(&store, user).await, tasks);
    }

    #[tokio::test]
    async fn mutations_persist_under_user_key() {
        let user = Uuid::new_v4();
        let (repo, store) = signed_in(user).await;
        let task = repo.add_task(skincare()).await.unwrap();

        let raw = store.get(&tasks_key(user)).await.unwrap().unwrap();
        assert!(raw.contains("Rotina de skincare"));
        assert!(store.get("tasks").await.unwrap().is_none());

        // A fresh repository on the same store sees the same list.
        let other = repo_on(store.clone());
        other.on_user_change(Some(user)).await;
        assert_eq!(other.tasks().await, vec![task]);
    }

    #[tokio::test]
    async fn users_never_see_each_other() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let repo = repo_on(store.clone());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        repo.on_user_change(Some(a)).await;
        let a_task = repo.add_task(NewTask::titled("Segredo da A")).await.unwrap();

        repo.on_user_change(None).await;
        assert!(repo.tasks().await.is_empty());

        repo.on_user_change(Some(b)).await;
        assert!(repo.tasks().await.is_empty());
        assert!(repo.get(a_task.id).await.is_none());
        repo.add_task(NewTask::titled("Da B")).await.unwrap();
        assert!(load_partition(&*store, b).await.iter().all(|t| t.id != a_task.id));

        repo.on_user_change(Some(a)).await;
        let titles: Vec<_> = repo.tasks().await.into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Segredo da A"]);
    }

    #[tokio::test]
    async fn add_goes_first() {
        let (repo, _) = signed_in(Uuid::new_v4()).await;
        repo.add_task(NewTask::titled("old")).await.unwrap();
        repo.add_task(NewTask::titled("middle")).await.unwrap();
        let newest = repo.add_task(NewTask::titled("newest")).await.unwrap();

        assert_eq!(repo.tasks().await[0], newest);
    }

    #[tokio::test]
    async fn toggle_subtask_twice_is_identity() {
        let (repo, _) = signed_in(Uuid::new_v4()).await;
        let task = repo.add_task(skincare()).await.unwrap();
        let sub = task.subtasks[1].id;

        assert!(repo.toggle_subtask(task.id, sub).await.unwrap());
        assert!(repo.get(task.id).await.unwrap().subtasks[1].completed);
        assert!(repo.toggle_subtask(task.id, sub).await.unwrap());

        let after = repo.get(task.id).await.unwrap();
        assert_eq!(after.subtasks, task.subtasks);
        assert!(!after.completed);

        assert!(!repo.toggle_subtask(Uuid::new_v4(), sub).await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_terminal() {
        let (repo, store) = signed_in(Uuid::new_v4()).await;
        let task = repo.add_task(skincare()).await.unwrap();
        let owner = repo.owner().await.unwrap();

        assert!(repo.delete_task(task.id).await.unwrap());
        assert!(repo.get(task.id).await.is_none());
        assert!(repo.tasks().await.is_empty());
        assert!(load_partition(&*store, owner).await.is_empty());

        assert!(!repo.delete_task(task.id).await.unwrap());
    }

    #[tokio::test]
    async fn toggle_complete_matches_update() {
        let (repo, store) = signed_in(Uuid::new_v4()).await;
        let owner = repo.owner().await.unwrap();
        let a = repo.add_task(NewTask::titled("a")).await.unwrap();
        let b = repo.add_task(NewTask::titled("b")).await.unwrap();

        repo.toggle_task_complete(a.id).await.unwrap();
        repo.update_task(b.id, TaskPatch::completed(true)).await.unwrap();

        let stored = load_partition(&*store, owner).await;
        assert!(stored.iter().all(|t| t.completed));
    }

    #[tokio::test]
    async fn update_unknown_does_not_write() {
        let (repo, store) = signed_in(Uuid::new_v4()).await;
        assert!(!repo.update_task(Uuid::new_v4(), TaskPatch::completed(true)).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn add_subtask_later() {
        let (repo, _) = signed_in(Uuid::new_v4()).await;
        let task = repo.add_task(NewTask::titled("Estudar")).await.unwrap();

        let sub = repo.add_subtask(task.id, "Resumo").await.unwrap().unwrap();
        assert_eq!(repo.get(task.id).await.unwrap().subtasks, vec![sub]);
        assert_eq!(repo.add_subtask(Uuid::new_v4(), "x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn signed_out_mutations_are_rejected() {
        let repo = repo_on(Arc::new(MemoryStore::new()));
        let err = repo.add_task(NewTask::titled("x")).await.unwrap_err();
        assert_eq!(err, TaskError::SignedOut);
        assert!(repo.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn validation_errors_surface() {
        let (repo, _) = signed_in(Uuid::new_v4()).await;
        let err = repo.add_task(NewTask::titled("")).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert!(repo.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn failed_writes_keep_memory() {
        let repo = repo_on(Arc::new(BrokenStore));
        repo.on_user_change(Some(Uuid::new_v4())).await;

        let task = repo.add_task(NewTask::titled("still here")).await.unwrap();
        assert_eq!(repo.tasks().await, vec![task]);
    }

    #[tokio::test]
    async fn subscribers_get_full_list_on_every_change() {
        let user = Uuid::new_v4();
        let repo = repo_on(Arc::new(MemoryStore::new()));
        let mut rx = repo.subscribe();

        repo.on_user_change(Some(user)).await;
        assert!(rx.has_changed().unwrap());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.owner, Some(user));
        assert!(snap.tasks.is_empty());

        let task = repo.add_task(NewTask::titled("x")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(&snap.tasks[..], &[task][..]);

        // No-ops publish nothing.
        repo.delete_task(Uuid::new_v4()).await.unwrap();
        assert!(!rx.has_changed().unwrap());

        repo.dispose().await;
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.owner, None);
        assert!(snap.tasks.is_empty());
        assert_eq!(repo.snapshot().revision, snap.revision);
    }
}
