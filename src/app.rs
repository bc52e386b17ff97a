//! Wires the session to the task repository.
//!
//! Whoever drives the UI holds one `App` and hands `session()` and `tasks()`
//! to the screens. The session owns a handle to the same repository, so a
//! transition made through either `App` or `session()` moves the task
//! partition to the signed-in user.

use std::sync::Arc;

use crate::error::AuthError;
use crate::model::{ProfileEdit, SessionUser};
use crate::repository::TaskRepository;
use crate::session::{SessionService, SessionState};
use crate::settings::Settings;
use crate::storage::KeyValueStore;
use crate::validate::SignUpForm;

#[derive(Clone)]
pub struct App {
    session: SessionService,
    tasks: TaskRepository,
}

impl App {
    pub fn new(store: Arc<dyn KeyValueStore>, settings: &Settings) -> Self {
        let tasks = TaskRepository::new(store.clone());
        App {
            session: SessionService::new(store, tasks.clone(), settings.seed_demo_users),
            tasks,
        }
    }

    pub fn session(&self) -> &SessionService {
        &self.session
    }

    pub fn tasks(&self) -> &TaskRepository {
        &self.tasks
    }

    /// Restore the persisted session and load its tasks.
    pub async fn init(&self) -> SessionState {
        self.session.init().await
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<SessionUser, AuthError> {
        self.session.sign_in(username, password).await
    }

    pub async fn sign_up(&self, form: SignUpForm) -> Result<SessionUser, AuthError> {
        self.session.sign_up(form).await
    }

    pub async fn sign_out(&self) {
        self.session.sign_out().await
    }

    pub async fn update_profile(&self, edit: ProfileEdit) -> Result<SessionUser, AuthError> {
        self.session.update_profile(edit).await
    }

    /// Drop in-memory task state. Stored data and the session pointer stay.
    pub async fn dispose(&self) {
        self.tasks.dispose().await;
        tracing::debug!("app disposed");
    }
}

// ── Tests ──────────────────────────────────────────────────────
