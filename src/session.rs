//! Sign-in state machine.
//!
//! `Loading` until [`SessionService::init`] runs, then `Authenticated` or
//! `Unauthenticated`. Every transition switches the task repository to the
//! new user's partition before it is published on the watch channel, so a
//! subscriber never sees a session whose tasks belong to someone else.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::error::AuthError;
use crate::model::{NewUser, ProfileEdit, SessionUser, UserId};
use crate::repository::TaskRepository;
use crate::storage::KeyValueStore;
use crate::users::{UserStore, DEMO_USERS};
use crate::validate::{sign_in_form, SignUpForm};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Authenticated(SessionUser),
    Unauthenticated,
}

impl SessionState {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// The partition the task repository should hold.
    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

#[derive(Clone)]
pub struct SessionService {
    users: UserStore,
    tasks: TaskRepository,
    seed_demo_users: bool,
    // Serializes transitions.
    transition: Arc<Mutex<()>>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionService {
    /// `tasks` follows every transition: signing in loads that user's
    /// partition, signing out clears it.
    pub fn new(store: Arc<dyn KeyValueStore>, tasks: TaskRepository, seed_demo_users: bool) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        SessionService {
            users: UserStore::new(store),
            tasks,
            seed_demo_users,
            transition: Arc::new(Mutex::new(())),
            state: Arc::new(state),
        }
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn tasks(&self) -> &TaskRepository {
        &self.tasks
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.state.borrow().user().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Seed demo accounts if enabled, then restore a persisted session.
    /// Seeding failures are logged; startup always leaves `Loading`.
    pub async fn init(&self) -> SessionState {
        let _guard = self.transition.lock().await;

        if self.seed_demo_users {
            match self.users.seed_users(&DEMO_USERS).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(count = n, "seeded demo users"),
                Err(e) => tracing::warn!(error = %e, "demo user seeding failed"),
            }
        }

        let next = match self.users.get_user().await {
            Some(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "session restored");
                SessionState::Authenticated(user)
            }
            None => SessionState::Unauthenticated,
        };
        self.enter(next.clone()).await;
        next
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<SessionUser, AuthError> {
        let (username, password) = sign_in_form(username, password)?;
        let _guard = self.transition.lock().await;

        let user = self.users.validate_login(&username, &password).await?;
        self.users.save_user(&user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "signed in");
        self.enter(SessionState::Authenticated(user.clone())).await;
        Ok(user)
    }

    pub async fn sign_up(&self, form: SignUpForm) -> Result<SessionUser, AuthError> {
        form.validate()?;
        let _guard = self.transition.lock().await;

        let user = self
            .users
            .save_new_user(NewUser {
                username: form.username.trim().to_string(),
                email: form.email.trim().to_string(),
                password: form.password,
            })
            .await?
            .to_session();
        self.users.save_user(&user).await?;
        self.enter(SessionState::Authenticated(user.clone())).await;
        Ok(user)
    }

    /// Always ends `Unauthenticated` with the task partition cleared; a
    /// failure to clear the stored pointer is logged.
    pub async fn sign_out(&self) {
        let _guard = self.transition.lock().await;
        if let Err(e) = self.users.remove_user().await {
            tracing::warn!(error = %e, "failed to clear session pointer");
        }
        if let Some(user) = self.current_user() {
            tracing::info!(user_id = %user.id, "signed out");
        }
        self.enter(SessionState::Unauthenticated).await;
    }

    /// Edit the signed-in user's profile and refresh the session pointer.
    /// The user id does not change, so the task partition stays loaded.
    pub async fn update_profile(&self, edit: ProfileEdit) -> Result<SessionUser, AuthError> {
        let _guard = self.transition.lock().await;
        let current = self.current_user().ok_or(AuthError::NotSignedIn)?;

        let user = self.users.update_profile(current.id, edit).await?;
        self.users.save_user(&user).await?;
        self.set(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Move the task partition to the next user, then publish.
    async fn enter(&self, next: SessionState) {
        self.tasks.on_user_change(next.user_id()).await;
        self.set(next);
    }

    fn set(&self, next: SessionState) {
        self.state.send_replace(next);
    }
}

// ── Tests ──────────────────────────────────────────────────────
