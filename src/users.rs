//! User records and the session pointer.
//!
//! `users` holds every account (with argon2 hashes) and is only read for
//! credential checks. `user` holds the signed-in account without its hash.

use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AuthError, StorageError};
use crate::model::{NewUser, ProfileEdit, SessionUser, User, UserId};
use crate::storage::{load_json, save_json, KeyValueStore, SESSION_KEY, USERS_KEY};
use crate::validate;

/// A built-in account for trying the app out.
#[derive(Debug, Clone, Copy)]
pub struct DemoUser {
    pub id: u128,
    pub username: &'static str,
    pub email: &'static str,
    pub password: &'static str,
}

pub const DEMO_USERS: [DemoUser; 5] = [
    DemoUser { id: 0x0d017a11_0000_4000_8000_000000000001, username: "Leme", email: "leme@gmail.com", password: "leme123" },
    DemoUser { id: 0x0d017a11_0000_4000_8000_000000000002, username: "Maria", email: "maria@gmail.com", password: "maria123" },
    DemoUser { id: 0x0d017a11_0000_4000_8000_000000000003, username: "Valentim", email: "valentim@gmail.com", password: "valentim123" },
    DemoUser { id: 0x0d017a11_0000_4000_8000_000000000004, username: "Bealima", email: "bealima@gmail.com", password: "bealima123" },
    DemoUser { id: 0x0d017a11_0000_4000_8000_000000000005, username: "Luana", email: "luana@gmail.com", password: "luana123" },
];

#[derive(Clone)]
pub struct UserStore {
    store: Arc<dyn KeyValueStore>,
    // Serializes read-modify-write of the users list.
    write_lock: Arc<Mutex<()>>,
}

impl UserStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        UserStore {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    // ── All users ──────────────────────────────────────────────

    /// Every stored account. Empty if the key is absent or unreadable.
    pub async fn get_all_users(&self) -> Vec<User> {
        load_json(self.store.as_ref(), USERS_KEY).await
    }

    pub async fn save_new_user(&self, request: NewUser) -> Result<User, AuthError> {
        let user = User::new(request)?;
        self.insert(user.clone()).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    async fn insert(&self, user: User) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock().await;
        let mut users = self.get_all_users().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(AuthError::UsernameTaken);
        }
        users.push(user);
        save_json(self.store.as_ref(), USERS_KEY, &users).await?;
        Ok(())
    }

    /// Unknown usernames and wrong passwords fail the same way.
    pub async fn validate_login(&self, username: &str, password: &str) -> Result<SessionUser, AuthError> {
        let users = self.get_all_users().await;
        let Some(user) = users.iter().find(|u| u.username == username) else {
            tracing::debug!(username, "login for unknown user");
            return Err(AuthError::InvalidCredentials);
        };
        if !user.verify_password(password) {
            tracing::debug!(username, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user.to_session())
    }

    /// Change the owner's profile fields. Username is trimmed, required and
    /// stays unique.
    pub async fn update_profile(&self, user_id: UserId, edit: ProfileEdit) -> Result<SessionUser, AuthError> {
        let username = edit.username.as_deref().map(validate::username).transpose()?;
        let edit = ProfileEdit { username, ..edit };

        let _guard = self.write_lock.lock().await;
        let mut users = self.get_all_users().await;

        if let Some(name) = &edit.username {
            if users.iter().any(|u| &u.username == name && u.id != user_id) {
                return Err(AuthError::UsernameTaken);
            }
        }

        let slot = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(AuthError::NotSignedIn)?;
        *slot = slot.clone().edit(edit);
        let session = slot.to_session();

        save_json(self.store.as_ref(), USERS_KEY, &users).await?;
        Ok(session)
    }

    /// Insert the given demo accounts whose usernames are not taken yet.
    /// Returns how many were created.
    pub async fn seed_users(&self, demo: &[DemoUser]) -> Result<usize, AuthError> {
        let existing = self.get_all_users().await;
        let mut created = 0;
        for d in demo {
            if existing.iter().any(|u| u.username == d.username) {
                continue;
            }
            let user = User::with_id(
                Uuid::from_u128(d.id),
                NewUser {
                    username: d.username.to_string(),
                    email: d.email.to_string(),
                    password: d.password.to_string(),
                },
            )?;
            match self.insert(user).await {
                Ok(()) => created += 1,
                Err(AuthError::UsernameTaken) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }

    // ── Session pointer ────────────────────────────────────────

    pub async fn get_user(&self) -> Option<SessionUser> {
        load_json::<Option<SessionUser>>(self.store.as_ref(), SESSION_KEY).await
    }

    pub async fn save_user(&self, user: &SessionUser) -> Result<(), StorageError> {
        save_json(self.store.as_ref(), SESSION_KEY, user).await
    }

    pub async fn remove_user(&self) -> Result<(), StorageError> {
        self.store.remove(SESSION_KEY).await
    }
}

// ── Tests ──────────────────────────────────────────────────────
