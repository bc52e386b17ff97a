use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AuthError, UnknownPriority};

pub type UserId = Uuid;
pub type TaskId = Uuid;
pub type SubtaskId = Uuid;

// ── Users ──────────────────────────────────────────────────────

/// Full user record. Only lives in the "all users" collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What the session pointer stores: a user without credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Profile fields the owner may change. `None` leaves a field alone; for the
/// optional fields `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub username: Option<String>,
    pub email: Option<String>,
    pub description: Option<Option<String>>,
    pub profile_image: Option<Option<String>>,
}

impl User {
    pub fn new(request: NewUser) -> Result<Self, AuthError> {
        Self::with_id(Uuid::new_v4(), request)
    }

    pub fn with_id(id: UserId, request: NewUser) -> Result<Self, AuthError> {
        Ok(Self {
            id,
            username: request.username,
            email: request.email,
            password_hash: hash_password(request.password.as_bytes())?,
            created_at: Utc::now(),
            profile_image: None,
            description: None,
        })
    }

    pub fn edit(self, request: ProfileEdit) -> Self {
        Self {
            username: request.username.unwrap_or(self.username),
            email: request.email.unwrap_or(self.email),
            description: request.description.unwrap_or(self.description),
            profile_image: request.profile_image.unwrap_or(self.profile_image),
            ..self
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        let parsed_hash = match PasswordHash::new(&self.password_hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    pub fn to_session(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            profile_image: self.profile_image.clone(),
            description: self.description.clone(),
        }
    }
}

fn hash_password(password_bytes: &[u8]) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password_bytes, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            AuthError::PasswordHash
        })
}

// ── Tasks ──────────────────────────────────────────────────────

/// Closed priority set. Stored with the labels the app shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Baixa", alias = "baixa", alias = "Low")]
    Low,
    #[serde(rename = "Média", alias = "Media", alias = "média", alias = "media", alias = "Medium")]
    Medium,
    #[serde(rename = "Alta", alias = "alta", alias = "High")]
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Baixa",
            Priority::Medium => "Média",
            Priority::High => "Alta",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baixa" | "low" => Ok(Priority::Low),
            "média" | "media" | "medium" => Ok(Priority::Medium),
            "alta" | "high" => Ok(Priority::High),
            _ => Err(UnknownPriority(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Subtask {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
        }
    }
}

/// A to-do item owned by exactly one user.
///
/// `date` is canonical `YYYY-MM-DD`, `time` is `HH:MM`. Both are checked on
/// the way in (see [`crate::schedule`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a task. Only `title` is required; subtasks are given
/// as plain titles.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub list_name: Option<String>,
    pub priority: Option<Priority>,
    pub goal: Option<String>,
    pub description: Option<String>,
    pub meeting: Option<String>,
    pub subtasks: Vec<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Shallow update: only the fields that are `Some` are replaced. For the
/// optional task fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub date: Option<Option<String>>,
    pub time: Option<Option<String>>,
    pub list_name: Option<Option<String>>,
    pub priority: Option<Option<Priority>>,
    pub goal: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub meeting: Option<Option<String>>,
    pub subtasks: Option<Vec<Subtask>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        TaskPatch {
            completed: Some(completed),
            ..Default::default()
        }
    }
}
