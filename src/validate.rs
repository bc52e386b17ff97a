use crate::error::ValidationError;
use crate::model::NewTask;

pub const MIN_PASSWORD_LEN: usize = 6;

/// What the sign-up screen collects.
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Trimmed, non-empty task title.
pub fn task_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}

/// Trimmed, non-empty username.
pub fn username(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField("username"));
    }
    Ok(name.to_string())
}

/// Checks the create screen makes before calling `add_task`: a title and a
/// selected list.
pub fn create_form(task: &NewTask) -> Result<(), ValidationError> {
    task_title(&task.title)?;
    match task.list_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(()),
        _ => Err(ValidationError::EmptyCategory),
    }
}

/// Both fields are required. The username comes back trimmed; the password
/// comes back exactly as typed, the same bytes sign-up hashed.
pub fn sign_in_form(username: &str, password: &str) -> Result<(String, String), ValidationError> {
    let username = username.trim();
    if username.is_empty() || password.trim().is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok((username.to_string(), password.to_string()))
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let username = self.username.trim();
        let email = self.email.trim();

        if username.is_empty() && email.is_empty() && self.password.is_empty() && self.confirm_password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        if username.is_empty() {
            return Err(ValidationError::MissingField("username"));
        }
        if email.is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
        }
        if self.confirm_password.is_empty() {
            return Err(ValidationError::MissingField("campo confirmar senha"));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}
