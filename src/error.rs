//! Error taxonomy.
//!
//! Every `Display` string here is safe to show to the person using the app.
//! Storage problems are mostly logged and swallowed by the services; the
//! variants exist so the adapters can report what went wrong.

use thiserror::Error;

// ── Storage ────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("redb: {0}")]
    Redb(String),
    #[error("encode: {0}")]
    Encode(String),
    #[error("decode: {0}")]
    Decode(String),
    /// The blocking storage task panicked or was cancelled.
    #[error("storage task: {0}")]
    Background(String),
}

// redb 2.x has many error types. Blanket them all into StorageError::Redb.
macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for StorageError {
            fn from(e: $t) -> Self { StorageError::Redb(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

impl From<tokio::task::JoinError> for StorageError {
    fn from(e: tokio::task::JoinError) -> Self {
        StorageError::Background(e.to_string())
    }
}

// ── Validation ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Informe um título.")]
    EmptyTitle,
    #[error("Selecione uma categoria.")]
    EmptyCategory,
    #[error("Data inválida: {0}")]
    InvalidDate(String),
    #[error("Horário inválido: {0}")]
    InvalidTime(String),
    #[error("Todos os campos são necessários")]
    MissingCredentials,
    #[error("O {0} é obrigatório")]
    MissingField(&'static str),
    #[error("A senha deve ter pelo menos {0} caracteres")]
    PasswordTooShort(usize),
    #[error("As senhas não coincidem")]
    PasswordMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown priority {0:?}")]
pub struct UnknownPriority(pub String);

// ── Auth ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username and wrong password share this variant on purpose.
    #[error("Usuário ou senha incorretos")]
    InvalidCredentials,
    #[error("Nome de usuário já existe")]
    UsernameTaken,
    #[error("Nenhum usuário conectado")]
    NotSignedIn,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Erro ao acessar o armazenamento")]
    Storage(#[from] StorageError),
    #[error("Erro ao processar a senha")]
    PasswordHash,
}

// ── Tasks ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Mutations need an active per-user partition.
    #[error("Nenhum usuário conectado")]
    SignedOut,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// ── Settings ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
