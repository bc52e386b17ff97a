
//---------------------------------------
pub mod error;
pub mod settings;
//---------------------------------------

//---------------------------------------
pub mod storage;
pub mod persist;
//---------------------------------------

//---------------------------------------
pub mod model;
pub mod schedule;
pub mod validate;
//---------------------------------------

//---------------------------------------
pub mod tasks;
pub mod query;
pub mod repository;
//---------------------------------------

//---------------------------------------
pub mod users;
pub mod session;
pub mod app;
//---------------------------------------

pub use app::App;
pub use error::{AuthError, SettingsError, StorageError, TaskError, UnknownPriority, ValidationError};
pub use model::*;
pub use persist::SaveFile;
pub use repository::{TaskRepository, TaskSnapshot};
pub use session::{SessionService, SessionState};
pub use settings::Settings;
pub use storage::{KeyValueStore, MemoryStore};
