//! Persistence layer.
//!
//! Services talk to storage through the [`UserRepository`] and [`TaskRepository`]
//! traits. [`PgStore`] backs them with Postgres; [`MemoryStore`] keeps everything in
//! process and is used when no database is configured, and in tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, TaskFilter, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new user. Fails with `AppError::Conflict` if the email is taken.
    async fn create_user(&self, user: User) -> Result<User, AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Looks a user up by its already normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Persists the profile fields of `user` (name, email, password hash, age).
    ///
    /// The stored token list is left untouched and returned as currently stored.
    async fn save_user(&self, user: &User) -> Result<User, AppError>;

    /// Appends `token`, then drops the oldest tokens so at most `max_sessions` remain.
    /// Returns `None` if the user does not exist.
    async fn push_token(
        &self,
        id: Uuid,
        token: &str,
        max_sessions: usize,
    ) -> Result<Option<User>, AppError>;

    /// Removes every occurrence of `token`. Returns `None` if the user does not exist.
    async fn remove_token(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError>;

    async fn clear_tokens(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Deletes all tasks owned by the user, then the user, as one unit.
    ///
    /// Returns the number of tasks removed, or `None` if the user did not exist.
    async fn delete_user_cascade(&self, id: Uuid) -> Result<Option<u64>, AppError>;

    /// Replaces (or clears) the avatar. Returns `false` if the user does not exist.
    async fn set_avatar(&self, id: Uuid, avatar: Option<Vec<u8>>) -> Result<bool, AppError>;

    async fn avatar(&self, id: Uuid) -> Result<Option<Vec<u8>>, AppError>;
}

/// Task storage. Every lookup is scoped by owner.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create_task(&self, task: Task) -> Result<Task, AppError>;

    async fn find_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError>;

    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, AppError>;

    /// Persists `task`. Returns `None` if no task with that id belongs to `task.owner`.
    async fn save_task(&self, task: &Task) -> Result<Option<Task>, AppError>;

    /// Deletes and returns the task, or `None` if the owner has no such task.
    async fn delete_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError>;

    async fn count_tasks(&self, owner: Uuid) -> Result<i64, AppError>;
}
