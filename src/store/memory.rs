use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TaskRepository, UserRepository};
use crate::error::AppError;
use crate::models::{SortField, SortOrder, Task, TaskFilter, User};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    avatar: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, StoredUser>,
    tasks: HashMap<Uuid, Task>,
}

/// In-process store. Users and tasks share one lock, so the cascade delete
/// is atomic with respect to every other operation.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `change` to the stored token list under the write lock.
    async fn update_tokens<F>(&self, id: Uuid, change: F) -> Result<Option<User>, AppError>
    where
        F: FnOnce(&mut Vec<String>) + Send,
    {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(&id).map(|stored| {
            change(&mut stored.user.tokens);
            stored.user.clone()
        }))
    }
}

fn email_taken(state: &State, email: &str, except: Option<Uuid>) -> bool {
    state
        .users
        .values()
        .any(|s| Some(s.user.id) != except && s.user.email.eq_ignore_ascii_case(email))
}

fn compare(a: &Task, b: &Task, field: SortField) -> Ordering {
    let primary = match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Description => a.description.cmp(&b.description),
        SortField::Completed => a.completed.cmp(&b.completed),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if email_taken(&state, &user.email, None) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        state.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                avatar: None,
            },
        );
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|s| s.user.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|s| s.user.email == email)
            .map(|s| s.user.clone()))
    }

    async fn save_user(&self, user: &User) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if email_taken(&state, &user.email, Some(user.id)) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        let stored = state
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        stored.user = User {
            tokens: std::mem::take(&mut stored.user.tokens),
            ..user.clone()
        };
        Ok(stored.user.clone())
    }

    async fn push_token(
        &self,
        id: Uuid,
        token: &str,
        max_sessions: usize,
    ) -> Result<Option<User>, AppError> {
        self.update_tokens(id, |tokens| {
            tokens.push(token.to_string());
            let overflow = tokens.len().saturating_sub(max_sessions);
            tokens.drain(..overflow);
        })
        .await
    }

    async fn remove_token(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError> {
        self.update_tokens(id, |tokens| tokens.retain(|t| t != token))
            .await
    }

    async fn clear_tokens(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.update_tokens(id, |tokens| tokens.clear()).await
    }

    async fn delete_user_cascade(&self, id: Uuid) -> Result<Option<u64>, AppError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Ok(None);
        }
        let before = state.tasks.len();
        state.tasks.retain(|_, task| task.owner != id);
        let removed = (before - state.tasks.len()) as u64;
        state.users.remove(&id);
        Ok(Some(removed))
    }

    async fn set_avatar(&self, id: Uuid, avatar: Option<Vec<u8>>) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&id) {
            Some(stored) => {
                stored.avatar = avatar;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn avatar(&self, id: Uuid) -> Result<Option<Vec<u8>>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).and_then(|s| s.avatar.clone()))
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create_task(&self, task: Task) -> Result<Task, AppError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&task.owner) {
            return Err(AppError::NotFound("Owner not found".into()));
        }
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .get(&id)
            .filter(|task| task.owner == owner)
            .cloned())
    }

    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.owner == owner)
            .filter(|task| filter.completed.map_or(true, |c| task.completed == c))
            .cloned()
            .collect();

        tasks.sort_by(|a, b| match filter.order {
            SortOrder::Asc => compare(a, b, filter.sort),
            SortOrder::Desc => compare(b, a, filter.sort),
        });

        let page = tasks.into_iter().skip(filter.skip as usize);
        Ok(match filter.limit {
            Some(limit) => page.take(limit as usize).collect(),
            None => page.collect(),
        })
    }

    async fn save_task(&self, task: &Task) -> Result<Option<Task>, AppError> {
        let mut state = self.state.write().await;
        match state.tasks.get_mut(&task.id) {
            Some(stored) if stored.owner == task.owner => {
                *stored = task.clone();
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let mut state = self.state.write().await;
        let owned = state.tasks.get(&id).is_some_and(|task| task.owner == owner);
        Ok(if owned { state.tasks.remove(&id) } else { None })
    }

    async fn count_tasks(&self, owner: Uuid) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state.tasks.values().filter(|task| task.owner == owner).count() as i64)
    }
}
