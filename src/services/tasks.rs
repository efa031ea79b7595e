use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{Task, TaskFilter, TaskInput, TaskUpdate};
use crate::store::TaskRepository;

/// Owner-scoped task operations. A task that belongs to someone else is
/// reported exactly like a task that does not exist.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self { tasks }
    }

    pub async fn create(&self, owner: Uuid, input: TaskInput) -> Result<Task, AppError> {
        let input = input.normalized();
        input.validate()?;
        self.tasks.create_task(Task::new(input, owner)).await
    }

    /// The tasks owned by a user, filtered, sorted and paged.
    pub async fn list_tasks_for_user(
        &self,
        owner: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, AppError> {
        self.tasks.list_tasks(owner, filter).await
    }

    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<Task, AppError> {
        self.tasks
            .find_task(owner, id)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TaskUpdate,
    ) -> Result<Task, AppError> {
        let changes = changes.normalized();
        changes.validate()?;

        let mut task = self.get(owner, id).await?;
        task.apply(changes);
        self.tasks.save_task(&task).await?.ok_or_else(not_found)
    }

    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<Task, AppError> {
        self.tasks
            .delete_task(owner, id)
            .await?
            .ok_or_else(not_found)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}
