use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Largest page size a task listing may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub description: String,
    pub completed: bool,
    /// Identifier of the user who owns the task.
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` owned by `owner` from validated input.
    pub fn new(input: TaskInput, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: input.description,
            completed: input.completed,
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a validated partial update and bumps `updated_at`.
    pub fn apply(&mut self, update: TaskUpdate) {
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        self.updated_at = Utc::now();
    }
}

/// Input structure for creating a task.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be non-empty after trimming.
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl TaskInput {
    pub fn normalized(self) -> Self {
        Self {
            description: self.description.trim().to_string(),
            completed: self.completed,
        }
    }
}

/// Partial update of a task. Only `description` and `completed` may change.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdate {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn normalized(self) -> Self {
        Self {
            description: self.description.map(|d| d.trim().to_string()),
            completed: self.completed,
        }
    }
}

/// Column a task listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Description,
    Completed,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Description => "description",
            SortField::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query parameters accepted by `GET /tasks`.
///
/// `sortBy` takes the form `<field>:<asc|desc>`, for example `createdAt:desc`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub completed: Option<bool>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

/// A parsed, bounded task listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub limit: Option<i64>,
    pub skip: i64,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            completed: None,
            limit: None,
            skip: 0,
            sort: SortField::CreatedAt,
            order: SortOrder::Asc,
        }
    }
}

impl TryFrom<TaskQuery> for TaskFilter {
    type Error = AppError;

    fn try_from(query: TaskQuery) -> Result<Self, Self::Error> {
        let mut filter = TaskFilter {
            completed: query.completed,
            ..TaskFilter::default()
        };

        if let Some(limit) = query.limit {
            if limit < 1 {
                return Err(AppError::ValidationError("limit must be positive".into()));
            }
            filter.limit = Some(limit.min(MAX_PAGE_SIZE));
        }
        if let Some(skip) = query.skip {
            if skip < 0 {
                return Err(AppError::ValidationError("skip must not be negative".into()));
            }
            filter.skip = skip;
        }
        if let Some(sort_by) = query.sort_by {
            let (field, order) = sort_by.split_once(':').unwrap_or((sort_by.as_str(), "asc"));
            filter.sort = match field {
                "createdAt" => SortField::CreatedAt,
                "updatedAt" => SortField::UpdatedAt,
                "description" => SortField::Description,
                "completed" => SortField::Completed,
                other => {
                    return Err(AppError::ValidationError(format!(
                        "Cannot sort by {}",
                        other
                    )))
                }
            };
            filter.order = match order {
                "asc" => SortOrder::Asc,
                "desc" => SortOrder::Desc,
                other => {
                    return Err(AppError::ValidationError(format!(
                        "Unknown sort order {}",
                        other
                    )))
                }
            };
        }

        Ok(filter)
    }
}
