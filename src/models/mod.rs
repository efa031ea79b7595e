pub mod task;
pub mod user;

pub use task::{SortField, SortOrder, Task, TaskFilter, TaskInput, TaskQuery, TaskUpdate};
pub use user::{LoginRequest, RegisterRequest, UpdateUserRequest, User};
