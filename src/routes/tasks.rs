use crate::{
    auth::CurrentSession,
    error::AppError,
    models::{TaskFilter, TaskInput, TaskQuery, TaskUpdate},
    services::TaskService,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use uuid::Uuid;

/// Retrieves the tasks of the authenticated user.
///
/// ## Query Parameters:
/// - `completed` (optional): `true` or `false`.
/// - `limit` / `skip` (optional): paging; `limit` is capped at 100.
/// - `sortBy` (optional): `<field>:<asc|desc>` with field one of `createdAt`,
///   `updatedAt`, `description`, `completed`.
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks.
/// - `400 Bad Request`: Unknown sort field or invalid paging values.
/// - `401 Unauthorized`: No active session.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskService>,
    session: CurrentSession,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let filter = TaskFilter::try_from(query.into_inner())?;
    let list = tasks.list_tasks_for_user(session.user.id, &filter).await?;
    Ok(HttpResponse::Ok().json(list))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: The new task.
/// - `400 Bad Request`: Missing or blank `description`.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    session: CurrentSession,
    body: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = tasks.create(session.user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one task. Tasks of other users are reported as `404`.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    session: CurrentSession,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks.get(session.user.id, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates `description` and/or `completed`. Any other key fails with `400`.
#[patch("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    session: CurrentSession,
    task_id: web::Path<Uuid>,
    body: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .update(session.user.id, task_id.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task and returns it.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    session: CurrentSession,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks.delete(session.user.id, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}
