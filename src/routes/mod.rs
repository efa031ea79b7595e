pub mod health;
pub mod tasks;
pub mod users;

use actix_web::{error::JsonPayloadError, web};

use crate::error::AppError;
use crate::services::users::MAX_AVATAR_BYTES;

/// Registers every route together with the extractor configuration they rely on.
///
/// Body and query parse failures are rendered as `400` with the usual JSON error
/// body, so unknown fields in an update surface the same way as validation errors.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| json_error(err).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(web::PayloadConfig::new(MAX_AVATAR_BYTES))
    .service(health::health)
    .service(
        web::scope("/users")
            .service(users::register)
            .service(users::login)
            .service(users::logout)
            .service(users::logout_all)
            .service(users::me)
            .service(users::update_me)
            .service(users::delete_me)
            .service(users::upload_avatar)
            .service(users::delete_avatar)
            .service(users::get_avatar),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

/// Update bodies deny unknown fields; those are reported as `Invalid updates`.
fn json_error(err: JsonPayloadError) -> AppError {
    match err {
        JsonPayloadError::Deserialize(ref e) if e.to_string().starts_with("unknown field") => {
            AppError::BadRequest("Invalid updates".into())
        }
        other => AppError::BadRequest(other.to_string()),
    }
}

