use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::{
    auth::{AuthResponse, CurrentSession},
    error::AppError,
    models::{LoginRequest, RegisterRequest, UpdateUserRequest},
    services::UserService,
};

/// Register a new user
///
/// Creates the account, opens a first session and returns both.
///
/// ## Responses:
/// - `201 Created`: `{ "user": {...}, "token": "..." }`.
/// - `400 Bad Request`: Missing fields or a field failed validation.
/// - `409 Conflict`: The email is already registered.
#[post("")]
pub async fn register(
    users: web::Data<UserService>,
    body: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let mut user = users.register(body.into_inner()).await?;
    let token = users.generate_auth_token(&mut user).await?;

    Ok(HttpResponse::Created().json(AuthResponse { user, token }))
}

/// Login user
///
/// ## Responses:
/// - `200 OK`: `{ "user": {...}, "token": "..." }`.
/// - `401 Unauthorized`: `Unable to login`, for unknown emails and wrong passwords alike.
#[post("/login")]
pub async fn login(
    users: web::Data<UserService>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let mut user = users
        .find_by_credentials(&body.email, &body.password)
        .await?;
    let token = users.generate_auth_token(&mut user).await?;

    log::info!("User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(AuthResponse { user, token }))
}

/// Ends the session that made this request.
#[post("/logout")]
pub async fn logout(
    users: web::Data<UserService>,
    session: CurrentSession,
) -> Result<impl Responder, AppError> {
    users.logout(session.user, &session.token).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Ends every session of the current user.
#[post("/logoutAll")]
pub async fn logout_all(
    users: web::Data<UserService>,
    session: CurrentSession,
) -> Result<impl Responder, AppError> {
    users.logout_all(session.user).await?;
    Ok(HttpResponse::Ok().finish())
}

#[get("/me")]
pub async fn me(session: CurrentSession) -> impl Responder {
    HttpResponse::Ok().json(session.user)
}

/// Partially updates the profile. Only `name`, `email`, `password` and `age` are
/// accepted; any other key fails with `400`.
#[patch("/me")]
pub async fn update_me(
    users: web::Data<UserService>,
    session: CurrentSession,
    body: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    let user = users.update_profile(session.user, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Deletes the account and all of its tasks, returning the deleted profile.
#[delete("/me")]
pub async fn delete_me(
    users: web::Data<UserService>,
    session: CurrentSession,
) -> Result<impl Responder, AppError> {
    let user = users.delete_user(session.user).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Stores the request body as the avatar. PNG and JPEG images up to 1 MB.
#[post("/me/avatar")]
pub async fn upload_avatar(
    users: web::Data<UserService>,
    session: CurrentSession,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    users.set_avatar(&session.user, &body).await?;
    Ok(HttpResponse::Ok().finish())
}

#[delete("/me/avatar")]
pub async fn delete_avatar(
    users: web::Data<UserService>,
    session: CurrentSession,
) -> Result<impl Responder, AppError> {
    users.clear_avatar(&session.user).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Serves any user's avatar without authentication.
#[get("/{id}/avatar")]
pub async fn get_avatar(
    users: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let (kind, bytes) = users.avatar(user_id.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .content_type(kind.content_type())
        .body(bytes))
}
