use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::auth::{bearer_token, BearerToken};
use crate::error::AppError;
use crate::models::User;
use crate::services::UserService;

/// The authenticated user of the current request, along with the token that
/// authenticated it.
///
/// The token is taken from request extensions when `AuthMiddleware` ran, or read
/// from the `Authorization` header otherwise. Either way it must still be listed
/// in the user's sessions, so a logged-out token is rejected even before it
/// expires.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub user: User,
    pub token: String,
}

impl FromRequest for CurrentSession {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .extensions()
            .get::<BearerToken>()
            .cloned()
            .or_else(|| bearer_token(req.headers()));
        let service = req.app_data::<web::Data<UserService>>().cloned();

        Box::pin(async move {
            let BearerToken(token) =
                token.ok_or_else(|| AppError::Unauthorized("Please authenticate.".into()))?;
            let service = service.ok_or_else(|| {
                AppError::InternalServerError("UserService is not registered as app data".into())
            })?;

            let user = service.authenticate(&token).await?;
            Ok(CurrentSession { user, token })
        })
    }
}
