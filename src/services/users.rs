//! User lifecycle: registration, credential checks, session tokens, profile
//! updates, avatars and the cascading delete.

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, verify_password, TokenKeys};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{RegisterRequest, UpdateUserRequest, User};
use crate::store::UserRepository;

/// Message returned for every failed login, whatever the cause.
const LOGIN_FAILED: &str = "Unable to login";
const NOT_AUTHENTICATED: &str = "Please authenticate.";

/// Largest accepted avatar upload, in bytes.
pub const MAX_AVATAR_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    keys: TokenKeys,
    password_cost: u32,
    max_sessions: usize,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        keys: TokenKeys,
        password_cost: u32,
        max_sessions: usize,
    ) -> Self {
        Self {
            users,
            keys,
            password_cost,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Validates the input, hashes the password and persists a new user.
    pub async fn register(&self, input: RegisterRequest) -> Result<User, AppError> {
        let input = input.normalized();
        input.validate()?;

        let password_hash = hash_password(&input.password, self.password_cost)?;
        let user = self.users.create_user(User::new(input, password_hash)).await?;

        log::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Returns the user owning `email` if `password` matches its stored hash.
    ///
    /// Unknown emails and wrong passwords fail with the same message.
    pub async fn find_by_credentials(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self
            .users
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::Unauthorized(LOGIN_FAILED.into()))?;

        if !verify_password(password, &user.password_hash)? {
            log::debug!("Rejected login for user {}", user.id);
            return Err(AppError::Unauthorized(LOGIN_FAILED.into()));
        }

        Ok(user)
    }

    /// Signs a token for `user`, appends it to the stored session list and
    /// refreshes `user` from the store.
    ///
    /// Tokens that no longer verify are pruned first, then the oldest ones are
    /// dropped so that at most `max_sessions` remain.
    pub async fn generate_auth_token(&self, user: &mut User) -> Result<String, AppError> {
        let token = self.keys.issue(user.id)?;

        let stale: Vec<String> = user
            .tokens
            .iter()
            .filter(|existing| self.keys.verify(existing).is_err())
            .cloned()
            .collect();
        for existing in &stale {
            self.users.remove_token(user.id, existing).await?;
        }

        *user = self
            .users
            .push_token(user.id, &token, self.max_sessions)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        Ok(token)
    }

    /// Resolves a bearer token to its user. The token must verify and still be
    /// present in the user's session list.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self
            .keys
            .verify(token)
            .map_err(|_| AppError::Unauthorized(NOT_AUTHENTICATED.into()))?;

        match self.users.find_user(claims.sub).await? {
            Some(user) if user.tokens.iter().any(|t| t == token) => Ok(user),
            _ => Err(AppError::Unauthorized(NOT_AUTHENTICATED.into())),
        }
    }

    /// Revokes a single session.
    pub async fn logout(&self, user: User, token: &str) -> Result<User, AppError> {
        self.users
            .remove_token(user.id, token)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Revokes every session of the user.
    pub async fn logout_all(&self, user: User) -> Result<User, AppError> {
        self.users
            .clear_tokens(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Applies a partial profile update. The password is re-hashed only when the
    /// update carries one. The session list is never written from `user`.
    pub async fn update_profile(
        &self,
        mut user: User,
        changes: UpdateUserRequest,
    ) -> Result<User, AppError> {
        let changes = changes.normalized();
        changes.validate()?;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password) = changes.password {
            user.password_hash = hash_password(&password, self.password_cost)?;
        }
        if let Some(age) = changes.age {
            user.age = age;
        }
        user.updated_at = chrono::Utc::now();

        self.users.save_user(&user).await
    }

    /// Deletes the user together with every task it owns.
    pub async fn delete_user(&self, user: User) -> Result<User, AppError> {
        let removed = self
            .users
            .delete_user_cascade(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        log::info!("Deleted user {} and {} owned task(s)", user.id, removed);
        Ok(user)
    }

    pub async fn set_avatar(&self, user: &User, image: &[u8]) -> Result<(), AppError> {
        if image.len() > MAX_AVATAR_BYTES {
            return Err(AppError::ValidationError("File too large".into()));
        }
        if AvatarImage::detect(image).is_none() {
            return Err(AppError::ValidationError("Please upload an image".into()));
        }
        self.store_avatar(user.id, Some(image.to_vec())).await
    }

    pub async fn clear_avatar(&self, user: &User) -> Result<(), AppError> {
        self.store_avatar(user.id, None).await
    }

    /// Loads the avatar of any user, with its detected image type.
    pub async fn avatar(&self, user_id: Uuid) -> Result<(AvatarImage, Vec<u8>), AppError> {
        let bytes = self
            .users
            .avatar(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Avatar not found".into()))?;
        let kind = AvatarImage::detect(&bytes)
            .ok_or_else(|| AppError::InternalServerError("Stored avatar is not an image".into()))?;
        Ok((kind, bytes))
    }

    async fn store_avatar(&self, user_id: Uuid, avatar: Option<Vec<u8>>) -> Result<(), AppError> {
        if self.users.set_avatar(user_id, avatar).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("User not found".into()))
        }
    }
}

/// Image formats accepted as avatars, recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarImage {
    Png,
    Jpeg,
}

impl AvatarImage {
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(AvatarImage::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(AvatarImage::Jpeg)
        } else {
            None
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AvatarImage::Png => "image/png",
            AvatarImage::Jpeg => "image/jpeg",
        }
    }
}
