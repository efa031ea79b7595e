#![doc = "The `taskmanager` library crate."]
#![doc = ""]
#![doc = "Users register, log in with token-based sessions, and manage their own tasks."]
#![doc = "This crate holds the domain models, persistence layer, services, authentication,"]
#![doc = "routing and error handling; `main.rs` wires them into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use crate::auth::TokenKeys;
use crate::config::Config;
use crate::services::{TaskService, UserService};
use crate::store::{TaskRepository, UserRepository};

/// Builds both services over the given repositories, using the configured
/// token keys, bcrypt cost and session bound.
pub fn build_services(
    config: &Config,
    users: Arc<dyn UserRepository>,
    tasks: Arc<dyn TaskRepository>,
) -> (UserService, TaskService) {
    let user_service = UserService::new(
        users,
        TokenKeys::from_config(config),
        config.bcrypt_cost,
        config.max_sessions,
    );
    (user_service, TaskService::new(tasks))
}
