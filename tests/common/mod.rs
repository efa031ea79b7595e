#![allow(dead_code)]

use actix_cors::Cors;
use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use taskmanager::auth::{AuthMiddleware, TokenKeys};
use taskmanager::routes;
use taskmanager::services::{TaskService, UserService};
use taskmanager::store::MemoryStore;

pub const PASSWORD: &str = "secret123";

/// Services and storage shared by one test application.
pub struct TestContext {
    pub store: MemoryStore,
    pub keys: TokenKeys,
    pub users: web::Data<UserService>,
    pub tasks: web::Data<TaskService>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_max_sessions(10)
    }

    pub fn with_max_sessions(max_sessions: usize) -> Self {
        let store = MemoryStore::new();
        let keys = TokenKeys::new("integration-test-secret", None, 1);
        let users = UserService::new(Arc::new(store.clone()), keys.clone(), 4, max_sessions);
        let tasks = TaskService::new(Arc::new(store.clone()));
        Self {
            store,
            keys,
            users: web::Data::new(users),
            tasks: web::Data::new(tasks),
        }
    }
}

/// Builds the application the same way `main` does.
pub async fn spawn_app(
    ctx: &TestContext,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(ctx.users.clone())
            .app_data(ctx.tasks.clone())
            .wrap(AuthMiddleware::new(ctx.keys.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config),
    )
    .await
}

/// Sends a request and returns its status and JSON body (`Null` when the body is
/// empty or not JSON). Errors raised by middleware are rendered like the server
/// would render them.
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match app.call(req).await {
        Ok(resp) => {
            let status = resp.status();
            let body = test::read_body(resp).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let body = actix_web::body::to_bytes(resp.into_body())
                .await
                .unwrap_or_default();
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Registers a user and returns the public user JSON and the session token.
pub async fn register<S, B>(app: &S, name: &str, email: &str) -> (Value, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "name": name, "email": email, "password": PASSWORD }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "Registration failed: {}", body);

    let token = body["token"]
        .as_str()
        .expect("registration response carries a token")
        .to_string();
    (body["user"].clone(), token)
}

pub async fn create_task<S, B>(app: &S, token: &str, description: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(token))
        .set_json(json!({ "description": description }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "Task creation failed: {}", body);
    body
}
