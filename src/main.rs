use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use taskmanager::auth::{AuthMiddleware, TokenKeys};
use taskmanager::config::Config;
use taskmanager::routes;
use taskmanager::store::{MemoryStore, PgStore, TaskRepository, UserRepository};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let (users, tasks): (Arc<dyn UserRepository>, Arc<dyn TaskRepository>) =
        match &config.database_url {
            Some(url) => {
                let store = Arc::new(
                    PgStore::connect(url)
                        .await
                        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?,
                );
                let users: Arc<dyn UserRepository> = store.clone();
                let tasks: Arc<dyn TaskRepository> = store;
                (users, tasks)
            }
            None => {
                log::warn!("DATABASE_URL is not set; using the in-memory store, data will not persist");
                let store = Arc::new(MemoryStore::new());
                let users: Arc<dyn UserRepository> = store.clone();
                let tasks: Arc<dyn TaskRepository> = store;
                (users, tasks)
            }
        };

    let (user_service, task_service) = taskmanager::build_services(&config, users, tasks);
    let user_service = web::Data::new(user_service);
    let task_service = web::Data::new(task_service);
    let keys = TokenKeys::from_config(&config);

    log::info!("Starting task manager server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(user_service.clone())
            .app_data(task_service.clone())
            .wrap(AuthMiddleware::new(keys.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
