use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use lms::auth::password::hash_password;
use lms::config::Config;
use lms::db::init_db;
use lms::docs::ApiDoc;
use lms::domain::events::{InAppNotifier, Notifier};
use lms::domain::workflow::LeaveWorkflow;
use lms::routes;
use lms::store::{LeaveStore, NewUser, memory::MemStore, mysql::MySqlStore};

#[get("/")]
async fn index() -> impl Responder {
    "Leave Management System"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store: Arc<dyn LeaveStore> = match &config.database_url {
        Some(url) => {
            let pool = init_db(url).await;
            Arc::new(MySqlStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, running with the in-memory store");
            let store = Arc::new(MemStore::new());
            // register refuses ADMIN accounts, so the dev store seeds one
            let admin_password =
                std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
            store
                .create_user(NewUser {
                    username: "admin".into(),
                    password_hash: hash_password(&admin_password),
                    role_id: 1,
                    employee_id: None,
                    is_approved: true,
                })
                .await
                .expect("Failed to seed admin user");
            store
        }
    };

    let notifier: Arc<dyn Notifier> = Arc::new(InAppNotifier::new(store.clone()));
    let workflow = Data::new(LeaveWorkflow::new(
        store.clone(),
        notifier,
        config.leave_policy(),
    ));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::from(store.clone()))
            .app_data(workflow.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
