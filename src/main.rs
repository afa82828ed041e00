use content_portal::{
    AppState, bootstrap,
    config::{AppConfig, Env},
    create_router,
    mailer::{DisabledMailer, MailerState, SmtpMailer},
    repository::{PostgresRepository, RepositoryState},
    storage::{DiskStorage, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point for the application, responsible for
/// initializing all core components: Configuration, Logging, Database,
/// Storage, Mailer, the super-admin bootstrap and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing Production secrets.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Prioritizes RUST_LOG, falling back to sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "content_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    // The structured logging format is dynamically selected based on APP_ENV.
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON output for ingestion by centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (Postgres)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // Instantiate the Repository, wrapping it in an Arc for thread-safe sharing.
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Storage Initialization (local disk, served back via /uploads)
    let storage =
        Arc::new(DiskStorage::new(&config.upload_dir, config.base_url.clone())) as StorageState;

    // 6. Mailer Initialization
    // Falls back to the disabled relay when SMTP is not configured, so the
    // contact endpoint keeps accepting submissions either way.
    let mailer: MailerState = match SmtpMailer::new(&config) {
        Ok(smtp) => Arc::new(smtp),
        Err(e) => {
            tracing::warn!("outbound email disabled: {}", e);
            Arc::new(DisabledMailer)
        }
    };

    // 7. Super Admin Bootstrap (idempotent)
    // Guarantees a highest-privilege account exists before the listener opens.
    bootstrap::ensure_super_admin(&repo, &config)
        .await
        .expect("FATAL: super admin bootstrap failed.");

    // 8. Unified State Assembly
    let port = config.port;
    let app_state = AppState {
        repo,
        storage,
        mailer,
        config,
    };

    // 9. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("FATAL: failed to bind listener.");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:{port}");
    tracing::info!(
        "API Documentation (Swagger UI) available at: http://localhost:{port}/swagger-ui"
    );

    // The long-running Axum server process.
    axum::serve(listener, app).await.expect("FATAL: server error.");
}
