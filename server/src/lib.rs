use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    classify::ServerErrorsFailureClass, limit::RequestBodyLimitLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;
use utoipa::OpenApi;

pub mod accounts;
pub mod auth;
pub mod checksum;
pub mod config;
pub mod domain;
pub mod error;
pub mod file_reply;
pub mod files;
mod handlers;
pub mod naming;
pub mod password;
pub mod random;
pub mod sqlite;

use crate::accounts::UserAccountService;
use crate::auth::SessionAuthenticator;
use crate::config::Config;
use crate::domain::MetadataStore;
use crate::files::FileStorageService;
use crate::naming::StorageNameGenerator;
use crate::password::Argon2Hasher;
use crate::random::{OsRandom, RandomSource};
use crate::sqlite::Sqlite;
use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Services shared by all request handlers.
pub struct AppState {
    pub accounts: UserAccountService<Sqlite>,
    pub files: FileStorageService<Sqlite>,
}

impl AppState {
    /// Wires the services on top of the database and storage root of `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(Sqlite::new(&config.db));
        let random: Arc<dyn RandomSource> = Arc::new(OsRandom);
        let sessions = SessionAuthenticator::new(Arc::clone(&store), Arc::clone(&random));
        Self {
            accounts: UserAccountService::new(
                Arc::clone(&store),
                Arc::new(Argon2Hasher::default()),
                sessions.clone(),
            ),
            files: FileStorageService::new(
                store,
                sessions,
                StorageNameGenerator::new(random),
                config.files_dir.clone(),
            ),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register,
        handlers::login,
        handlers::logout,
        handlers::upload_file,
        handlers::delete_file,
        handlers::download_file,
        handlers::rename_file,
        handlers::list_files,
    ),
    components(schemas(
        kernel::Credentials,
        kernel::LoginResponse,
        kernel::RenameRequest,
        kernel::FileEntry,
        kernel::ErrorResponse
    )),
    tags(
        (name = "users", description = "Registration and sessions"),
        (name = "files", description = "File storage")
    )
)]
pub struct ApiDoc;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "server=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    init_storage(&config)?;

    let socket = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(socket).await?;
    tracing::debug!("listening on {socket}");

    let app = create_routes(&config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Creates the storage directory and the database schema when missing.
pub fn init_storage(config: &Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.files_dir)?;
    if let Some(parent) = config.db.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Sqlite::new(&config.db).new_database()?;
    tracing::info!(
        "database {} storage {}",
        config.db.display(),
        config.files_dir.display()
    );
    Ok(())
}

pub fn create_routes(config: &Config) -> Router {
    let state = Arc::new(AppState::new(config));
    Router::new()
        .route("/registration", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route(
            "/file",
            post(handlers::upload_file)
                .delete(handlers::delete_file)
                .get(handlers::download_file)
                .put(handlers::rename_file),
        )
        .route("/list", get(handlers::list_files))
        .route("/api-docs/openapi.json", get(handlers::openapi))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().on_failure(
                    |error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                        tracing::error!("Server error: {error}");
                    },
                ))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(config.max_body))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    config.request_timeout,
                ))
                .into_inner(),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
}
