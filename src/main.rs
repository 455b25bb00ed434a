use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::net::SocketAddr;
use tokio::signal;
use tower_http::services::ServeDir;
use tracing::{error, info};

use flashlang_api::{
    config::Config,
    db::Database,
    handlers::{
        audio::generate_audio,
        auth::{login, refresh},
        bulk::{bulk_upload, bulk_upload_template},
        export::export_deck,
        health_check,
        languages::list_languages,
        users::{
            change_password, delete_me, download_history, get_me, preferred_languages, register,
            resend_verification, update_me, verify_email,
        },
        vocabulary::{create_word, delete_word, get_word, list_decks, list_words, update_word},
    },
    middleware::{create_middleware_stack, init_tracing},
    state::AppState,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database connection
    let database = match Database::new(config.database.clone()).await {
        Ok(db) => {
            info!("Database connection established");
            db
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // Run database migrations and seed reference data
    if let Err(e) = database.migrate().await {
        error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = database.seed_languages().await {
        error!("Failed to seed languages: {}", e);
        std::process::exit(1);
    }
    info!("Database migrations completed successfully");

    let port = config.port;

    // Wire application state (clients, pipeline, media store)
    let state = match AppState::new(config, database).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            std::process::exit(1);
        }
    };

    // Create the Axum router with all endpoints
    let app = create_router(state);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting server on {}", addr);

    // Create the server with graceful shutdown
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Start the server with graceful shutdown handling
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Create the Axum router with all endpoints and middleware
fn create_router(state: AppState) -> Router {
    let media_root = state.media.root().to_path_buf();

    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Token endpoints
        .route("/api/token", post(login))
        .route("/api/token/refresh", post(refresh))
        // Account endpoints
        .route("/api/users/register", post(register))
        .route("/api/users/verify-email/:token", get(verify_email))
        .route("/api/users/resend-verification", post(resend_verification))
        .route("/api/users/me", get(get_me))
        .route("/api/users/me", patch(update_me))
        .route("/api/users/me", delete(delete_me))
        .route("/api/users/change-password", put(change_password))
        .route("/api/users/download-history", get(download_history))
        .route("/api/users/languages", get(preferred_languages))
        // Language reference data
        .route("/api/languages", get(list_languages))
        // Vocabulary endpoints
        .route("/api/vocabulary", post(create_word))
        .route("/api/vocabulary", get(list_words))
        .route("/api/vocabulary/decks", get(list_decks))
        .route("/api/vocabulary/bulk-upload", post(bulk_upload))
        .route("/api/vocabulary/bulk-upload-template", get(bulk_upload_template))
        .route("/api/vocabulary/:id", get(get_word))
        .route("/api/vocabulary/:id", patch(update_word))
        .route("/api/vocabulary/:id", delete(delete_word))
        // Generation and export endpoints
        .route("/api/generate-audio", post(generate_audio))
        .route("/api/anki/export", post(export_deck))
        // Generated media (audio files) served statically
        .nest_service("/media", ServeDir::new(media_root))
        // Add shared state
        .with_state(state)
        // Apply middleware stack
        .layer(create_middleware_stack())
}

/// Graceful shutdown signal handler
/// Listens for SIGTERM and SIGINT signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        },
    }
}
