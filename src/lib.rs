// Library root for the FlashLang API

pub mod anki;
pub mod auth;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mailer;
pub mod media;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod state;

// Re-export commonly used types
pub use db::Database;
pub use error::ApiError;
pub use state::AppState;
