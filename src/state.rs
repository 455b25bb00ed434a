use std::sync::Arc;

use crate::auth::AuthKeys;
use crate::clients::{GoogleTranslator, OpenAiGenerator, TranslateTts};
use crate::config::Config;
use crate::db::Database;
use crate::error::ApiError;
use crate::mailer::{LogMailer, Mailer};
use crate::media::MediaStore;
use crate::pipeline::ContentPipeline;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<AuthKeys>,
    pub pipeline: Arc<ContentPipeline>,
    pub media: MediaStore,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the production clients from configuration.
    pub async fn new(config: Config, db: Database) -> Result<Self, ApiError> {
        let media = MediaStore::new(config.media_root.clone());
        media.ensure_layout().await?;

        let pipeline = ContentPipeline::new(
            Arc::new(OpenAiGenerator::new(&config.openai)?),
            Arc::new(GoogleTranslator::new(&config.translate)?),
            Arc::new(TranslateTts::new(&config.tts)?),
            media.clone(),
        );

        Ok(AppState {
            auth: Arc::new(AuthKeys::new(&config.auth)),
            pipeline: Arc::new(pipeline),
            media,
            mailer: Arc::new(LogMailer),
            config: Arc::new(config),
            db,
        })
    }
}
