mod history;
mod users;
mod vocabulary;

use deadpool_postgres::{Config, Object, Pool, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::ApiError;

/// PostgreSQL への接続プールを握るリポジトリ層。
/// Deadpool の `Pool` を内部に保持し、ドメイン操作はサブモジュールごとの
/// `impl Database` ブロックで提供する。
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// 接続プールを構築し、起動時に疎通確認まで実施する。
    pub async fn new(config: DatabaseConfig) -> Result<Self, ApiError> {
        info!(
            "Creating PostgreSQL connection pool for host: {}:{}",
            config.host, config.port
        );

        let pool = Self::create_pool(config)?;

        let db = Database { pool };
        db.test_connection().await?;

        Ok(db)
    }

    fn create_pool(config: DatabaseConfig) -> Result<Pool, ApiError> {
        let mut pg_config = Config::new();

        pg_config.host = Some(config.host);
        pg_config.port = Some(config.port);
        pg_config.dbname = Some(config.database);
        pg_config.user = Some(config.username);
        pg_config.password = Some(config.password);

        match config.ssl_mode.as_str() {
            "disable" => {
                pg_config.ssl_mode = Some(deadpool_postgres::SslMode::Disable);
            }
            "prefer" => {
                pg_config.ssl_mode = Some(deadpool_postgres::SslMode::Prefer);
            }
            "require" => {
                pg_config.ssl_mode = Some(deadpool_postgres::SslMode::Require);
            }
            _ => {
                warn!("Unknown SSL mode '{}', defaulting to 'require'", config.ssl_mode);
                pg_config.ssl_mode = Some(deadpool_postgres::SslMode::Require);
            }
        }

        pg_config.manager = Some(deadpool_postgres::ManagerConfig {
            recycling_method: deadpool_postgres::RecyclingMethod::Fast,
        });

        pg_config.pool = Some(deadpool_postgres::PoolConfig::new(
            config.max_connections as usize,
        ));

        let tls_connector = TlsConnector::builder().build().map_err(|e| {
            error!("Failed to create TLS connector: {}", e);
            ApiError::Database(format!("TLS connector creation failed: {}", e))
        })?;
        let tls = MakeTlsConnector::new(tls_connector);

        pg_config.create_pool(Some(Runtime::Tokio1), tls).map_err(|e| {
            error!("Failed to create connection pool: {}", e);
            ApiError::Database(format!("Connection pool creation failed: {}", e))
        })
    }

    /// プールから接続を借りる小さなラッパー。
    async fn get_connection(&self) -> Result<Object, ApiError> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// `SELECT 1` を投げて DB が生きているか確認する。
    pub async fn health_check(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Database health check failed: {}", e);
            ApiError::Database(format!("Health check failed: {}", e))
        })?;

        Ok(())
    }

    pub async fn test_connection(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Database connection test failed: {}", e);
            ApiError::Database(format!("Connection test failed: {}", e))
        })?;

        info!("Database connection test successful");
        Ok(())
    }

    /// アプリ起動時にテーブル群を CREATE する簡易マイグレーター。
    /// すべて IF NOT EXISTS なので再実行しても安全。
    pub async fn migrate(&self) -> Result<(), ApiError> {
        info!("Running database migrations");

        let client = self.get_connection().await?;

        let statements: &[(&str, &str)] = &[
            (
                "languages table",
                r#"
                CREATE TABLE IF NOT EXISTS languages (
                    id SERIAL PRIMARY KEY,
                    code VARCHAR(10) UNIQUE NOT NULL,
                    name VARCHAR(100) NOT NULL
                )
                "#,
            ),
            (
                "users table",
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id UUID PRIMARY KEY,
                    email VARCHAR(255) UNIQUE NOT NULL,
                    username VARCHAR(150) UNIQUE NOT NULL,
                    display_name VARCHAR(100),
                    password_hash VARCHAR(255) NOT NULL,
                    preferred_language VARCHAR(10) NOT NULL DEFAULT 'es',
                    avatar_url VARCHAR(500),
                    is_premium BOOLEAN NOT NULL DEFAULT FALSE,
                    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                    verification_token UUID,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
            ),
            (
                "users email index",
                "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
            ),
            (
                "users verification token index",
                "CREATE INDEX IF NOT EXISTS idx_users_verification_token ON users(verification_token)",
            ),
            (
                "shared words table",
                r#"
                CREATE TABLE IF NOT EXISTS shared_words (
                    id SERIAL PRIMARY KEY,
                    word VARCHAR(100) NOT NULL,
                    source_lang_id INTEGER NOT NULL REFERENCES languages(id),
                    target_lang_id INTEGER NOT NULL REFERENCES languages(id),
                    translation VARCHAR(255),
                    example_sentence TEXT,
                    example_translation TEXT,
                    audio_word VARCHAR(255),
                    audio_sentence VARCHAR(255),
                    image_url VARCHAR(500),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    UNIQUE (word, source_lang_id, target_lang_id)
                )
                "#,
            ),
            (
                "custom contents table",
                r#"
                CREATE TABLE IF NOT EXISTS custom_contents (
                    id SERIAL PRIMARY KEY,
                    word VARCHAR(100) NOT NULL,
                    source_lang_id INTEGER NOT NULL REFERENCES languages(id),
                    target_lang_id INTEGER NOT NULL REFERENCES languages(id),
                    context TEXT NOT NULL,
                    translation VARCHAR(255),
                    example_sentence TEXT,
                    example_translation TEXT,
                    audio_word VARCHAR(255),
                    audio_sentence VARCHAR(255),
                    image_url VARCHAR(500),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    UNIQUE (word, source_lang_id, target_lang_id, context)
                )
                "#,
            ),
            (
                "user words table",
                r#"
                CREATE TABLE IF NOT EXISTS user_words (
                    id SERIAL PRIMARY KEY,
                    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    shared_word_id INTEGER REFERENCES shared_words(id),
                    custom_content_id INTEGER REFERENCES custom_contents(id),
                    deck VARCHAR(100) NOT NULL DEFAULT 'default',
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    UNIQUE (user_id, shared_word_id),
                    UNIQUE (user_id, custom_content_id),
                    CHECK ((shared_word_id IS NULL) <> (custom_content_id IS NULL))
                )
                "#,
            ),
            (
                "user words user index",
                "CREATE INDEX IF NOT EXISTS idx_user_words_user_id ON user_words(user_id)",
            ),
            (
                "user words deck index",
                "CREATE INDEX IF NOT EXISTS idx_user_words_deck ON user_words(user_id, deck)",
            ),
            (
                "download history table",
                r#"
                CREATE TABLE IF NOT EXISTS download_history (
                    id SERIAL PRIMARY KEY,
                    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    deck_name VARCHAR(100) NOT NULL,
                    word_ids TEXT NOT NULL,
                    file_path TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
            ),
            (
                "download history user index",
                "CREATE INDEX IF NOT EXISTS idx_download_history_user_id ON download_history(user_id, created_at DESC)",
            ),
        ];

        for (description, sql) in statements {
            client.execute(*sql, &[]).await.map_err(|e| {
                error!("Failed to create {}: {}", description, e);
                ApiError::Database(format!("Migration failed ({}): {}", description, e))
            })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// 言語のリファレンスデータを投入する。
    /// 既にレコードが存在する場合は何もしない。
    pub async fn seed_languages(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        let row = client
            .query_one("SELECT COUNT(*) FROM languages", &[])
            .await
            .map_err(ApiError::from)?;
        let count: i64 = row.get(0);

        if count > 0 {
            info!("Languages table already contains {} entries, skipping seed", count);
            return Ok(());
        }

        let seed_data = vec![
            ("en", "English"),
            ("es", "Spanish"),
            ("fr", "French"),
            ("de", "German"),
            ("it", "Italian"),
            ("pt-BR", "Portuguese (Brazil)"),
        ];

        let insert_query = "INSERT INTO languages (code, name) VALUES ($1, $2)";

        for (code, name) in seed_data {
            client
                .execute(insert_query, &[&code, &name])
                .await
                .map_err(ApiError::from)?;

            info!("Seeded language: {} ({})", code, name);
        }

        Ok(())
    }
}
