use tracing::info;
use uuid::Uuid;

use crate::db::Database;
use crate::error::ApiError;
use crate::models::history::DownloadHistory;

// Export audit operations

impl Database {
    /// エクスポートのたびに履歴を 1 行残す。既存パッケージの再利用でも記録する。
    pub async fn record_download(
        &self,
        user_id: Uuid,
        deck_name: &str,
        word_ids: &str,
        file_path: &str,
    ) -> Result<DownloadHistory, ApiError> {
        let client = self.get_connection().await?;
        let query = r#"
            INSERT INTO download_history (user_id, deck_name, word_ids, file_path)
            VALUES ($1, $2, $3, $4)
            RETURNING id, deck_name, word_ids, file_path, created_at
        "#;

        let row = client
            .query_one(query, &[&user_id, &deck_name, &word_ids, &file_path])
            .await
            .map_err(ApiError::from)?;

        let entry = DownloadHistory {
            id: row.get(0),
            deck_name: row.get(1),
            word_ids: row.get(2),
            file_path: row.get(3),
            created_at: row.get(4),
        };

        info!("Recorded download {} for user {}", entry.id, user_id);
        Ok(entry)
    }

    pub async fn list_downloads(&self, user_id: Uuid) -> Result<Vec<DownloadHistory>, ApiError> {
        let client = self.get_connection().await?;
        let query = r#"
            SELECT id, deck_name, word_ids, file_path, created_at
            FROM download_history
            WHERE user_id = $1
            ORDER BY created_at DESC
        "#;

        let rows = client
            .query(query, &[&user_id])
            .await
            .map_err(ApiError::from)?;

        Ok(rows
            .iter()
            .map(|row| DownloadHistory {
                id: row.get(0),
                deck_name: row.get(1),
                word_ids: row.get(2),
                file_path: row.get(3),
                created_at: row.get(4),
            })
            .collect())
    }
}
