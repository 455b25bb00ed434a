use tokio_postgres::Row;
use tracing::info;
use uuid::Uuid;

use crate::db::Database;
use crate::error::ApiError;
use crate::models::user::{UpdateProfileRequest, User};

const USER_COLUMNS: &str = "id, email, username, display_name, password_hash, \
     preferred_language, avatar_url, is_premium, is_verified, verification_token, \
     created_at, updated_at";

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get(0),
        email: row.get(1),
        username: row.get(2),
        display_name: row.get(3),
        password_hash: row.get(4),
        preferred_language: row.get(5),
        avatar_url: row.get(6),
        is_premium: row.get(7),
        is_verified: row.get(8),
        verification_token: row.get(9),
        created_at: row.get(10),
        updated_at: row.get(11),
    }
}

// Account repository operations

impl Database {
    /// アカウント作成。重複メール・ユーザー名は UNIQUE 制約で弾かれ、
    /// `ApiError::Conflict` に変換される。
    pub async fn create_user(&self, user: &User) -> Result<User, ApiError> {
        let client = self.get_connection().await?;

        let query = format!(
            r#"
            INSERT INTO users (id, email, username, display_name, password_hash,
                               preferred_language, avatar_url, is_premium, is_verified,
                               verification_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = client
            .query_one(
                &query,
                &[
                    &user.id,
                    &user.email,
                    &user.username,
                    &user.display_name,
                    &user.password_hash,
                    &user.preferred_language,
                    &user.avatar_url,
                    &user.is_premium,
                    &user.is_verified,
                    &user.verification_token,
                    &user.created_at,
                    &user.updated_at,
                ],
            )
            .await
            .map_err(ApiError::from)?;

        let created = user_from_row(&row);
        info!("Created user with id: {}", created.id);
        Ok(created)
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = client
            .query_opt(&query, &[&user_id])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => Ok(user_from_row(&row)),
            None => Err(ApiError::NotFound(format!("User with id {}", user_id))),
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        let row = client
            .query_opt(&query, &[&email])
            .await
            .map_err(ApiError::from)?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn get_user_by_verification_token(
        &self,
        token: Uuid,
    ) -> Result<Option<User>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "SELECT {} FROM users WHERE verification_token = $1",
            USER_COLUMNS
        );

        let row = client
            .query_opt(&query, &[&token])
            .await
            .map_err(ApiError::from)?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// メール検証の完了。トークンは使い捨てなので同時に消す。
    pub async fn mark_user_verified(&self, user_id: Uuid) -> Result<(), ApiError> {
        let client = self.get_connection().await?;
        let query = r#"
            UPDATE users
            SET is_verified = TRUE, verification_token = NULL, updated_at = NOW()
            WHERE id = $1
        "#;

        let rows_affected = client
            .execute(query, &[&user_id])
            .await
            .map_err(ApiError::from)?;

        if rows_affected == 0 {
            return Err(ApiError::NotFound(format!("User with id {}", user_id)));
        }

        info!("Marked user {} as verified", user_id);
        Ok(())
    }

    pub async fn set_verification_token(
        &self,
        user_id: Uuid,
        token: Uuid,
    ) -> Result<(), ApiError> {
        let client = self.get_connection().await?;
        let query = "UPDATE users SET verification_token = $2, updated_at = NOW() WHERE id = $1";

        let rows_affected = client
            .execute(query, &[&user_id, &token])
            .await
            .map_err(ApiError::from)?;

        if rows_affected == 0 {
            return Err(ApiError::NotFound(format!("User with id {}", user_id)));
        }

        Ok(())
    }

    /// 渡された `UpdateProfileRequest` の Option 値に応じて動的に SQL を組み立てる。
    pub async fn update_user_profile(
        &self,
        user_id: Uuid,
        request: &UpdateProfileRequest,
    ) -> Result<User, ApiError> {
        let client = self.get_connection().await?;

        let mut query_parts = Vec::new();
        let mut params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = Vec::new();
        let mut param_count = 1;

        let updated_at = chrono::Utc::now();

        // Store normalized values to extend their lifetime
        let display_name = request.get_normalized_display_name();
        let avatar_url = request.get_normalized_avatar_url();

        if let Some(ref display_name) = display_name {
            query_parts.push(format!("display_name = ${}", param_count));
            params.push(display_name);
            param_count += 1;
        }

        if let Some(ref preferred_language) = request.preferred_language {
            query_parts.push(format!("preferred_language = ${}", param_count));
            params.push(preferred_language);
            param_count += 1;
        }

        if let Some(ref avatar_url) = avatar_url {
            query_parts.push(format!("avatar_url = ${}", param_count));
            params.push(avatar_url);
            param_count += 1;
        }

        query_parts.push(format!("updated_at = ${}", param_count));
        params.push(&updated_at);
        param_count += 1;

        params.push(&user_id);

        let query = format!(
            "UPDATE users SET {} WHERE id = ${} RETURNING {}",
            query_parts.join(", "),
            param_count,
            USER_COLUMNS
        );

        let row = client
            .query_opt(&query, &params)
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => {
                info!("Updated profile for user {}", user_id);
                Ok(user_from_row(&row))
            }
            None => Err(ApiError::NotFound(format!("User with id {}", user_id))),
        }
    }

    pub async fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), ApiError> {
        let client = self.get_connection().await?;
        let query = "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1";

        let rows_affected = client
            .execute(query, &[&user_id, &password_hash])
            .await
            .map_err(ApiError::from)?;

        if rows_affected == 0 {
            return Err(ApiError::NotFound(format!("User with id {}", user_id)));
        }

        info!("Updated password for user {}", user_id);
        Ok(())
    }

    /// アカウント削除。`ON DELETE CASCADE` で語彙と履歴も同時に消える。
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ApiError> {
        let client = self.get_connection().await?;
        let query = "DELETE FROM users WHERE id = $1";

        let rows_affected = client
            .execute(query, &[&user_id])
            .await
            .map_err(ApiError::from)?;

        if rows_affected == 0 {
            Err(ApiError::NotFound(format!("User with id {}", user_id)))
        } else {
            info!("Deleted user {} (cascade deleted vocabulary and history)", user_id);
            Ok(())
        }
    }
}
