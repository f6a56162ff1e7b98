//! Chat Repository Implementation
//!
//! PostgreSQL-backed chat storage, including membership rows in the
//! `chat_participants` join table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Chat, ChatRepository};
use crate::shared::error::AppError;

/// Row shape of the chats table.
#[derive(Debug, sqlx::FromRow)]
struct ChatRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChatRow {
    fn into_chat(self) -> Chat {
        Chat {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Chat repository backed by PostgreSQL.
#[derive(Clone)]
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    /// Find a chat by ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Chat>, AppError> {
        let row = sqlx::query_as::<_, ChatRow>(
            "SELECT id, created_at, updated_at FROM chats WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_chat()))
    }

    /// Create a chat together with its participant rows.
    async fn create(&self, chat: &Chat, participant_ids: &[i64]) -> Result<Chat, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ChatRow>(
            r#"
            INSERT INTO chats (id)
            VALUES ($1)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(chat.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO chat_participants (chat_id, user_id)
            SELECT $1, u.id FROM users u WHERE u.id = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(chat.id)
        .bind(participant_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into_chat())
    }

    /// Chats the user participates in, most recently active first.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Chat>, AppError> {
        let rows = sqlx::query_as::<_, ChatRow>(
            r#"
            SELECT c.id, c.created_at, c.updated_at
            FROM chats c
            JOIN chat_participants cp ON cp.chat_id = c.id
            WHERE cp.user_id = $1
            ORDER BY c.updated_at DESC, c.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_chat()).collect())
    }

    /// Hard delete a chat; messages and participant rows cascade.
    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Chat with id {} not found", id)));
        }

        Ok(())
    }

    /// Whether the user is a participant of the chat.
    async fn is_participant(&self, chat_id: i64, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM chat_participants
                WHERE chat_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    /// Participant user IDs, ascending.
    async fn participant_ids(&self, chat_id: i64) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM chat_participants WHERE chat_id = $1 ORDER BY user_id",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Bump `updated_at` so the chat surfaces at the top of listings.
    async fn touch(&self, chat_id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE chats SET updated_at = $2 WHERE id = $1")
            .bind(chat_id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would go here, requiring a test database
}
