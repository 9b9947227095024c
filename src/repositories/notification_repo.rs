//! 通知历史数据仓库

use crate::db::PostgresPool;
use crate::errors::AppError;
use crate::models::{NewNotificationHistory, NotificationHistory};
use crate::repositories::NotificationHistoryStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 通知历史数据仓库
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PostgresPool,
}

impl NotificationRepository {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationHistoryStore for NotificationRepository {
    async fn append(&self, entry: NewNotificationHistory) -> Result<NotificationHistory, AppError> {
        let history = sqlx::query_as::<_, NotificationHistory>(
            r#"
            INSERT INTO notification_history (
                id, recipient_id, title, message, channel_type, success,
                error_message, external_message_id, notification_type,
                source_type, source_entity_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.recipient_id)
        .bind(&entry.title)
        .bind(&entry.message)
        .bind(entry.channel_type)
        .bind(entry.success)
        .bind(&entry.error_message)
        .bind(&entry.external_message_id)
        .bind(entry.notification_type)
        .bind(entry.source_type)
        .bind(entry.source_entity_id)
        .fetch_one(self.pool.pool())
        .await?;

        Ok(history)
    }

    async fn find_by_recipient(&self, recipient_id: Uuid) -> Result<Vec<NotificationHistory>, AppError> {
        let rows = sqlx::query_as::<_, NotificationHistory>(
            "SELECT * FROM notification_history WHERE recipient_id = $1 ORDER BY created_at DESC",
        )
        .bind(recipient_id)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(rows)
    }

    async fn find_by_recipient_and_success(
        &self,
        recipient_id: Uuid,
        success: bool,
    ) -> Result<Vec<NotificationHistory>, AppError> {
        let rows = sqlx::query_as::<_, NotificationHistory>(
            r#"
            SELECT * FROM notification_history
            WHERE recipient_id = $1 AND success = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient_id)
        .bind(success)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(rows)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<(u64, u64), AppError> {
        let (total, success): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE success)
            FROM notification_history
            WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(self.pool.pool())
        .await?;

        Ok((total.max(0) as u64, success.max(0) as u64))
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM notification_history WHERE created_at < $1")
            .bind(cutoff)
            .execute(self.pool.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
