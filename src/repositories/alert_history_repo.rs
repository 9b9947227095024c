//! 预警历史数据仓库

use crate::db::PostgresPool;
use crate::errors::AppError;
use crate::models::{AlertHistory, InsertOutcome, NewAlertHistory, FAILED_RESULT_PREFIX, NO_GUARDIAN_RESULT};
use crate::repositories::AlertHistoryStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 预警历史数据仓库
#[derive(Clone)]
pub struct AlertHistoryRepository {
    pool: PostgresPool,
}

impl AlertHistoryRepository {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    async fn find_by_dedup_key(&self, history: &NewAlertHistory) -> Result<Option<AlertHistory>, AppError> {
        let existing = sqlx::query_as::<_, AlertHistory>(
            r#"
            SELECT * FROM alert_history
            WHERE subject_id = $1
              AND rule_id IS NOT DISTINCT FROM $2
              AND alert_type = $3
              AND alert_date = $4
            "#,
        )
        .bind(history.subject_id)
        .bind(history.rule_id)
        .bind(history.alert_type)
        .bind(history.alert_date)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(existing)
    }
}

#[async_trait]
impl AlertHistoryStore for AlertHistoryRepository {
    async fn insert_if_absent(&self, history: NewAlertHistory) -> Result<InsertOutcome, AppError> {
        // 唯一索引保证并发写入只有一条成功
        let inserted = sqlx::query_as::<_, AlertHistory>(
            r#"
            INSERT INTO alert_history (
                id, rule_id, subject_id, alert_type, alert_level, alert_message,
                detection_details, notification_sent, alert_date, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, false, $8, NOW())
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(history.rule_id)
        .bind(history.subject_id)
        .bind(history.alert_type)
        .bind(history.alert_level)
        .bind(&history.alert_message)
        .bind(&history.detection_details)
        .bind(history.alert_date)
        .fetch_optional(self.pool.pool())
        .await?;

        if let Some(row) = inserted {
            return Ok(InsertOutcome::Inserted(row));
        }

        match self.find_by_dedup_key(&history).await? {
            Some(existing) => Ok(InsertOutcome::Duplicate(existing)),
            None => Err(AppError::Conflict(format!(
                "预警历史写入冲突: subject={}, type={}",
                history.subject_id, history.alert_type
            ))),
        }
    }

    async fn find_history(&self, history_id: Uuid) -> Result<Option<AlertHistory>, AppError> {
        let history = sqlx::query_as::<_, AlertHistory>("SELECT * FROM alert_history WHERE id = $1")
            .bind(history_id)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(history)
    }

    async fn find_recent(
        &self,
        subject_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<AlertHistory>, AppError> {
        let rows = sqlx::query_as::<_, AlertHistory>(
            r#"
            SELECT * FROM alert_history
            WHERE subject_id = $1 AND created_at >= $2 AND created_at <= NOW()
            ORDER BY created_at DESC
            "#,
        )
        .bind(subject_id)
        .bind(since)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(rows)
    }

    async fn update_notification_status(&self, history: &AlertHistory) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE alert_history SET
                notification_sent = $2,
                notification_sent_at = $3,
                notification_result = $4
            WHERE id = $1
            "#,
        )
        .bind(history.id)
        .bind(history.notification_sent)
        .bind(history.notification_sent_at)
        .bind(&history.notification_result)
        .execute(self.pool.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("预警历史不存在: {}", history.id)));
        }

        Ok(())
    }

    async fn find_pending_notifications(&self) -> Result<Vec<AlertHistory>, AppError> {
        let rows = sqlx::query_as::<_, AlertHistory>(
            r#"
            SELECT * FROM alert_history
            WHERE notification_sent = false
              AND (notification_result IS NULL OR starts_with(notification_result, $1))
            ORDER BY created_at
            "#,
        )
        .bind(FAILED_RESULT_PREFIX)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(rows)
    }

    async fn count_notifications_since(&self, since: DateTime<Utc>) -> Result<(u64, u64), AppError> {
        let (total, sent): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE notification_sent)
            FROM alert_history
            WHERE created_at >= $1
              AND notification_result IS DISTINCT FROM $2
            "#,
        )
        .bind(since)
        .bind(NO_GUARDIAN_RESULT)
        .fetch_one(self.pool.pool())
        .await?;

        Ok((total.max(0) as u64, sent.max(0) as u64))
    }
}
