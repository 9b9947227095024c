//! 通知历史查询服务

use crate::errors::AppError;
use crate::models::{NotificationHistory, NotificationStatistics};
use crate::repositories::NotificationHistoryStore;
use crate::utils::days_ago;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// 通知历史服务
pub struct NotificationHistoryService {
    store: Arc<dyn NotificationHistoryStore>,
}

impl NotificationHistoryService {
    pub fn new(store: Arc<dyn NotificationHistoryStore>) -> Self {
        Self { store }
    }

    pub async fn history_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<NotificationHistory>, AppError> {
        self.store.find_by_recipient(recipient_id).await
    }

    pub async fn successful_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> Result<Vec<NotificationHistory>, AppError> {
        self.store.find_by_recipient_and_success(recipient_id, true).await
    }

    pub async fn failed_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<NotificationHistory>, AppError> {
        self.store.find_by_recipient_and_success(recipient_id, false).await
    }

    pub async fn statistics_since(&self, since: DateTime<Utc>) -> Result<NotificationStatistics, AppError> {
        let (total, success) = self.store.count_since(since).await?;
        Ok(NotificationStatistics::of(total, success))
    }

    /// 删除 `retention_days` 天之前的记录
    pub async fn cleanup_older_than(&self, retention_days: u32) -> Result<u64, AppError> {
        if retention_days == 0 {
            return Err(AppError::ValidationError("保留天数必须大于 0".to_string()));
        }

        let removed = self.store.delete_before(days_ago(i64::from(retention_days))).await?;
        tracing::info!(removed, retention_days, "通知历史清理完成");
        Ok(removed)
    }
}
