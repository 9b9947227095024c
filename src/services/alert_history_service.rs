//! 预警历史查询服务

use crate::errors::AppError;
use crate::models::{AlertHistory, AlertResult, AlertRule, NewAlertHistory, Subject};
use crate::repositories::AlertHistoryStore;
use crate::utils::days_ago;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// 预警历史服务
pub struct AlertHistoryService {
    store: Arc<dyn AlertHistoryStore>,
}

impl AlertHistoryService {
    pub fn new(store: Arc<dyn AlertHistoryStore>) -> Self {
        Self { store }
    }

    /// 按规则记录预警历史，同日重复时返回已有记录
    pub async fn record_alert_history(
        &self,
        rule: &AlertRule,
        subject: &Subject,
        result: &AlertResult,
    ) -> Result<AlertHistory, AppError> {
        let details = result
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let history = NewAlertHistory::new(
            subject.id,
            Some(rule.id),
            rule.alert_type,
            result.alert_level.unwrap_or(rule.alert_level),
            result.message.clone().unwrap_or_else(|| rule.name.clone()),
            details,
            Utc::now(),
        );

        let outcome = self.store.insert_if_absent(history).await?;
        if outcome.is_duplicate() {
            tracing::debug!(rule_id = %rule.id, subject_id = %subject.id, "预警历史已存在");
        }
        Ok(outcome.history().clone())
    }

    /// 最近 `days` 天的预警历史，按时间倒序
    pub async fn get_recent_alert_history(
        &self,
        subject_id: Uuid,
        days: u32,
    ) -> Result<Vec<AlertHistory>, AppError> {
        self.store.find_recent(subject_id, days_ago(i64::from(days))).await
    }

    /// 预警详情，只允许查询本人的记录
    pub async fn get_alert_detail(&self, history_id: Uuid, subject_id: Uuid) -> Result<AlertHistory, AppError> {
        let history = self
            .store
            .find_history(history_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("预警历史不存在: {}", history_id)))?;

        if history.subject_id != subject_id {
            return Err(AppError::Forbidden(format!("无权访问预警历史: {}", history_id)));
        }

        Ok(history)
    }

    pub async fn find_pending_notifications(&self) -> Result<Vec<AlertHistory>, AppError> {
        self.store.find_pending_notifications().await
    }

    /// 最近 `days` 天的通知送达率，无记录时为 0.0
    pub async fn notification_success_rate(&self, days: u32) -> Result<f64, AppError> {
        let (total, sent) = self
            .store
            .count_notifications_since(days_ago(i64::from(days)))
            .await?;

        if total == 0 {
            return Ok(0.0);
        }
        Ok(sent as f64 / total as f64)
    }
}
