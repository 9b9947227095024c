//! 预警触发与监护人通知

use crate::config::AlertSettings;
use crate::errors::AppError;
use crate::models::{
    AlertHistory, AlertResult, InsertOutcome, NewAlertHistory, NotificationRequest,
    NotificationSourceType, NotificationType, Subject,
};
use crate::repositories::AlertHistoryStore;
use crate::services::{require_subject, NotificationPipeline, SubjectDirectory};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// 单次触发的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggeredAlert {
    pub history_id: Uuid,
    /// 同一去重键已有记录，本次未写入也未通知
    pub duplicate: bool,
    pub notified: bool,
}

/// 预警触发服务
pub struct AlertNotificationService {
    subjects: Arc<dyn SubjectDirectory>,
    history: Arc<dyn AlertHistoryStore>,
    pipeline: Arc<NotificationPipeline>,
    settings: AlertSettings,
}

impl AlertNotificationService {
    pub fn new(
        subjects: Arc<dyn SubjectDirectory>,
        history: Arc<dyn AlertHistoryStore>,
        pipeline: Arc<NotificationPipeline>,
        settings: AlertSettings,
    ) -> Self {
        Self {
            subjects,
            history,
            pipeline,
            settings,
        }
    }

    /// 触发预警，返回预警历史 ID
    pub async fn trigger_alert(&self, subject_id: Uuid, result: &AlertResult) -> Result<Uuid, AppError> {
        self.trigger(subject_id, result).await.map(|t| t.history_id)
    }

    /// 触发预警：写入历史（按去重键原子插入）后通知监护人
    ///
    /// 通知失败不会回滚已写入的历史。
    pub async fn trigger(&self, subject_id: Uuid, result: &AlertResult) -> Result<TriggeredAlert, AppError> {
        let subject = require_subject(self.subjects.as_ref(), subject_id).await?;

        let (alert_type, alert_level, message) =
            match (result.detected, result.alert_type, result.alert_level, result.message.as_ref()) {
                (true, Some(alert_type), Some(level), Some(message)) => (alert_type, level, message.clone()),
                _ => {
                    return Err(AppError::ValidationError(format!(
                        "预警结果不完整，无法触发: {}",
                        result
                    )))
                }
            };

        let details = result
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let new_history = NewAlertHistory::new(
            subject.id,
            result.rule_id,
            alert_type,
            alert_level,
            message,
            details,
            Utc::now(),
        );

        match self.history.insert_if_absent(new_history).await? {
            InsertOutcome::Duplicate(existing) => {
                tracing::info!(
                    subject_id = %subject_id,
                    history_id = %existing.id,
                    alert_type = %alert_type,
                    "同日预警已记录，跳过通知"
                );
                Ok(TriggeredAlert {
                    history_id: existing.id,
                    duplicate: true,
                    notified: false,
                })
            }
            InsertOutcome::Inserted(mut history) => {
                tracing::info!(
                    subject_id = %subject_id,
                    history_id = %history.id,
                    alert_type = %alert_type,
                    alert_level = %alert_level,
                    "预警已记录"
                );
                let notified = self.notify_guardian(&subject, &mut history).await;
                Ok(TriggeredAlert {
                    history_id: history.id,
                    duplicate: false,
                    notified,
                })
            }
        }
    }

    /// 重新发送此前未送达的通知，返回本次成功数
    pub async fn resend_pending_notifications(&self) -> Result<usize, AppError> {
        let pending = self.history.find_pending_notifications().await?;
        let mut delivered = 0;

        for mut history in pending.into_iter().filter(AlertHistory::can_retry_notification) {
            let subject = match self.subjects.find_subject(history.subject_id).await {
                Ok(Some(subject)) => subject,
                Ok(None) => {
                    tracing::warn!(history_id = %history.id, subject_id = %history.subject_id, "监护对象已不存在，跳过重发");
                    continue;
                }
                Err(e) => {
                    tracing::error!(history_id = %history.id, error = %e, "查询监护对象失败");
                    continue;
                }
            };

            if self.notify_guardian(&subject, &mut history).await {
                delivered += 1;
            }
        }

        Ok(delivered)
    }

    /// 通知监护人并写回发送结果；没有监护人时记为 NO_GUARDIAN，不再重发
    async fn notify_guardian(&self, subject: &Subject, history: &mut AlertHistory) -> bool {
        let Some(guardian) = subject.guardian.as_ref() else {
            tracing::debug!(subject_id = %subject.id, history_id = %history.id, "未分配监护人，跳过通知");
            history.mark_no_guardian();
            if let Err(e) = self.history.update_notification_status(history).await {
                tracing::error!(history_id = %history.id, error = %e, "更新通知状态失败");
            }
            return false;
        };

        let source_type = if history.rule_id.is_some() {
            NotificationSourceType::AlertRule
        } else {
            NotificationSourceType::ManualAlert
        };

        let request = NotificationRequest::new(
            guardian.id,
            guardian.push_token.clone(),
            self.settings.render_title(history.alert_level.as_str()),
            history.alert_message.clone(),
        )
        .with_source(
            NotificationType::from_alert_type(history.alert_type),
            source_type,
            history.id,
        );

        let delivered = self.pipeline.send(&request).await;
        if delivered {
            history.mark_sent("SUCCESS");
        } else {
            tracing::warn!(
                subject_id = %subject.id,
                guardian_id = %guardian.id,
                history_id = %history.id,
                "监护人通知发送失败"
            );
            history.mark_failed("guardian notification not delivered");
        }

        if let Err(e) = self.history.update_notification_status(history).await {
            tracing::error!(history_id = %history.id, error = %e, "更新通知状态失败");
        }

        delivered
    }
}
