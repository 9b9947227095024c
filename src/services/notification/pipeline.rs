//! 通知管道组装

use super::{
    FailureRecovery, FallbackNotificationService, LoggingRecovery, NotificationHistoryRecorder,
    NotificationService, RetryingNotificationService,
};
use crate::config::NotificationSettings;
use crate::models::{NotificationChannelType, NotificationRequest};
use crate::repositories::NotificationHistoryStore;
use std::sync::Arc;

/// 组装管道所需的组件
#[derive(Clone)]
pub struct PipelineComponents {
    pub primary: Arc<dyn NotificationService>,
    pub secondary: Option<Arc<dyn NotificationService>>,
    pub history: Option<Arc<dyn NotificationHistoryStore>>,
    pub recovery: Arc<dyn FailureRecovery>,
}

impl PipelineComponents {
    pub fn new(primary: Arc<dyn NotificationService>) -> Self {
        Self {
            primary,
            secondary: None,
            history: None,
            recovery: Arc::new(LoggingRecovery),
        }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn NotificationService>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_history(mut self, history: Arc<dyn NotificationHistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_recovery(mut self, recovery: Arc<dyn FailureRecovery>) -> Self {
        self.recovery = recovery;
        self
    }
}

/// 组装完成的通知管道，启动时构建一次
pub struct NotificationPipeline {
    head: Arc<dyn NotificationService>,
}

impl NotificationPipeline {
    /// 按 重试 → 历史 → 切换 → 主渠道 的顺序组装
    pub fn new(components: PipelineComponents, settings: &NotificationSettings) -> Self {
        let PipelineComponents {
            primary,
            secondary,
            history,
            recovery,
        } = components;

        let mut layer: Arc<dyn NotificationService> = primary;

        match secondary {
            Some(secondary) if settings.fallback_enabled => {
                layer = Arc::new(FallbackNotificationService::new(layer, secondary));
            }
            _ => tracing::debug!("未启用备用渠道"),
        }

        match history {
            Some(store) if settings.history_enabled => {
                layer = Arc::new(NotificationHistoryRecorder::new(layer, store));
            }
            _ => tracing::debug!("未启用通知历史记录"),
        }

        let head = Arc::new(RetryingNotificationService::new(
            layer,
            recovery,
            settings.retry.clone(),
        ));

        tracing::info!(
            fallback = settings.fallback_enabled,
            history = settings.history_enabled,
            max_attempts = settings.retry.max_attempts,
            "通知管道已组装"
        );

        Self { head }
    }

    /// 发送通知，只返回是否送达，不会返回错误
    pub async fn send(&self, request: &NotificationRequest) -> bool {
        match self.head.send(request).await {
            Ok(receipt) => receipt.delivered,
            Err(e) => {
                tracing::error!(recipient_id = %request.recipient_id, error = %e, "通知管道返回错误");
                false
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.head.is_available()
    }

    pub fn channel_type(&self) -> NotificationChannelType {
        self.head.channel_type()
    }
}
